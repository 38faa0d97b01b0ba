//! Asynchronous bulk-job retrieval.
//!
//! Submits the query as a bulk job with a single batch, polls the batch to a
//! terminal state, streams every result part into the output file, and
//! closes the job exactly once after all parts are drained. Returns the
//! total bytes written rather than a record count.

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::bulk::{BatchState, BulkJobService, CreateJobRequest};
use crate::config::ExportConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::output::ByteOutput;
use crate::soql::ParsedQuery;

/// Message the server streams back for a result part with no rows.
const EMPTY_RESULT_SENTINEL: &[u8] = b"Records not found for this query";

/// Read chunk size while draining a result part.
const RESULT_CHUNK: usize = 1024;

#[instrument(skip(bulk, config, query), fields(object = query.object()))]
pub async fn load(
    bulk: &dyn BulkJobService,
    config: &ExportConfig,
    query: &ParsedQuery,
    out_path: &Path,
) -> Result<u64> {
    let job = bulk.create_job(&CreateJobRequest::query(query.object())).await?;
    if job.id.is_empty() {
        return Err(Error::new(ErrorKind::Job(
            "job creation returned no id".into(),
        )));
    }
    let batch = bulk.create_batch(&job.id, query.text()).await?;

    let result_ids = wait_for_batch(bulk, config, &job.id, &batch.id).await?;

    let mut output = ByteOutput::new(config, query.object(), out_path);
    let mut written: u64 = 0;
    for result_id in &result_ids {
        written += drain_result_part(bulk, &mut output, &job.id, &batch.id, result_id).await?;
    }
    output.close().await?;

    // closed exactly once, after every part is drained
    bulk.close_job(&job.id).await?;
    Ok(written)
}

/// Poll the batch until it completes, returning the result-part ids.
///
/// A failed batch is surfaced immediately with the server message and never
/// polled again. Without a configured attempt bound the loop runs until the
/// batch reaches a terminal state.
async fn wait_for_batch(
    bulk: &dyn BulkJobService,
    config: &ExportConfig,
    job_id: &str,
    batch_id: &str,
) -> Result<Vec<String>> {
    let mut attempts: u32 = 0;
    loop {
        sleep(config.poll_interval).await;
        attempts += 1;

        let status = bulk.batch_status(job_id, batch_id).await?;
        match status.state {
            BatchState::Completed => return bulk.result_ids(job_id, batch_id).await,
            BatchState::Failed => {
                let message = status
                    .state_message
                    .unwrap_or_else(|| "batch failed".to_string());
                return Err(Error::new(ErrorKind::Processing(message)));
            }
            state => {
                debug!(job_id, batch_id, ?state, attempts, "batch still running");
                if let Some(max) = config.max_poll_attempts {
                    if attempts >= max {
                        return Err(Error::new(ErrorKind::Timeout(format!(
                            "batch {batch_id} not complete after {attempts} polls"
                        ))));
                    }
                }
            }
        }
    }
}

/// Stream one result part into the output, returning the bytes written.
///
/// The server answers a no-row part with a fixed message instead of CSV, so
/// the leading bytes are compared against that sentinel before anything is
/// written. The comparison is a prefix check over at most the sentinel
/// length; genuine data that happens to start with the same text would be
/// dropped. Known weak point, kept for compatibility.
async fn drain_result_part(
    bulk: &dyn BulkJobService,
    output: &mut ByteOutput<'_>,
    job_id: &str,
    batch_id: &str,
    result_id: &str,
) -> Result<u64> {
    let mut reader = bulk.open_result(job_id, batch_id, result_id).await?;

    let mut head = vec![0u8; EMPTY_RESULT_SENTINEL.len()];
    let mut filled = 0usize;
    while filled < head.len() {
        let n = reader.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if EMPTY_RESULT_SENTINEL.starts_with(&head[..filled]) {
        debug!(job_id, batch_id, result_id, "empty result part skipped");
        return Ok(0);
    }

    let file = output.file().await?;
    file.write_all(&head[..filled]).await?;
    let mut written = filled as u64;

    let mut chunk = vec![0u8; RESULT_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        file.write_all(&chunk[..n]).await?;
        written += n as u64;
    }
    Ok(written)
}
