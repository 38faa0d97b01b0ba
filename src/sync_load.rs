//! Synchronous paged retrieval into CSV.

use std::path::Path;

use tracing::{instrument, warn};

use crate::attachments;
use crate::config::ExportConfig;
use crate::error::Result;
use crate::output::CsvOutput;
use crate::record::FieldResolver;
use crate::rest::Connection;
use crate::soql::ParsedQuery;

/// Stream every record matching `query` into a CSV file at `out_path`, one
/// row per record in field-list order.
///
/// Returns the total record count reported by the first page. The output
/// file is opened lazily before the first row, which is also when the
/// before-export hook fires; a query with zero matches therefore creates no
/// file and never invokes the hook. Binary payloads of blob-carrying objects
/// are extracted per record; their failures are logged and never fail the
/// row.
#[instrument(skip(connection, config, query), fields(object = query.object()))]
pub async fn load(
    connection: &dyn Connection,
    config: &ExportConfig,
    query: &ParsedQuery,
    out_path: &Path,
) -> Result<u64> {
    let mut page = if query.is_all_rows() {
        connection.query_all(query.text()).await?
    } else {
        connection.query(query.text()).await?
    };
    let total = page.total_size;

    let mut output = CsvOutput::new(config, query.object(), out_path, query.fields());
    loop {
        for record in &page.records {
            let resolver = FieldResolver::new(record);
            let row: Vec<String> = query
                .fields()
                .iter()
                .map(|field| resolver.resolve_text(field))
                .collect();
            output.writer()?.write_record(&row)?;

            if let Err(err) = attachments::process(config, query.object(), record) {
                warn!(object = query.object(), %err, "payload extraction failed");
            }
        }

        if page.done {
            break;
        }
        let Some(cursor) = page.next_records_url.clone() else {
            warn!(
                object = query.object(),
                "page not done but no continuation cursor; stopping"
            );
            break;
        };
        page = connection.query_more(&cursor).await?;
    }

    output.close()?;
    Ok(total)
}
