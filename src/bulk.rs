//! Asynchronous bulk-job collaborator.
//!
//! Models the job/batch/result shape of the bulk endpoint: a job is created
//! for an object, the query text is added as a single batch, the batch is
//! polled to a terminal state, completed batches expose result parts that
//! are streamed, and the job is closed server-side when drained. The engine
//! consumes this through the [`BulkJobService`] trait.

use async_trait::async_trait;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};
use crate::rest::DEFAULT_API_VERSION;

/// Lifecycle states of a bulk job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Job is open and accepting batches
    Open,
    /// Job is closed; no further batches
    Closed,
    /// Job was aborted
    Aborted,
    /// Job failed
    Failed,
}

/// Lifecycle states of a bulk batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    /// Batch is waiting to be processed
    Queued,
    /// Batch is processing
    InProgress,
    /// Batch completed; results are available
    Completed,
    /// Batch failed; the state message carries the server error
    Failed,
    /// Batch was skipped by the server
    NotProcessed,
}

impl BatchState {
    /// Check if the batch is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::Failed | BatchState::NotProcessed
        )
    }

    /// Check if the batch completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, BatchState::Completed)
    }
}

/// Request to create a bulk job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    /// Operation type
    pub operation: String,
    /// SObject API name
    pub object: String,
    /// Content type of batches and results
    pub content_type: String,
    /// Concurrency mode
    pub concurrency_mode: String,
}

impl CreateJobRequest {
    /// Query job for the given object: CSV content, parallel concurrency.
    /// Result parts may arrive in any order; the export file is unordered.
    pub fn query(object: impl Into<String>) -> Self {
        Self {
            operation: "query".to_string(),
            object: object.into(),
            content_type: "CSV".to_string(),
            concurrency_mode: "Parallel".to_string(),
        }
    }
}

/// Request to update a job's state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetJobStateRequest {
    /// Target state
    pub state: JobState,
}

impl SetJobStateRequest {
    /// Mark a job closed.
    pub fn closed() -> Self {
        Self {
            state: JobState::Closed,
        }
    }
}

/// Bulk job response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// Job ID; empty when creation failed without an error status
    #[serde(default)]
    pub id: String,
    /// Current state
    pub state: JobState,
    /// SObject API name
    #[serde(default)]
    pub object: Option<String>,
    /// Operation type
    #[serde(default)]
    pub operation: Option<String>,
}

/// Bulk batch response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    /// Batch ID
    pub id: String,
    /// Owning job ID
    #[serde(default)]
    pub job_id: String,
    /// Current state
    pub state: BatchState,
    /// Server message, populated for failed batches
    #[serde(default)]
    pub state_message: Option<String>,
}

/// Streaming reader over one result part.
pub type ResultStream = Box<dyn AsyncRead + Send + Unpin>;

/// Bulk-job surface of an authenticated session.
#[async_trait]
pub trait BulkJobService: Send + Sync {
    /// Create a job. A successful response with an empty id is a fatal
    /// setup failure for the caller.
    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobInfo>;

    /// Add the query text as a single batch against the job.
    async fn create_batch(&self, job_id: &str, soql: &str) -> Result<BatchInfo>;

    /// Fetch the current status of a batch.
    async fn batch_status(&self, job_id: &str, batch_id: &str) -> Result<BatchInfo>;

    /// List the result-part identifiers of a completed batch.
    async fn result_ids(&self, job_id: &str, batch_id: &str) -> Result<Vec<String>>;

    /// Open a streaming reader over one result part.
    async fn open_result(
        &self,
        job_id: &str,
        batch_id: &str,
        result_id: &str,
    ) -> Result<ResultStream>;

    /// Close the job server-side.
    async fn close_job(&self, job_id: &str) -> Result<JobInfo>;
}

/// HTTP implementation of [`BulkJobService`] against the
/// `/services/async/{version}` endpoint.
///
/// The session id is redacted in Debug output.
#[derive(Clone)]
pub struct BulkHttpService {
    http: reqwest::Client,
    instance_url: String,
    session_id: String,
    api_version: String,
}

impl std::fmt::Debug for BulkHttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkHttpService")
            .field("instance_url", &self.instance_url)
            .field("session_id", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl BulkHttpService {
    /// Create a service from an already-authenticated session handle.
    pub fn new(instance_url: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config("HTTP client".into()), e))?;
        Ok(Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g. "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn job_url(&self, path: &str) -> String {
        format!(
            "{}/services/async/{}/job{}",
            self.instance_url, self.api_version, path
        )
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::new(ErrorKind::Api(format!(
                "{what} failed: status {status}: {body}"
            ))));
        }
        Ok(response)
    }
}

#[async_trait]
impl BulkJobService for BulkHttpService {
    #[instrument(skip(self, request))]
    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobInfo> {
        let response = self
            .http
            .post(self.job_url(""))
            .header("X-SFDC-Session", &self.session_id)
            .json(request)
            .send()
            .await?;
        Self::check(response, "create job")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, soql))]
    async fn create_batch(&self, job_id: &str, soql: &str) -> Result<BatchInfo> {
        let response = self
            .http
            .post(self.job_url(&format!("/{job_id}/batch")))
            .header("X-SFDC-Session", &self.session_id)
            .header("Content-Type", "text/csv")
            .body(soql.to_string())
            .send()
            .await?;
        Self::check(response, "create batch")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn batch_status(&self, job_id: &str, batch_id: &str) -> Result<BatchInfo> {
        let response = self
            .http
            .get(self.job_url(&format!("/{job_id}/batch/{batch_id}")))
            .header("X-SFDC-Session", &self.session_id)
            .send()
            .await?;
        Self::check(response, "batch status")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn result_ids(&self, job_id: &str, batch_id: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.job_url(&format!("/{job_id}/batch/{batch_id}/result")))
            .header("X-SFDC-Session", &self.session_id)
            .send()
            .await?;
        Self::check(response, "result list")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn open_result(
        &self,
        job_id: &str,
        batch_id: &str,
        result_id: &str,
    ) -> Result<ResultStream> {
        let response = self
            .http
            .get(self.job_url(&format!("/{job_id}/batch/{batch_id}/result/{result_id}")))
            .header("X-SFDC-Session", &self.session_id)
            .send()
            .await?;
        let response = Self::check(response, "open result").await?;
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(stream)))
    }

    #[instrument(skip(self))]
    async fn close_job(&self, job_id: &str) -> Result<JobInfo> {
        let response = self
            .http
            .post(self.job_url(&format!("/{job_id}")))
            .header("X-SFDC-Session", &self.session_id)
            .json(&SetJobStateRequest::closed())
            .send()
            .await?;
        Self::check(response, "close job")
            .await?
            .json()
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_state_terminal() {
        assert!(!BatchState::Queued.is_terminal());
        assert!(!BatchState::InProgress.is_terminal());
        assert!(BatchState::Completed.is_terminal());
        assert!(BatchState::Failed.is_terminal());
        assert!(BatchState::NotProcessed.is_terminal());
        assert!(BatchState::Completed.is_success());
        assert!(!BatchState::Failed.is_success());
    }

    #[test]
    fn test_create_job_request_shape() {
        let request = CreateJobRequest::query("Account");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["operation"], "query");
        assert_eq!(json["object"], "Account");
        assert_eq!(json["contentType"], "CSV");
        assert_eq!(json["concurrencyMode"], "Parallel");
    }

    #[test]
    fn test_set_job_state_closed() {
        let json = serde_json::to_value(SetJobStateRequest::closed()).unwrap();
        assert_eq!(json["state"], "Closed");
    }

    #[test]
    fn test_batch_info_deserialization() {
        let json = r#"{
            "id": "751x1",
            "jobId": "750x1",
            "state": "Failed",
            "stateMessage": "InvalidBatch : Failed to process query"
        }"#;
        let batch: BatchInfo = serde_json::from_str(json).unwrap();
        assert_eq!(batch.state, BatchState::Failed);
        assert!(batch.state_message.unwrap().contains("InvalidBatch"));
    }

    #[test]
    fn test_job_info_tolerates_missing_id() {
        let json = r#"{"state": "Open"}"#;
        let job: JobInfo = serde_json::from_str(json).unwrap();
        assert!(job.id.is_empty());
    }

    #[test]
    fn test_job_url_building() {
        let service = BulkHttpService::new("https://na1.salesforce.com/", "session").unwrap();
        assert_eq!(
            service.job_url(""),
            "https://na1.salesforce.com/services/async/62.0/job"
        );
        assert_eq!(
            service.job_url("/750x1/batch/751x1/result"),
            "https://na1.salesforce.com/services/async/62.0/job/750x1/batch/751x1/result"
        );
    }

    #[test]
    fn test_debug_redacts_session() {
        let service = BulkHttpService::new("https://na1.salesforce.com", "secret").unwrap();
        let rendered = format!("{service:?}");
        assert!(!rendered.contains("secret"));
    }
}
