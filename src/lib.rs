//! # sf-export
//!
//! Exports Salesforce records into flat CSV files, selecting between two
//! retrieval paths per object:
//!
//! - **Paged** — synchronous SOQL over the REST `query`/`queryAll` endpoints
//!   with cursor-based pagination, one CSV row per record.
//! - **Bulk** — an asynchronous job: submit the query as a batch, poll to a
//!   terminal state, stream the result parts, close the job.
//!
//! Selection is driven by configuration (bulk enabled, per-object query
//! overrides, a global default filter) and by query shape: the bulk path
//! cannot express relationship fields or base64 payload fields and falls
//! back to the paged path for them. Binary payloads (Attachment, Document,
//! ContentVersion) are base64-decoded and written as separate files next to
//! the CSV.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_export::{
//!     export_object, BulkHttpService, ExportConfig, FieldDescribe, RestConnection,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sf_export::Error> {
//!     let connection = RestConnection::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token",
//!     )?;
//!     let bulk = BulkHttpService::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token",
//!     )?;
//!     let config = ExportConfig::builder()
//!         .with_bulk_enabled(true)
//!         .with_output_dir("./export")
//!         .with_global_filter("CreatedDate > 2020-01-01T00:00:00Z")
//!         .build();
//!
//!     let fields = vec![
//!         FieldDescribe::new("Id", "id"),
//!         FieldDescribe::new("Name", "string"),
//!     ];
//!     let summary = export_object(&connection, &bulk, &config, "Account", &fields).await?;
//!     println!("exported: {summary:?}");
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod bulk;
pub mod bulk_load;
pub mod config;
pub mod describe;
mod error;
pub mod exporter;
pub mod output;
pub mod record;
pub mod rest;
pub mod soql;
pub mod strategy;
pub mod sync_load;

pub use bulk::{
    BatchInfo, BatchState, BulkHttpService, BulkJobService, CreateJobRequest, JobInfo, JobState,
};
pub use config::{BeforeExportHook, ExportConfig, ExportConfigBuilder, PayloadFileNamer};
pub use describe::FieldDescribe;
pub use error::{Error, ErrorKind, Result};
pub use exporter::export_object;
pub use record::FieldResolver;
pub use rest::{Connection, QueryPage, RestConnection, DEFAULT_API_VERSION};
pub use soql::ParsedQuery;
pub use strategy::{LoadSummary, RetrievalMode};
