//! Synchronous paged-query collaborator.
//!
//! The retrieval engine consumes this through the [`Connection`] trait;
//! [`RestConnection`] implements it over the REST API's `query`, `queryAll`
//! and `queryMore` endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};

/// Default API version used for query URLs.
pub const DEFAULT_API_VERSION: &str = "62.0";

/// One page of query results, mirroring the REST API response shape.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryPage {
    /// Total number of records matching the query.
    #[serde(rename = "totalSize")]
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    pub done: bool,

    /// Continuation cursor for the next page.
    #[serde(rename = "nextRecordsUrl")]
    pub next_records_url: Option<String>,

    /// The records in this page.
    pub records: Vec<Value>,
}

/// Paged SOQL query surface of an authenticated session.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a SOQL query and return the first page.
    async fn query(&self, soql: &str) -> Result<QueryPage>;

    /// Execute a SOQL query including soft-deleted and archived rows.
    async fn query_all(&self, soql: &str) -> Result<QueryPage>;

    /// Fetch the next page for a continuation cursor.
    async fn query_more(&self, cursor: &str) -> Result<QueryPage>;
}

/// REST implementation of [`Connection`].
///
/// The access token is redacted in Debug output.
#[derive(Clone)]
pub struct RestConnection {
    http: reqwest::Client,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for RestConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConnection")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl RestConnection {
    /// Create a connection from an already-authenticated session handle.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config("HTTP client".into()), e))?;
        Ok(Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g. "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn query_url(&self, resource: &str, soql: &str) -> String {
        format!(
            "{}/services/data/v{}/{}?q={}",
            self.instance_url,
            self.api_version,
            resource,
            urlencoding::encode(soql)
        )
    }

    /// Normalize a cursor that may be relative or absolute.
    fn absolute(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.instance_url, url)
        } else {
            format!("{}/{}", self.instance_url, url)
        }
    }

    #[instrument(skip(self))]
    async fn get_page(&self, url: &str) -> Result<QueryPage> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::new(ErrorKind::Api(format!(
                "query failed: status {status}: {body}"
            ))));
        }
        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl Connection for RestConnection {
    async fn query(&self, soql: &str) -> Result<QueryPage> {
        self.get_page(&self.query_url("query", soql)).await
    }

    async fn query_all(&self, soql: &str) -> Result<QueryPage> {
        self.get_page(&self.query_url("queryAll", soql)).await
    }

    async fn query_more(&self, cursor: &str) -> Result<QueryPage> {
        self.get_page(&self.absolute(cursor)).await
    }
}
