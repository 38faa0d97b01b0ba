//! Error types for sf-export.

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for export operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this is a remote processing failure (a bulk batch
    /// that reached the Failed state).
    pub fn is_processing(&self) -> bool {
        matches!(self.kind, ErrorKind::Processing(_))
    }

    /// Returns true if this is a fatal job setup failure.
    pub fn is_job_setup(&self) -> bool {
        matches!(self.kind, ErrorKind::Job(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// Bulk job setup failed; not retryable.
    #[error("Job error: {0}")]
    Job(String),

    /// A bulk batch reached the Failed state; carries the server message.
    #[error("Batch processing failed: {0}")]
    Processing(String),

    /// A query string could not be parsed.
    #[error("Query error: {0}")]
    Query(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV writing error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Poll attempt budget exhausted.
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error {
            kind: ErrorKind::Http(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error {
            kind: ErrorKind::Csv(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Json(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_classification() {
        let err = Error::new(ErrorKind::Processing("InvalidBatch: field error".into()));
        assert!(err.is_processing());
        assert!(!err.is_job_setup());
        assert!(err.to_string().contains("InvalidBatch"));
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err.kind, ErrorKind::Io(_)));
        assert!(err.source.is_some());
    }
}
