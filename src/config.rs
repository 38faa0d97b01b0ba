//! Export configuration.
//!
//! The exporter consumes configuration through this narrow surface: whether
//! bulk retrieval is enabled, per-object query overrides, an optional global
//! default filter, output directory helpers, the payload file-naming policy,
//! and the before-export hook.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Default interval between bulk batch status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Hook invoked exactly once per export that produces output, with the
/// object API name and the output file path.
pub type BeforeExportHook = Arc<dyn Fn(&str, &Path) + Send + Sync>;

/// Policy deriving a payload file name from a name-field value and a record
/// id. Returning `None` skips extraction for that record.
pub type PayloadFileNamer = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// Configuration for an export run.
#[derive(Clone)]
pub struct ExportConfig {
    /// Whether asynchronous bulk retrieval may be used at all.
    pub bulk_enabled: bool,
    /// Interval between bulk batch status polls.
    pub poll_interval: Duration,
    /// Optional upper bound on poll attempts. `None` polls until the batch
    /// reaches a terminal state, matching the historical behavior.
    pub max_poll_attempts: Option<u32>,
    /// Directory receiving CSV files and payload subdirectories.
    pub output_dir: PathBuf,
    /// Optional default WHERE clause for objects without an override query.
    pub global_filter: Option<String>,
    object_queries: HashMap<String, String>,
    before_export: Option<BeforeExportHook>,
    payload_file_namer: Option<PayloadFileNamer>,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("bulk_enabled", &self.bulk_enabled)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("output_dir", &self.output_dir)
            .field("global_filter", &self.global_filter)
            .field("object_queries", &self.object_queries)
            .finish_non_exhaustive()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bulk_enabled: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: None,
            output_dir: PathBuf::from("."),
            global_filter: None,
            object_queries: HashMap::new(),
            before_export: None,
            payload_file_namer: None,
        }
    }
}

impl ExportConfig {
    /// Create a new config builder.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }

    /// Look up the override query for an object, case-insensitively.
    pub fn query_override(&self, object: &str) -> Option<&str> {
        self.object_queries
            .get(&object.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether an object-specific override query is configured.
    pub fn has_query_override(&self, object: &str) -> bool {
        self.object_queries
            .contains_key(&object.to_ascii_lowercase())
    }

    /// Invoke the before-export hook, if one is configured.
    pub fn notify_before_export(&self, object: &str, path: &Path) {
        if let Some(hook) = &self.before_export {
            hook(object, path);
        }
    }

    /// Derive a payload file name from a name-field value and a record id.
    ///
    /// The default policy is `<id>-<name>`; an empty name yields `None`.
    pub fn payload_file_name(&self, name: &str, id: &str) -> Option<String> {
        if let Some(namer) = &self.payload_file_namer {
            return namer(name, id);
        }
        if name.trim().is_empty() {
            None
        } else {
            Some(format!("{id}-{name}"))
        }
    }

    /// Create a directory and its parents if missing.
    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(Into::into)
    }
}

/// Builder for [`ExportConfig`].
#[derive(Default)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    /// Enable or disable bulk retrieval.
    pub fn with_bulk_enabled(mut self, enabled: bool) -> Self {
        self.config.bulk_enabled = enabled;
        self
    }

    /// Set the bulk batch poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Bound the number of poll attempts per batch.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.config.max_poll_attempts = Some(attempts);
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Register an object-specific override query.
    pub fn with_object_query(
        mut self,
        object: impl AsRef<str>,
        soql: impl Into<String>,
    ) -> Self {
        self.config
            .object_queries
            .insert(object.as_ref().to_ascii_lowercase(), soql.into());
        self
    }

    /// Set the global default filter clause.
    pub fn with_global_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.global_filter = Some(filter.into());
        self
    }

    /// Set the before-export hook.
    pub fn with_before_export(
        mut self,
        hook: impl Fn(&str, &Path) + Send + Sync + 'static,
    ) -> Self {
        self.config.before_export = Some(Arc::new(hook));
        self
    }

    /// Replace the default payload file-naming policy.
    pub fn with_payload_file_namer(
        mut self,
        namer: impl Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.config.payload_file_namer = Some(Arc::new(namer));
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ExportConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert!(!config.bulk_enabled);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert!(config.max_poll_attempts.is_none());
        assert!(config.global_filter.is_none());
    }

    #[test]
    fn test_override_lookup_is_case_insensitive() {
        let config = ExportConfig::builder()
            .with_object_query("Account", "SELECT Id FROM Account")
            .build();

        assert!(config.has_query_override("ACCOUNT"));
        assert_eq!(
            config.query_override("account"),
            Some("SELECT Id FROM Account")
        );
        assert!(config.query_override("Contact").is_none());
    }

    #[test]
    fn test_default_payload_naming() {
        let config = ExportConfig::default();
        assert_eq!(
            config.payload_file_name("report.pdf", "00Pxx1"),
            Some("00Pxx1-report.pdf".to_string())
        );
        assert_eq!(config.payload_file_name("", "00Pxx1"), None);
        assert_eq!(config.payload_file_name("   ", "00Pxx1"), None);
    }

    #[test]
    fn test_custom_payload_namer() {
        let config = ExportConfig::builder()
            .with_payload_file_namer(|name, id| Some(format!("{name}.{id}")))
            .build();
        assert_eq!(
            config.payload_file_name("a.txt", "1"),
            Some("a.txt.1".to_string())
        );
    }
}
