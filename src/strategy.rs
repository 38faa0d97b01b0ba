//! Retrieval-mode selection and dispatch.
//!
//! The mode set is closed: two execution engines (paged vs. bulk) crossed
//! with whether the configuration-supplied global filter applies. Selection
//! is a pure decision over configuration and query metadata; modes are
//! stateless values reusable across exports.

use std::path::Path;

use crate::bulk::BulkJobService;
use crate::bulk_load;
use crate::config::ExportConfig;
use crate::describe::{field_named, FieldDescribe};
use crate::error::Result;
use crate::rest::Connection;
use crate::soql::ParsedQuery;
use crate::sync_load;

/// Outcome of a `load`: the paged path counts rows, the bulk path counts
/// bytes streamed to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSummary {
    /// Rows written by the paged path (the first page's total size).
    Records(u64),
    /// Bytes written by the bulk path.
    Bytes(u64),
}

/// The four retrieval modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Bulk job, default query filtered by the global filter.
    BulkWithGlobalFilter,
    /// Paged query, default query filtered by the global filter.
    PagedWithGlobalFilter,
    /// Bulk job.
    Bulk,
    /// Paged query. Always applicable; the fallback.
    Paged,
}

impl RetrievalMode {
    /// Candidate order for selection. Global-filter variants carry stricter
    /// preconditions and are checked before the generic ones.
    pub const CANDIDATES: [RetrievalMode; 4] = [
        RetrievalMode::BulkWithGlobalFilter,
        RetrievalMode::PagedWithGlobalFilter,
        RetrievalMode::Bulk,
        RetrievalMode::Paged,
    ];

    /// Whether this mode uses the asynchronous bulk path.
    pub fn is_asynchronous(&self) -> bool {
        matches!(
            self,
            RetrievalMode::Bulk | RetrievalMode::BulkWithGlobalFilter
        )
    }

    /// Whether this mode applies the global default filter clause.
    pub fn allows_global_filter(&self) -> bool {
        matches!(
            self,
            RetrievalMode::BulkWithGlobalFilter | RetrievalMode::PagedWithGlobalFilter
        )
    }

    /// Coarse eligibility over configuration alone.
    ///
    /// Bulk modes require bulk retrieval to be enabled. Global-filter modes
    /// require that the object has no override query and that a global
    /// filter is configured.
    pub fn is_applicable(&self, config: &ExportConfig, object: &str) -> bool {
        if self.is_asynchronous() && !config.bulk_enabled {
            return false;
        }
        if self.allows_global_filter()
            && (config.has_query_override(object) || config.global_filter.is_none())
        {
            return false;
        }
        true
    }

    /// Fine eligibility layered on top of [`Self::is_applicable`].
    ///
    /// The bulk job mechanism can express neither relationship (dotted)
    /// fields nor base64-typed payload fields; bulk modes reject queries
    /// containing either. Other modes delegate to the coarse check.
    pub fn is_really_applicable(
        &self,
        config: &ExportConfig,
        object: &str,
        query: &ParsedQuery,
        fields: &[FieldDescribe],
    ) -> bool {
        if !self.is_applicable(config, object) {
            return false;
        }
        if self.is_asynchronous() {
            if query.has_relationship_fields() {
                return false;
            }
            let has_binary = query
                .fields()
                .iter()
                .any(|name| field_named(fields, name).is_some_and(FieldDescribe::is_binary));
            if has_binary {
                return false;
            }
        }
        true
    }

    /// Pick the most specific mode that may run for this object and query.
    pub fn select(
        config: &ExportConfig,
        object: &str,
        query: &ParsedQuery,
        fields: &[FieldDescribe],
    ) -> RetrievalMode {
        Self::CANDIDATES
            .into_iter()
            .find(|mode| mode.is_really_applicable(config, object, query, fields))
            .unwrap_or(RetrievalMode::Paged)
    }

    /// Execute the export for this mode.
    pub async fn load(
        &self,
        connection: &dyn Connection,
        bulk: &dyn BulkJobService,
        config: &ExportConfig,
        query: &ParsedQuery,
        out_path: &Path,
    ) -> Result<LoadSummary> {
        if self.is_asynchronous() {
            bulk_load::load(bulk, config, query, out_path)
                .await
                .map(LoadSummary::Bytes)
        } else {
            sync_load::load(connection, config, query, out_path)
                .await
                .map(LoadSummary::Records)
        }
    }
}
