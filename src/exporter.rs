//! Per-object export orchestration.

use std::path::PathBuf;

use tracing::{info, instrument};

use crate::bulk::BulkJobService;
use crate::config::ExportConfig;
use crate::describe::FieldDescribe;
use crate::error::Result;
use crate::rest::Connection;
use crate::soql::ParsedQuery;
use crate::strategy::{LoadSummary, RetrievalMode};

/// Export one object to `<output_dir>/<Object>.csv`.
///
/// Plans the retrieval mode and the query it will run, then executes the
/// load once.
///
/// Failures are isolated per object: the returned error never poisons
/// shared state, so a driver loop can continue with its remaining objects.
#[instrument(skip(connection, bulk, config, fields))]
pub async fn export_object(
    connection: &dyn Connection,
    bulk: &dyn BulkJobService,
    config: &ExportConfig,
    object: &str,
    fields: &[FieldDescribe],
) -> Result<LoadSummary> {
    let out_path: PathBuf = config.output_dir.join(format!("{object}.csv"));

    let (mode, query) = plan(config, object, fields)?;
    let summary = mode.load(connection, bulk, config, &query, &out_path).await?;
    info!(object, ?mode, ?summary, "export finished");
    Ok(summary)
}

/// Pick the retrieval mode for this object along with the query it runs.
///
/// Walks the candidates in specificity order, building the query each
/// candidate would run (the override if configured, otherwise a default
/// query over `fields` with the global filter when the candidate allows it)
/// and taking the first really-applicable one. The plain paged mode accepts
/// everything, so the walk never comes up empty; the trailing arm only
/// guards against a future candidate-list edit.
fn plan(
    config: &ExportConfig,
    object: &str,
    fields: &[FieldDescribe],
) -> Result<(RetrievalMode, ParsedQuery)> {
    for mode in RetrievalMode::CANDIDATES {
        if !mode.is_applicable(config, object) {
            continue;
        }
        let query = query_for(config, object, fields, mode)?;
        if mode.is_really_applicable(config, object, &query, fields) {
            return Ok((mode, query));
        }
    }
    let query = query_for(config, object, fields, RetrievalMode::Paged)?;
    Ok((RetrievalMode::Paged, query))
}

/// The query a given mode would run for this object.
fn query_for(
    config: &ExportConfig,
    object: &str,
    fields: &[FieldDescribe],
    mode: RetrievalMode,
) -> Result<ParsedQuery> {
    if let Some(text) = config.query_override(object) {
        return ParsedQuery::parse(text);
    }
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    let filter = if mode.allows_global_filter() {
        config.global_filter.as_deref()
    } else {
        None
    };
    Ok(ParsedQuery::build(object, &names, filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_for_prefers_override() {
        let config = ExportConfig::builder()
            .with_object_query("Account", "SELECT Id FROM Account WHERE Name != null")
            .with_global_filter("IsDeleted = false")
            .build();
        let fields = vec![FieldDescribe::new("Id", "id")];

        let query =
            query_for(&config, "Account", &fields, RetrievalMode::Paged).unwrap();
        assert_eq!(query.text(), "SELECT Id FROM Account WHERE Name != null");
    }

    #[test]
    fn test_query_for_applies_global_filter_only_when_allowed() {
        let config = ExportConfig::builder()
            .with_global_filter("IsDeleted = false")
            .build();
        let fields = vec![
            FieldDescribe::new("Id", "id"),
            FieldDescribe::new("Name", "string"),
        ];

        let filtered = query_for(
            &config,
            "Contact",
            &fields,
            RetrievalMode::PagedWithGlobalFilter,
        )
        .unwrap();
        assert_eq!(
            filtered.text(),
            "SELECT Id, Name FROM Contact WHERE IsDeleted = false"
        );

        let plain = query_for(&config, "Contact", &fields, RetrievalMode::Paged).unwrap();
        assert_eq!(plain.text(), "SELECT Id, Name FROM Contact");
    }

    #[test]
    fn test_plan_picks_most_specific_mode() {
        let config = ExportConfig::builder()
            .with_bulk_enabled(true)
            .with_global_filter("IsDeleted = false")
            .build();
        let fields = vec![
            FieldDescribe::new("Id", "id"),
            FieldDescribe::new("Name", "string"),
        ];

        let (mode, query) = plan(&config, "Account", &fields).unwrap();
        assert_eq!(mode, RetrievalMode::BulkWithGlobalFilter);
        assert_eq!(
            query.text(),
            "SELECT Id, Name FROM Account WHERE IsDeleted = false"
        );
    }

    #[test]
    fn test_plan_falls_back_to_paged_for_binary_fields() {
        let config = ExportConfig::builder().with_bulk_enabled(true).build();
        let fields = vec![
            FieldDescribe::new("Id", "id"),
            FieldDescribe::new("Body", "base64"),
        ];

        let (mode, query) = plan(&config, "Attachment", &fields).unwrap();
        assert_eq!(mode, RetrievalMode::Paged);
        assert_eq!(query.text(), "SELECT Id, Body FROM Attachment");
    }

    #[test]
    fn test_plan_propagates_override_parse_errors() {
        let config = ExportConfig::builder()
            .with_object_query("Account", "DELETE FROM Account")
            .build();
        let fields = vec![FieldDescribe::new("Id", "id")];

        assert!(plan(&config, "Account", &fields).is_err());
    }
}
