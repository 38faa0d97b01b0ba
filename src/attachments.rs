//! Binary payload extraction for blob-carrying objects.
//!
//! Runs per record after its CSV row is written. Extraction failures are the
//! caller's to log; they must never block the row itself.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::record::FieldResolver;

/// Name/body field pair for object types that carry binary payloads.
fn payload_fields(object: &str) -> Option<(&'static str, &'static str)> {
    if object.eq_ignore_ascii_case("attachment") || object.eq_ignore_ascii_case("document") {
        Some(("Name", "Body"))
    } else if object.eq_ignore_ascii_case("contentversion") {
        Some(("PathOnClient", "VersionData"))
    } else {
        None
    }
}

/// Persist the record's binary payload under `<output_dir>/<object>/`.
///
/// Object types without a payload mapping are a no-op. A record whose file
/// name cannot be derived is skipped silently; an empty payload writes no
/// file.
pub fn process(config: &ExportConfig, object: &str, record: &Value) -> Result<()> {
    let Some((name_field, body_field)) = payload_fields(object) else {
        return Ok(());
    };

    let resolver = FieldResolver::new(record);
    let name = resolver.resolve_text(name_field);
    let id = resolver.resolve_text("Id");
    let Some(file_name) = config.payload_file_name(&name, &id) else {
        debug!(object, id, "no payload file name derived, skipping");
        return Ok(());
    };

    let dir = config.output_dir.join(object);
    config.ensure_dir(&dir)?;

    let body = resolver.resolve_text(body_field);
    let bytes = BASE64.decode(body.as_bytes()).map_err(|e| {
        Error::with_source(
            ErrorKind::Io(format!("invalid base64 payload for {object} {id}")),
            e,
        )
    })?;
    if !bytes.is_empty() {
        std::fs::write(dir.join(&file_name), &bytes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(dir: &std::path::Path) -> ExportConfig {
        ExportConfig::builder().with_output_dir(dir).build()
    }

    #[test]
    fn test_attachment_payload_written() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({
            "Id": "00Px1",
            "Name": "note.txt",
            "Body": BASE64.encode(b"hello")
        });

        process(&config(dir.path()), "Attachment", &record).unwrap();

        let written = std::fs::read(dir.path().join("Attachment/00Px1-note.txt")).unwrap();
        assert_eq!(written, b"hello");
    }

    #[test]
    fn test_contentversion_uses_path_on_client() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({
            "Id": "068x1",
            "PathOnClient": "scan.pdf",
            "VersionData": BASE64.encode(b"%PDF-")
        });

        process(&config(dir.path()), "ContentVersion", &record).unwrap();

        assert!(dir.path().join("ContentVersion/068x1-scan.pdf").exists());
    }

    #[test]
    fn test_unmapped_object_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({"Id": "001x1", "Name": "Acme"});

        process(&config(dir.path()), "Account", &record).unwrap();

        assert!(!dir.path().join("Account").exists());
    }

    #[test]
    fn test_missing_name_skips_silently() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({"Id": "00Px2", "Body": BASE64.encode(b"data")});

        process(&config(dir.path()), "Attachment", &record).unwrap();

        // directory may not even be created when the name is undecidable
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_empty_payload_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({"Id": "00Px3", "Name": "empty.bin", "Body": ""});

        process(&config(dir.path()), "Attachment", &record).unwrap();

        assert!(!dir.path().join("Attachment/00Px3-empty.bin").exists());
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({"Id": "00Px4", "Name": "bad.bin", "Body": "!!not-base64!!"});

        let err = process(&config(dir.path()), "Attachment", &record).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Io(_)));
    }
}
