//! Per-field schema metadata, trimmed to what the exporter consumes.

use serde::{Deserialize, Serialize};

/// Field metadata from an SObject describe result.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDescribe {
    /// Field API name.
    pub name: String,
    /// Field type tag (e.g. `string`, `reference`, `base64`).
    #[serde(rename = "type")]
    pub field_type: String,
    /// SOAP type, when the describe result carries one.
    #[serde(rename = "soapType", default)]
    pub soap_type: Option<String>,
}

impl FieldDescribe {
    /// Construct a descriptor by hand (tests, callers without a describe).
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            soap_type: None,
        }
    }

    /// Base64-typed fields carry binary payloads (Attachment.Body,
    /// ContentVersion.VersionData); the bulk job path cannot express them.
    pub fn is_binary(&self) -> bool {
        self.field_type.eq_ignore_ascii_case("base64")
    }
}

/// Find a descriptor by field API name, case-insensitively.
pub fn field_named<'a>(fields: &'a [FieldDescribe], name: &str) -> Option<&'a FieldDescribe> {
    fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_detection() {
        assert!(FieldDescribe::new("Body", "base64").is_binary());
        assert!(FieldDescribe::new("Body", "Base64").is_binary());
        assert!(!FieldDescribe::new("Name", "string").is_binary());
    }

    #[test]
    fn test_deserialize_from_describe_shape() {
        let json = r#"{"name": "Body", "type": "base64", "soapType": "base64Binary"}"#;
        let field: FieldDescribe = serde_json::from_str(json).unwrap();
        assert_eq!(field.name, "Body");
        assert!(field.is_binary());
        assert_eq!(field.soap_type.as_deref(), Some("base64Binary"));
    }

    #[test]
    fn test_field_lookup_case_insensitive() {
        let fields = vec![
            FieldDescribe::new("Id", "id"),
            FieldDescribe::new("Name", "string"),
        ];
        assert!(field_named(&fields, "name").is_some());
        assert!(field_named(&fields, "Missing").is_none());
    }
}
