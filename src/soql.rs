//! SOQL query text and its parsed metadata.

use crate::error::{Error, ErrorKind, Result};

/// An immutable SOQL query plus the metadata the retrieval engine keys on:
/// the target object, the ordered field list, whether the query requests all
/// rows (including soft-deleted/archived), and whether it traverses
/// relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    text: String,
    object: String,
    fields: Vec<String>,
    is_all_rows: bool,
}

impl ParsedQuery {
    /// Parse a SOQL query string.
    ///
    /// A trailing `ALL ROWS` clause is stripped from the text sent to the
    /// server and recorded as the all-rows flag (it routes the query to the
    /// queryAll endpoint).
    pub fn parse(soql: &str) -> Result<Self> {
        let trimmed = soql.trim();
        let (body, is_all_rows) = match strip_suffix_ci(trimmed, "ALL ROWS") {
            Some(stripped) => (stripped.trim_end(), true),
            None => (trimmed, false),
        };

        let lower = body.to_ascii_lowercase();
        if !lower.starts_with("select ") {
            return Err(Error::new(ErrorKind::Query(format!(
                "not a SELECT query: {body}"
            ))));
        }
        let from_idx = lower.find(" from ").ok_or_else(|| {
            Error::new(ErrorKind::Query(format!("query has no FROM clause: {body}")))
        })?;

        let fields: Vec<String> = body["select ".len()..from_idx]
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            return Err(Error::new(ErrorKind::Query(format!(
                "query selects no fields: {body}"
            ))));
        }

        let object = body[from_idx + " from ".len()..]
            .split_whitespace()
            .next()
            .ok_or_else(|| {
                Error::new(ErrorKind::Query(format!(
                    "query has no target object: {body}"
                )))
            })?
            .to_string();

        Ok(Self {
            text: body.to_string(),
            object,
            fields,
            is_all_rows,
        })
    }

    /// Assemble a default query for an object without an override.
    pub fn build(object: &str, fields: &[&str], filter: Option<&str>) -> Self {
        let mut text = format!("SELECT {} FROM {}", fields.join(", "), object);
        if let Some(filter) = filter {
            text.push_str(" WHERE ");
            text.push_str(filter);
        }
        Self {
            text,
            object: object.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            is_all_rows: false,
        }
    }

    /// The query text sent to the server.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The target object API name.
    pub fn object(&self) -> &str {
        &self.object
    }

    /// The requested field names, in query order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Whether soft-deleted/archived rows are requested.
    pub fn is_all_rows(&self) -> bool {
        self.is_all_rows
    }

    /// Whether any requested field traverses a relationship.
    pub fn has_relationship_fields(&self) -> bool {
        self.fields.iter().any(|f| f.contains('.'))
    }
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(cut) && s[cut..].eq_ignore_ascii_case(suffix) {
        Some(&s[..cut])
    } else {
        None
    }
}
