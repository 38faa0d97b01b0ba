//! Field resolution over hierarchical records.
//!
//! Query results arrive as JSON objects whose nested objects represent
//! relationship traversals (`Owner.Name`). Field names are matched
//! case-insensitively at every path segment.

use serde_json::Value;

/// Resolves field paths against a single record.
///
/// Wrap a record explicitly at each use site with [`FieldResolver::new`];
/// the resolver borrows the record and is cheap to construct.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    record: &'a Value,
}

impl<'a> FieldResolver<'a> {
    /// Wrap a record for field resolution.
    pub fn new(record: &'a Value) -> Self {
        Self { record }
    }

    /// Resolve a possibly dotted, possibly case-mismatched field path to its
    /// leaf value.
    ///
    /// Returns `None` when any path segment is empty or not found, or when
    /// the path addresses a relationship that is unset on this record.
    /// Traversal is iterative, so arbitrarily deep relationship chains do
    /// not grow the call stack.
    pub fn resolve(&self, path: &str) -> Option<&'a Value> {
        let mut current = self.record;
        let mut remaining = path;

        loop {
            let (segment, rest) = match remaining.split_once('.') {
                Some((head, tail)) => (head, tail),
                None => (remaining, ""),
            };
            if segment.is_empty() {
                return None;
            }

            let children = current.as_object()?;
            // First case-insensitive match wins; the `attributes` metadata
            // object is never a relationship child.
            let (_, value) = children.iter().find(|(name, _)| {
                !name.eq_ignore_ascii_case("attributes") && name.eq_ignore_ascii_case(segment)
            })?;

            if value.is_object() {
                current = value;
                remaining = rest;
            } else if rest.is_empty() {
                return Some(value);
            } else {
                // Path descends further but this child has no children:
                // an unset relationship, not an error.
                return None;
            }
        }
    }

    /// Resolve a path to the text written into a CSV cell.
    ///
    /// Absent and null values become the empty string; strings are returned
    /// unquoted; other scalars use their JSON rendering.
    pub fn resolve_text(&self, path: &str) -> String {
        match self.resolve(path) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
