//! Filter-spec compilation to SQL predicate fragments.
//!
//! Both search engines share this compiler, so a filter behaves identically
//! whether it constrains a full-text query or a vector scan. The reserved
//! keys `tag` and `tags` test membership in the comma-joined tag column;
//! every other key is a typed equality test against the metadata JSON blob.
//!
//! # Tag membership
//!
//! Tags are stored joined with `,`, so membership needs a four-way test
//! against the joined string: exact match, prefix before the delimiter,
//! delimiter-wrapped substring, and suffix after the delimiter. Treating the
//! column as a delimited set this way avoids partial-token false positives —
//! a filter for `java` cannot match a document whose only tag is
//! `javascript`, because none of the four patterns match it.
//!
//! # Parameter binding
//!
//! The compiled fragment contains only `?` placeholders. Values — including
//! the JSON path for metadata keys — travel in the argument list and are
//! bound by the caller, never interpolated.

use serde_json::Value;
use weft_core::document::FilterSpec;

/// A single argument for a compiled filter fragment, typed so the backend's
/// type-aware comparison applies.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    /// Bound as SQL text.
    Text(String),
    /// Bound as SQL integer (also used for booleans as 0/1).
    Int(i64),
    /// Bound as SQL real.
    Real(f64),
}

/// Compile a filter spec into a predicate fragment and its argument list.
///
/// The fragment starts with ` AND ` so it can be appended to an existing
/// `WHERE` clause as extra conjuncts; an empty spec compiles to an empty
/// fragment and no arguments. `alias` optionally prefixes column references
/// (e.g. `"d"` for `d.tags`).
pub fn compile_filter(filters: &FilterSpec, alias: &str) -> (String, Vec<FilterArg>) {
    if filters.is_empty() {
        return (String::new(), Vec::new());
    }

    let prefix = if alias.is_empty() {
        String::new()
    } else {
        format!("{alias}.")
    };

    let mut conditions = Vec::new();
    let mut args = Vec::new();

    for (key, value) in &filters.0 {
        match key.as_str() {
            "tags" => {
                for tag in tag_values(value) {
                    push_tag_condition(&prefix, tag, &mut conditions, &mut args);
                }
            }
            "tag" => {
                if let Value::String(tag) = value {
                    push_tag_condition(&prefix, tag, &mut conditions, &mut args);
                }
            }
            _ => {
                conditions.push(format!("json_extract({prefix}metadata, ?) = ?"));
                args.push(FilterArg::Text(format!("$.{key}")));
                args.push(metadata_arg(value));
            }
        }
    }

    if conditions.is_empty() {
        return (String::new(), Vec::new());
    }

    (format!(" AND {}", conditions.join(" AND ")), args)
}

/// Extract the tag list from a `tags` filter value: a single string or a
/// list of strings. Non-string elements are ignored.
fn tag_values(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn push_tag_condition(
    prefix: &str,
    tag: &str,
    conditions: &mut Vec<String>,
    args: &mut Vec<FilterArg>,
) {
    conditions.push(format!(
        "({p}tags = ? OR {p}tags LIKE ? OR {p}tags LIKE ? OR {p}tags LIKE ?)",
        p = prefix
    ));
    args.push(FilterArg::Text(tag.to_string()));
    args.push(FilterArg::Text(format!("{tag},%")));
    args.push(FilterArg::Text(format!("%,{tag},%")));
    args.push(FilterArg::Text(format!("%,{tag}")));
}

/// Convert a metadata filter value to a typed argument.
///
/// `json_extract` yields native SQL types, so the comparison value must
/// match: text for strings, integer/real for numbers, 0/1 for booleans. For
/// anything else the JSON encoding is compared as text, with outer quotes
/// stripped so it lines up with what `json_extract` returns for strings.
fn metadata_arg(value: &Value) -> FilterArg {
    match value {
        Value::String(s) => FilterArg::Text(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FilterArg::Int(i)
            } else {
                FilterArg::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::Bool(b) => FilterArg::Int(i64::from(*b)),
        other => {
            let encoded = other.to_string();
            let stripped = encoded
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(&encoded);
            FilterArg::Text(stripped.to_string())
        }
    }
}

/// Bind compiled filter arguments onto a query, preserving order.
pub fn bind_filter_args<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    args: &[FilterArg],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            FilterArg::Text(s) => query.bind(s.clone()),
            FilterArg::Int(i) => query.bind(*i),
            FilterArg::Real(f) => query.bind(*f),
        };
    }
    query
}

// ============================================================================
// Tests
// ============================================================================
