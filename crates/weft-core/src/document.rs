//! Document, search result, and filter types.
//!
//! These types are shared by the storage, search, and embedding crates and
//! carry no storage-engine details: encodings (metadata JSON, joined tags,
//! vector blobs) are applied at the repository boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Documents
// ============================================================================

/// A stored document.
///
/// `is_embedded` is true iff `vector` is present and non-empty; the
/// repository maintains this invariant on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within the collection.
    pub id: String,

    /// Document text. Indexed for full-text search and embedded for
    /// vector search.
    pub content: String,

    /// Open metadata mapping, opaque to the engine except for filtering.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Tag list; set semantics for membership filtering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Embedding vector, absent until embedding completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,

    /// Fixed at first insert.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every write.
    pub updated_at: DateTime<Utc>,

    /// True iff `vector` is present and non-empty.
    pub is_embedded: bool,
}

/// Input for storing a document.
///
/// The id is optional; the repository generates a random unique token when
/// it is absent. Timestamps are assigned by the repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentDraft {
    /// Caller-supplied id, generated if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Document text (required, non-empty).
    pub content: String,

    /// Metadata mapping.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Tag list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Pre-computed embedding vector, if the caller already has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl DocumentDraft {
    /// Create a draft with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set an explicit id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a single tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replace the tag list.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a pre-computed embedding vector.
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }
}

// ============================================================================
// Search types
// ============================================================================

/// A single search result.
///
/// For full-text search the score is the bm25 ranking statistic (lower is
/// more relevant); for vector search it is the similarity under the selected
/// metric (higher is more similar). `rank` is 1-based and assigned after
/// final ordering and truncation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,

    /// Ranking statistic or similarity score.
    pub score: f64,

    /// 1-based position after final ordering.
    pub rank: usize,
}

/// Similarity metric for vector search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity (default).
    #[default]
    Cosine,
    /// Negative Euclidean distance, so higher is still better.
    Euclidean,
    /// Dot product.
    Dot,
}

impl Metric {
    /// Parse a metric name. Unrecognized names fall back to cosine.
    pub fn parse(name: &str) -> Self {
        match name {
            "euclidean" => Self::Euclidean,
            "dot" => Self::Dot,
            _ => Self::Cosine,
        }
    }

    /// The metric's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dot => "dot",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Filters
// ============================================================================

/// A conjunctive filter over tags and metadata fields.
///
/// The reserved keys `tag` (single string) and `tags` (list of strings,
/// AND-combined) match against the document's tag set; every other key is a
/// typed equality test against that key in the document's metadata. All keys
/// are AND-combined; there is no OR or negation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(pub Map<String, Value>);

impl FilterSpec {
    /// An empty filter, matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Require a single tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.0.insert("tag".into(), Value::String(tag.into()));
        self
    }

    /// Require every tag in the list.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<Value> = tags
            .into_iter()
            .map(|t| Value::String(t.into()))
            .collect();
        self.0.insert("tags".into(), Value::Array(list));
        self
    }

    /// Require metadata field equality.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Tenant info
// ============================================================================

/// Aggregate information about a tenant, summed over all its collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantInfo {
    /// Tenant name.
    pub name: String,

    /// Total document count.
    pub document_count: u64,

    /// Count of documents with an embedding.
    pub embedded_count: u64,

    /// Earliest document creation time, if any documents exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Latest document update time, if any documents exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    /// On-disk size of the tenant's storage file in bytes.
    pub size_bytes: u64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ------------------------------------------------------------------------
    // DocumentDraft tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_draft_new() {
        let draft = DocumentDraft::new("hello world");
        assert!(draft.id.is_none());
        assert_eq!(draft.content, "hello world");
        assert!(draft.metadata.is_empty());
        assert!(draft.tags.is_empty());
        assert!(draft.vector.is_none());
    }

    #[test]
    fn test_draft_builder() {
        let draft = DocumentDraft::new("text")
            .with_id("doc-1")
            .with_tag("python")
            .with_tag("tutorial")
            .with_metadata("author", "alice")
            .with_metadata("count", 42)
            .with_vector(vec![0.1, 0.2]);

        assert_eq!(draft.id.as_deref(), Some("doc-1"));
        assert_eq!(draft.tags, vec!["python", "tutorial"]);
        assert_eq!(draft.metadata["author"], "alice");
        assert_eq!(draft.metadata["count"], 42);
        assert_eq!(draft.vector.as_deref(), Some(&[0.1, 0.2][..]));
    }

    #[test]
    fn test_draft_with_tags_replaces() {
        let draft = DocumentDraft::new("text")
            .with_tag("old")
            .with_tags(["a", "b"]);
        assert_eq!(draft.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_draft_deserialization_minimal() {
        let draft: DocumentDraft =
            serde_json::from_str(r#"{"content": "just text"}"#).unwrap();
        assert_eq!(draft.content, "just text");
        assert!(draft.id.is_none());
        assert!(draft.tags.is_empty());
    }

    // ------------------------------------------------------------------------
    // Metric tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_metric_parse() {
        assert_eq!(Metric::parse("cosine"), Metric::Cosine);
        assert_eq!(Metric::parse("euclidean"), Metric::Euclidean);
        assert_eq!(Metric::parse("dot"), Metric::Dot);
    }

    #[test]
    fn test_metric_parse_unknown_defaults_to_cosine() {
        assert_eq!(Metric::parse("manhattan"), Metric::Cosine);
        assert_eq!(Metric::parse(""), Metric::Cosine);
    }

    #[test]
    fn test_metric_display_roundtrip() {
        for metric in [Metric::Cosine, Metric::Euclidean, Metric::Dot] {
            assert_eq!(Metric::parse(metric.as_str()), metric);
        }
    }

    #[test]
    fn test_metric_serde() {
        let json = serde_json::to_string(&Metric::Euclidean).unwrap();
        assert_eq!(json, "\"euclidean\"");
        let parsed: Metric = serde_json::from_str("\"dot\"").unwrap();
        assert_eq!(parsed, Metric::Dot);
    }

    // ------------------------------------------------------------------------
    // FilterSpec tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_filter_spec_empty() {
        let filter = FilterSpec::new();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_filter_spec_builder() {
        let filter = FilterSpec::new()
            .with_tag("python")
            .with_field("difficulty", "easy");

        assert!(!filter.is_empty());
        assert_eq!(filter.0["tag"], "python");
        assert_eq!(filter.0["difficulty"], "easy");
    }

    #[test]
    fn test_filter_spec_with_tags() {
        let filter = FilterSpec::new().with_tags(["java", "script"]);
        assert_eq!(filter.0.get("tags").unwrap(), &json!(["java", "script"]));
    }

    #[test]
    fn test_filter_spec_from_request_body() {
        // The wire shape a search request carries.
        let filter: FilterSpec =
            serde_json::from_str(r#"{"tag": "advanced", "count": 42}"#).unwrap();
        assert_eq!(filter.0["tag"], "advanced");
        assert_eq!(filter.0["count"], 42);
    }
}
