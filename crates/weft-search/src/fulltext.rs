//! Ranked full-text search over a collection's FTS5 shadow index.
//!
//! The shadow index is matched with the backend's text-query syntax and
//! joined back to the primary table by rowid; the compiled filter fragment
//! is applied as an additional conjunct. Results are ordered by the bm25
//! ranking statistic ascending — more relevant first, per the convention of
//! the ranking function — and carry that statistic as their score.

use std::sync::Arc;

use sqlx::Row;
use weft_core::document::{FilterSpec, SearchResult};
use weft_core::{Error, Result};
use weft_storage::filter::{bind_filter_args, compile_filter};
use weft_storage::registry::ConnectionRegistry;
use weft_storage::repository::document_from_row;
use weft_storage::schema::validate_identifier;

use crate::DEFAULT_LIMIT;

/// bm25-ranked keyword search over a collection.
#[derive(Debug, Clone)]
pub struct FullTextSearch {
    registry: Arc<ConnectionRegistry>,
}

impl FullTextSearch {
    /// Create a full-text search engine over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Search a collection for documents matching the query text,
    /// constrained by the filter spec.
    ///
    /// A zero limit falls back to [`DEFAULT_LIMIT`]. Ranks are assigned
    /// 1-based after ordering and truncation.
    pub async fn search(
        &self,
        tenant: &str,
        collection: &str,
        query: &str,
        limit: usize,
        filters: &FilterSpec,
    ) -> Result<Vec<SearchResult>> {
        validate_identifier(collection)?;
        if query.is_empty() {
            return Err(Error::validation("query text is required"));
        }
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };

        let pool = self.registry.get(tenant).await?;
        let (fragment, args) = compile_filter(filters, "d");

        let sql = format!(
            r#"
            SELECT d.id, d.content, d.metadata, d.tags, d.vector,
                   d.created_at, d.updated_at, d.is_embedded,
                   bm25("{collection}_fts") AS score
            FROM "{collection}_fts"
            JOIN "{collection}" d ON "{collection}_fts".rowid = d.rowid
            WHERE "{collection}_fts" MATCH ?{fragment}
            ORDER BY score
            LIMIT ?
            "#
        );

        let mut query_builder = sqlx::query(&sql).bind(query);
        query_builder = bind_filter_args(query_builder, &args);
        query_builder = query_builder.bind(limit as i64);

        let rows = query_builder
            .fetch_all(&pool)
            .await
            .map_err(Error::backend)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let document = document_from_row(row)?;
            let score: f64 = row.try_get("score").map_err(Error::backend)?;
            results.push(SearchResult {
                document,
                score,
                rank: 0,
            });
        }

        for (i, result) in results.iter_mut().enumerate() {
            result.rank = i + 1;
        }

        Ok(results)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weft_core::document::DocumentDraft;
    use weft_storage::repository::DocumentRepository;

    async fn test_engine() -> (DocumentRepository, FullTextSearch, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ConnectionRegistry::open(dir.path()).await.unwrap());
        let repo = DocumentRepository::new(registry.clone());
        (repo, FullTextSearch::new(registry), dir)
    }

    fn filter(value: serde_json::Value) -> FilterSpec {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_search_matches_content() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("Rust ownership explained").with_id("d1"),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("Gardening for beginners").with_id("d2"),
        )
        .await
        .unwrap();

        let results = engine
            .search("acme", "docs", "ownership", 0, &FilterSpec::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "d1");
        assert_eq!(results[0].rank, 1);
    }

    #[tokio::test]
    async fn test_search_with_tag_filter_end_to_end() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("Advanced Python tutorial")
                .with_id("advanced")
                .with_tags(["python", "advanced"]),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("Python basics")
                .with_id("basics")
                .with_tags(["python", "beginner"]),
        )
        .await
        .unwrap();

        let results = engine
            .search("acme", "docs", "Python", 0, &filter(json!({"tag": "advanced"})))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "advanced");
    }

    #[tokio::test]
    async fn test_tag_filter_has_no_substring_false_positive() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("tutorial one")
                .with_id("js")
                .with_tags(["javascript"]),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("tutorial two")
                .with_id("jv")
                .with_tags(["java", "script"]),
        )
        .await
        .unwrap();

        // "java" must not match the document tagged only "javascript".
        let results = engine
            .search("acme", "docs", "tutorial", 0, &filter(json!({"tag": "java"})))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "jv");

        // Both listed tags must be present.
        let results = engine
            .search(
                "acme",
                "docs",
                "tutorial",
                0,
                &filter(json!({"tags": ["java", "script"]})),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "jv");

        let results = engine
            .search(
                "acme",
                "docs",
                "tutorial",
                0,
                &filter(json!({"tags": ["java", "python"]})),
            )
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_filter_type_fidelity() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("counted item")
                .with_id("d42")
                .with_metadata("count", 42),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("counted item")
                .with_id("d43")
                .with_metadata("count", 43),
        )
        .await
        .unwrap();

        let results = engine
            .search("acme", "docs", "counted", 0, &filter(json!({"count": 42})))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "d42");
    }

    #[tokio::test]
    async fn test_deleted_document_leaves_search_results() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("ephemeral entry").with_id("gone"),
        )
        .await
        .unwrap();

        let results = engine
            .search("acme", "docs", "ephemeral", 0, &FilterSpec::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);

        repo.delete("acme", "docs", "gone").await.unwrap();

        let results = engine
            .search("acme", "docs", "ephemeral", 0, &FilterSpec::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_limit_and_ranks() {
        let (repo, engine, _dir) = test_engine().await;

        for i in 0..5 {
            repo.store(
                "acme",
                "docs",
                DocumentDraft::new(format!("shared token, entry {i}")).with_id(format!("d{i}")),
            )
            .await
            .unwrap();
        }

        let results = engine
            .search("acme", "docs", "shared", 3, &FilterSpec::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        let ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        // bm25 orders ascending: each score no worse than the next.
        assert!(results.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let (repo, engine, _dir) = test_engine().await;
        repo.store("acme", "docs", DocumentDraft::new("x"))
            .await
            .unwrap();

        let err = engine
            .search("acme", "docs", "", 0, &FilterSpec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_unsafe_collection_name_is_rejected() {
        let (_repo, engine, _dir) = test_engine().await;

        let err = engine
            .search("acme", "docs; --", "q", 0, &FilterSpec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
    }
}
