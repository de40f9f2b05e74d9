//! Brute-force vector similarity search.
//!
//! Scans every embedded row of a collection, decodes its vector, and scores
//! it against the query vector under the selected metric. All matches are
//! collected, sorted descending by score, truncated, and ranked. Rows that
//! fail to decode are skipped rather than aborting the scan.

use std::cmp::Ordering;
use std::sync::Arc;

use weft_core::document::{FilterSpec, Metric, SearchResult};
use weft_core::{Error, Result};
use weft_storage::filter::{bind_filter_args, compile_filter};
use weft_storage::registry::ConnectionRegistry;
use weft_storage::repository::{DOCUMENT_COLUMNS, document_from_row};
use weft_storage::schema::validate_identifier;

use crate::DEFAULT_LIMIT;

/// Linear-scan similarity search over a collection's embedded vectors.
#[derive(Debug, Clone)]
pub struct VectorSearch {
    registry: Arc<ConnectionRegistry>,
}

impl VectorSearch {
    /// Create a vector search engine over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Search a collection for the vectors most similar to `query_vector`
    /// under `metric`, constrained by the filter spec.
    ///
    /// A zero limit falls back to [`DEFAULT_LIMIT`]. Ranks are assigned
    /// 1-based in sorted order.
    pub async fn search(
        &self,
        tenant: &str,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
        metric: Metric,
        filters: &FilterSpec,
    ) -> Result<Vec<SearchResult>> {
        validate_identifier(collection)?;
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };

        let pool = self.registry.get(tenant).await?;
        let (fragment, args) = compile_filter(filters, "");

        let sql = format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM "{collection}"
            WHERE is_embedded = 1 AND vector IS NOT NULL{fragment}
            "#
        );

        let query_builder = bind_filter_args(sqlx::query(&sql), &args);
        let rows = query_builder
            .fetch_all(&pool)
            .await
            .map_err(Error::backend)?;

        let mut results = Vec::new();
        for row in &rows {
            let document = match document_from_row(row) {
                Ok(doc) => doc,
                Err(e) => {
                    log::warn!("skipping undecodable row in '{collection}': {e}");
                    continue;
                }
            };
            let Some(vector) = document.vector.as_deref() else {
                continue;
            };

            let score = metric.score(query_vector, vector);
            results.push(SearchResult {
                document,
                score,
                rank: 0,
            });
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(limit);

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

    async fn test_engine() -> (DocumentRepository, VectorSearch, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ConnectionRegistry::open(dir.path()).await.unwrap());
        let repo = DocumentRepository::new(registry.clone());
        (repo, VectorSearch::new(registry), dir)
    }

    /// A unit vector at the given cosine similarity to the query `[1, 0]`.
    fn at_cosine(c: f32) -> Vec<f32> {
        vec![c, (1.0 - c * c).sqrt()]
    }

    #[tokio::test]
    async fn test_cosine_ranking_order() {
        let (repo, engine, _dir) = test_engine().await;

        for (id, cos) in [("far", 0.1f32), ("near", 0.9), ("mid", 0.5)] {
            repo.store(
                "acme",
                "docs",
                DocumentDraft::new(format!("doc {id}"))
                    .with_id(id)
                    .with_vector(at_cosine(cos)),
            )
            .await
            .unwrap();
        }

        let results = engine
            .search(
                "acme",
                "docs",
                &[1.0, 0.0],
                2,
                Metric::Cosine,
                &FilterSpec::new(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.id, "near");
        assert_eq!(results[1].document.id, "mid");
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert!((results[0].score - 0.9).abs() < 1e-6);
        assert!((results[1].score - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_euclidean_higher_is_better() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("close")
                .with_id("close")
                .with_vector(vec![1.0, 1.0]),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("distant")
                .with_id("distant")
                .with_vector(vec![10.0, 10.0]),
        )
        .await
        .unwrap();

        let results = engine
            .search(
                "acme",
                "docs",
                &[1.0, 1.0],
                0,
                Metric::Euclidean,
                &FilterSpec::new(),
            )
            .await
            .unwrap();

        assert_eq!(results[0].document.id, "close");
        assert_eq!(results[0].score, 0.0); // exact match, negated distance
        assert!(results[1].score < 0.0);
    }

    #[tokio::test]
    async fn test_dot_product_metric() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("big").with_id("big").with_vector(vec![3.0, 0.0]),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("small")
                .with_id("small")
                .with_vector(vec![1.0, 0.0]),
        )
        .await
        .unwrap();

        let results = engine
            .search(
                "acme",
                "docs",
                &[2.0, 0.0],
                0,
                Metric::Dot,
                &FilterSpec::new(),
            )
            .await
            .unwrap();

        assert_eq!(results[0].document.id, "big");
        assert!((results[0].score - 6.0).abs() < 1e-9);
        assert!((results[1].score - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unrecognized_metric_name_defaults_to_cosine() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("only")
                .with_id("only")
                .with_vector(at_cosine(0.8)),
        )
        .await
        .unwrap();

        let results = engine
            .search(
                "acme",
                "docs",
                &[1.0, 0.0],
                0,
                Metric::parse("manhattan"),
                &FilterSpec::new(),
            )
            .await
            .unwrap();

        assert!((results[0].score - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unembedded_documents_are_excluded() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("embedded")
                .with_id("e")
                .with_vector(vec![1.0, 0.0]),
        )
        .await
        .unwrap();
        repo.store("acme", "docs", DocumentDraft::new("pending").with_id("p"))
            .await
            .unwrap();

        let results = engine
            .search(
                "acme",
                "docs",
                &[1.0, 0.0],
                0,
                Metric::Cosine,
                &FilterSpec::new(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "e");
    }

    #[tokio::test]
    async fn test_filter_constrains_scan() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("tagged")
                .with_id("tagged")
                .with_tag("keep")
                .with_vector(vec![1.0, 0.0]),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("untagged")
                .with_id("untagged")
                .with_vector(vec![1.0, 0.0]),
        )
        .await
        .unwrap();

        let filter: FilterSpec = serde_json::from_value(json!({"tag": "keep"})).unwrap();
        let results = engine
            .search("acme", "docs", &[1.0, 0.0], 0, Metric::Cosine, &filter)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "tagged");
    }

    #[tokio::test]
    async fn test_length_mismatch_scores_worst_not_error() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("matching length")
                .with_id("good")
                .with_vector(vec![1.0, 0.0]),
        )
        .await
        .unwrap();
        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("wrong length")
                .with_id("odd")
                .with_vector(vec![1.0, 0.0, 0.0]),
        )
        .await
        .unwrap();

        let results = engine
            .search(
                "acme",
                "docs",
                &[1.0, 0.0],
                0,
                Metric::Euclidean,
                &FilterSpec::new(),
            )
            .await
            .unwrap();

        // The mismatched row is still present, scored at maximal distance.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.id, "good");
        assert_eq!(results[1].document.id, "odd");
        assert_eq!(results[1].score, -f64::MAX);
    }

    #[tokio::test]
    async fn test_zero_norm_query_scores_zero_cosine() {
        let (repo, engine, _dir) = test_engine().await;

        repo.store(
            "acme",
            "docs",
            DocumentDraft::new("any")
                .with_id("any")
                .with_vector(vec![1.0, 2.0]),
        )
        .await
        .unwrap();

        let results = engine
            .search(
                "acme",
                "docs",
                &[0.0, 0.0],
                0,
                Metric::Cosine,
                &FilterSpec::new(),
            )
            .await
            .unwrap();

        assert_eq!(results[0].score, 0.0);
    }
}
