//! Document CRUD, listing, and tenant aggregates.
//!
//! The repository owns every storage encoding: metadata as a JSON blob,
//! tags joined with `,`, vectors as little-endian f32 blobs, and the
//! `is_embedded` flag kept in lockstep with vector presence. Collection
//! names are validated before any query is constructed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Map;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;
use weft_core::document::{Document, DocumentDraft, TenantInfo};
use weft_core::vector::{decode_vector, encode_vector};
use weft_core::{Error, Result};

use crate::registry::ConnectionRegistry;
use crate::schema::{ensure_collection, validate_identifier};

/// The column list shared by every document SELECT.
pub const DOCUMENT_COLUMNS: &str =
    "id, content, metadata, tags, vector, created_at, updated_at, is_embedded";

/// CRUD and listing operations on collections within tenants.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    registry: Arc<ConnectionRegistry>,
}

impl DocumentRepository {
    /// Create a repository over the given connection registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Store a document, provisioning the collection on first write.
    ///
    /// Assigns a random id when the draft carries none and upserts by id:
    /// on conflict, content, metadata, tags, vector, `updated_at`, and
    /// `is_embedded` are replaced while the stored `created_at` is
    /// preserved. Returns the document as written.
    pub async fn store(
        &self,
        tenant: &str,
        collection: &str,
        draft: DocumentDraft,
    ) -> Result<Document> {
        if draft.content.is_empty() {
            return Err(Error::validation("content is required"));
        }

        let pool = self.registry.get(tenant).await?;
        ensure_collection(&pool, collection).await?;

        let id = draft
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now();

        let metadata_json =
            serde_json::to_string(&draft.metadata).map_err(Error::encoding)?;
        let tags_str = draft.tags.join(",");
        let vector = draft.vector.filter(|v| !v.is_empty());
        let vector_bytes = vector.as_deref().map(encode_vector);
        let is_embedded = vector.is_some();

        let sql = format!(
            r#"
            INSERT INTO "{collection}"
                (id, content, metadata, tags, vector, created_at, updated_at, is_embedded)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                metadata = excluded.metadata,
                tags = excluded.tags,
                vector = excluded.vector,
                updated_at = excluded.updated_at,
                is_embedded = excluded.is_embedded
            "#
        );

        sqlx::query(&sql)
            .bind(&id)
            .bind(&draft.content)
            .bind(&metadata_json)
            .bind(&tags_str)
            .bind(&vector_bytes)
            .bind(now)
            .bind(now)
            .bind(i64::from(is_embedded))
            .execute(&pool)
            .await
            .map_err(Error::backend)?;

        Ok(Document {
            id,
            content: draft.content,
            metadata: draft.metadata,
            tags: draft.tags,
            vector,
            created_at: now,
            updated_at: now,
            is_embedded,
        })
    }

    /// Fetch a document by id.
    pub async fn get(&self, tenant: &str, collection: &str, id: &str) -> Result<Document> {
        validate_identifier(collection)?;
        let pool = self.registry.get(tenant).await?;

        let sql =
            format!(r#"SELECT {DOCUMENT_COLUMNS} FROM "{collection}" WHERE id = ?"#);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(Error::backend)?;

        match row {
            Some(row) => document_from_row(&row),
            None => Err(Error::not_found(format!("document not found: {id}"))),
        }
    }

    /// Delete a document by id.
    pub async fn delete(&self, tenant: &str, collection: &str, id: &str) -> Result<()> {
        validate_identifier(collection)?;
        let pool = self.registry.get(tenant).await?;

        let sql = format!(r#"DELETE FROM "{collection}" WHERE id = ?"#);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(Error::backend)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("document not found: {id}")));
        }
        Ok(())
    }

    /// List documents newest-first with pagination.
    pub async fn list(
        &self,
        tenant: &str,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>> {
        validate_identifier(collection)?;
        let pool = self.registry.get(tenant).await?;

        let sql = format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM "{collection}"
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&pool)
            .await
            .map_err(Error::backend)?;

        rows.iter().map(document_from_row).collect()
    }

    /// List up to `limit` documents without an embedding, oldest first, for
    /// scheduler consumption.
    pub async fn list_unembedded(
        &self,
        tenant: &str,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<Document>> {
        validate_identifier(collection)?;
        let pool = self.registry.get(tenant).await?;

        let sql = format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM "{collection}"
            WHERE is_embedded = 0
            ORDER BY created_at ASC
            LIMIT ?
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(&pool)
            .await
            .map_err(Error::backend)?;

        rows.iter().map(document_from_row).collect()
    }

    /// Write only a document's vector, marking it embedded and refreshing
    /// `updated_at`. No other field changes.
    pub async fn update_vector(
        &self,
        tenant: &str,
        collection: &str,
        id: &str,
        vector: &[f32],
    ) -> Result<()> {
        validate_identifier(collection)?;
        if vector.is_empty() {
            return Err(Error::validation("vector is required"));
        }
        let pool = self.registry.get(tenant).await?;

        let sql = format!(
            r#"UPDATE "{collection}" SET vector = ?, is_embedded = 1, updated_at = ? WHERE id = ?"#
        );

        let result = sqlx::query(&sql)
            .bind(encode_vector(vector))
            .bind(Utc::now())
            .bind(id)
            .execute(&pool)
            .await
            .map_err(Error::backend)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("document not found: {id}")));
        }
        Ok(())
    }

    /// List collection names in a tenant, excluding shadow-index and
    /// engine-internal tables.
    pub async fn list_collections(&self, tenant: &str) -> Result<Vec<String>> {
        let pool = self.registry.get(tenant).await?;

        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE '%_fts%'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&pool)
        .await
        .map_err(Error::backend)?;

        Ok(names)
    }

    /// List all known tenants.
    pub async fn list_tenants(&self) -> Result<Vec<String>> {
        self.registry.list().await
    }

    /// Aggregate document statistics across every collection of a tenant,
    /// plus the tenant's on-disk size.
    pub async fn tenant_info(&self, tenant: &str) -> Result<TenantInfo> {
        let pool = self.registry.get(tenant).await?;
        let collections = self.list_collections(tenant).await?;

        let mut document_count = 0u64;
        let mut embedded_count = 0u64;
        let mut created_at: Option<DateTime<Utc>> = None;
        let mut last_updated: Option<DateTime<Utc>> = None;

        for collection in &collections {
            let sql = format!(
                r#"
                SELECT
                    COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN is_embedded = 1 THEN 1 ELSE 0 END), 0) AS embedded,
                    MIN(created_at) AS first_created,
                    MAX(updated_at) AS last_updated
                FROM "{collection}"
                "#
            );

            let row = sqlx::query(&sql)
                .fetch_one(&pool)
                .await
                .map_err(Error::backend)?;

            let total: i64 = row.try_get("total").map_err(Error::backend)?;
            let embedded: i64 = row.try_get("embedded").map_err(Error::backend)?;
            let first: Option<DateTime<Utc>> =
                row.try_get("first_created").map_err(Error::backend)?;
            let last: Option<DateTime<Utc>> =
                row.try_get("last_updated").map_err(Error::backend)?;

            document_count += total as u64;
            embedded_count += embedded as u64;
            created_at = min_opt(created_at, first);
            last_updated = max_opt(last_updated, last);
        }

        let size_bytes = tokio::fs::metadata(self.registry.tenant_path(tenant))
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(TenantInfo {
            name: tenant.to_string(),
            document_count,
            embedded_count,
            created_at,
            last_updated,
            size_bytes,
        })
    }
}

fn min_opt<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_opt<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Decode a document row produced by a `SELECT` over [`DOCUMENT_COLUMNS`].
///
/// Shared with the search engines, which select the same columns.
pub fn document_from_row(row: &SqliteRow) -> Result<Document> {
    let metadata_json: Option<String> = row.try_get("metadata").map_err(Error::backend)?;
    let tags_str: Option<String> = row.try_get("tags").map_err(Error::backend)?;
    let vector_bytes: Option<Vec<u8>> = row.try_get("vector").map_err(Error::backend)?;
    let is_embedded: i64 = row.try_get("is_embedded").map_err(Error::backend)?;

    let metadata: Map<String, serde_json::Value> = match metadata_json.as_deref() {
        None | Some("") => Map::new(),
        Some(json) => serde_json::from_str(json).map_err(Error::encoding)?,
    };

    let tags: Vec<String> = match tags_str.as_deref() {
        None | Some("") => Vec::new(),
        Some(joined) => joined.split(',').map(str::to_string).collect(),
    };

    let vector = vector_bytes
        .filter(|bytes| !bytes.is_empty())
        .map(|bytes| decode_vector(&bytes));

    Ok(Document {
        id: row.try_get("id").map_err(Error::backend)?,
        content: row.try_get("content").map_err(Error::backend)?,
        metadata,
        tags,
        vector,
        created_at: row.try_get("created_at").map_err(Error::backend)?,
        updated_at: row.try_get("updated_at").map_err(Error::backend)?,
        is_embedded: is_embedded != 0,
    })
}

// ============================================================================
// Tests
// ============================================================================
