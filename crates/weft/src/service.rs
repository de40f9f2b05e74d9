//! The document service façade.
//!
//! Wires the connection registry, repository, both search engines, and the
//! embedding provider into the single surface an HTTP or CLI layer consumes.
//! No wire format is mandated here; operations take and return the types
//! from `weft-core`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use weft::{DocumentDraft, DocumentService, FilterSpec, StubEmbedder};
//!
//! let service = DocumentService::open("./data", Arc::new(StubEmbedder::default())).await?;
//!
//! service.store("acme", "notes",
//!     DocumentDraft::new("Advanced Python tutorial")
//!         .with_tags(["python", "advanced"])).await?;
//!
//! let hits = service.search_fulltext(
//!     "acme", "notes", "python", 10,
//!     &FilterSpec::new().with_tag("advanced")).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use weft_core::document::{Document, DocumentDraft, FilterSpec, Metric, SearchResult, TenantInfo};
use weft_core::{Error, Result, SchedulerConfig};
use weft_embed::provider::EmbeddingProvider;
use weft_embed::scheduler::{EmbeddingScheduler, SchedulerHandle};
use weft_search::fulltext::FullTextSearch;
use weft_search::vector::VectorSearch;
use weft_storage::registry::ConnectionRegistry;
use weft_storage::repository::DocumentRepository;

/// Default timeout for a single embedding call made on behalf of a
/// foreground operation.
const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// The full document store behind one call surface.
pub struct DocumentService {
    registry: Arc<ConnectionRegistry>,
    repository: Arc<DocumentRepository>,
    fulltext: FullTextSearch,
    vector: VectorSearch,
    provider: Arc<dyn EmbeddingProvider>,
    embed_timeout: Duration,
}

impl DocumentService {
    /// Open a service rooted at the given data directory.
    pub async fn open(
        data_dir: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let registry = Arc::new(ConnectionRegistry::open(data_dir).await?);
        let repository = Arc::new(DocumentRepository::new(registry.clone()));

        Ok(Self {
            fulltext: FullTextSearch::new(registry.clone()),
            vector: VectorSearch::new(registry.clone()),
            registry,
            repository,
            provider,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        })
    }

    /// Override the foreground embedding timeout.
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// The underlying repository, for callers that need direct access
    /// (e.g. constructing a scheduler separately).
    pub fn repository(&self) -> &Arc<DocumentRepository> {
        &self.repository
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    /// Store a document. Unembedded documents are picked up later by the
    /// background scheduler.
    pub async fn store(
        &self,
        tenant: &str,
        collection: &str,
        draft: DocumentDraft,
    ) -> Result<Document> {
        self.repository.store(tenant, collection, draft).await
    }

    /// Store a document, embedding its content synchronously first.
    pub async fn store_embedded(
        &self,
        tenant: &str,
        collection: &str,
        mut draft: DocumentDraft,
    ) -> Result<Document> {
        if draft.content.is_empty() {
            return Err(Error::validation("content is required"));
        }
        draft.vector = Some(self.embed_text(&draft.content).await?);
        self.repository.store(tenant, collection, draft).await
    }

    /// Fetch a document by id.
    pub async fn get(&self, tenant: &str, collection: &str, id: &str) -> Result<Document> {
        self.repository.get(tenant, collection, id).await
    }

    /// Delete a document by id.
    pub async fn delete(&self, tenant: &str, collection: &str, id: &str) -> Result<()> {
        self.repository.delete(tenant, collection, id).await
    }

    /// List documents newest-first with pagination.
    pub async fn list(
        &self,
        tenant: &str,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>> {
        self.repository.list(tenant, collection, limit, offset).await
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Ranked full-text search over a collection.
    pub async fn search_fulltext(
        &self,
        tenant: &str,
        collection: &str,
        query: &str,
        limit: usize,
        filters: &FilterSpec,
    ) -> Result<Vec<SearchResult>> {
        self.fulltext
            .search(tenant, collection, query, limit, filters)
            .await
    }

    /// Vector similarity search: the query text is embedded, then scanned
    /// against the collection's stored vectors.
    pub async fn search_vector(
        &self,
        tenant: &str,
        collection: &str,
        query: &str,
        limit: usize,
        metric: Metric,
        filters: &FilterSpec,
    ) -> Result<Vec<SearchResult>> {
        let query_vector = self.embed_text(query).await?;
        self.vector
            .search(tenant, collection, &query_vector, limit, metric, filters)
            .await
    }

    /// Vector similarity search with a caller-supplied query vector.
    pub async fn search_vector_raw(
        &self,
        tenant: &str,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
        metric: Metric,
        filters: &FilterSpec,
    ) -> Result<Vec<SearchResult>> {
        self.vector
            .search(tenant, collection, query_vector, limit, metric, filters)
            .await
    }

    // ------------------------------------------------------------------------
    // Tenants and collections
    // ------------------------------------------------------------------------

    /// List all known tenants.
    pub async fn list_tenants(&self) -> Result<Vec<String>> {
        self.registry.list().await
    }

    /// Aggregate statistics for a tenant.
    pub async fn tenant_info(&self, tenant: &str) -> Result<TenantInfo> {
        self.repository.tenant_info(tenant).await
    }

    /// Delete a tenant and its storage.
    pub async fn delete_tenant(&self, tenant: &str) -> Result<()> {
        self.registry.delete(tenant).await
    }

    /// List collection names in a tenant.
    pub async fn list_collections(&self, tenant: &str) -> Result<Vec<String>> {
        self.repository.list_collections(tenant).await
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Start the background embedding scheduler over this service's
    /// repository and provider.
    pub fn start_scheduler(&self, config: SchedulerConfig) -> SchedulerHandle {
        EmbeddingScheduler::new(self.repository.clone(), self.provider.clone(), config).start()
    }

    /// Close every cached tenant connection. Called once at shutdown.
    pub async fn close(&self) {
        self.registry.close_all().await;
    }

    /// Embed text under the foreground timeout and validate the result
    /// against the provider's declared dimension.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let vector = tokio::time::timeout(self.embed_timeout, self.provider.embed(text))
            .await
            .map_err(|_| Error::embedding("embedding call timed out"))??;

        if vector.len() != self.provider.dimension() {
            return Err(Error::embedding(format!(
                "expected embedding dimension {}, got {}",
                self.provider.dimension(),
                vector.len()
            )));
        }
        Ok(vector)
    }
}

// ============================================================================
// Tests
// ============================================================================
