//! Embedding provider trait and stub implementation.
//!
//! This module defines the `EmbeddingProvider` trait that abstracts over
//! embedding generation backends. A live backend (llama.cpp, OpenAI, etc.)
//! lives outside the core; the [`StubEmbedder`] here supports environments
//! without one.

use async_trait::async_trait;
use weft_core::Result;

/// Trait for converting text to a fixed-dimension embedding vector.
///
/// The trait requires `Send + Sync` so a provider can be shared between
/// foreground request handling and the background scheduler. Callers must
/// validate a provider's [`dimension`](EmbeddingProvider::dimension) against
/// their configured dimensionality before trusting its output.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    /// Backends with native batching should override this.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The fixed output dimension of this provider.
    fn dimension(&self) -> usize;

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// Default stub dimension, matching the embedding size the store was
/// originally deployed against.
pub const STUB_DIMENSION: usize = 2560;

/// A placeholder provider that returns a fixed-value vector.
///
/// Every call yields the same vector of `0.1`s, so documents flow through
/// the embedding lifecycle (flagging, scheduling, vector persistence)
/// without a live embedding backend.
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    /// Create a stub with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(STUB_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1; self.dimension])
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "stub"
    }
}

// ============================================================================
// Tests
// ============================================================================
