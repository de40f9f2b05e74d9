//! Weft — multi-tenant document store with full-text and vector search.
//!
//! This umbrella crate re-exports the component crates and provides
//! [`DocumentService`], the façade an HTTP or CLI layer calls with
//! validated arguments.
//!
//! # Components
//!
//! - [`weft_core`]: types, errors, vector codec, similarity metrics
//! - [`weft_storage`]: connection registry, schema, repository, filters
//! - [`weft_search`]: full-text and vector search engines
//! - [`weft_embed`]: embedding provider and backfill scheduler

#![doc = include_str!("../README.md")]

pub mod service;

pub use service::DocumentService;

pub use weft_core::{
    Document, DocumentDraft, Error, FilterSpec, Metric, Result, SchedulerConfig, SearchResult,
    StorageConfig, TenantInfo,
};
pub use weft_embed::{EmbeddingProvider, EmbeddingScheduler, SchedulerHandle, StubEmbedder};
pub use weft_search::{FullTextSearch, VectorSearch};
pub use weft_storage::{ConnectionRegistry, DocumentRepository};
