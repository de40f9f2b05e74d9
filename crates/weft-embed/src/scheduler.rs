//! Rate-limited background embedding scheduler.
//!
//! A single cooperative task that loops on a fixed interval: each cycle
//! discovers every tenant and collection, fetches unembedded documents
//! oldest-first up to a global per-cycle cap shared across all tenants, and
//! drives them through the embedding provider under a per-document timeout.
//! One bad document or one embedding-service blip never aborts a cycle; the
//! failure is logged and the cycle moves on.
//!
//! The stop signal is observed at the top of each wait — a running cycle
//! completes, but no new cycle starts after stop. The scheduler shares the
//! same storage connections as foreground requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use weft_core::config::SchedulerConfig;
use weft_storage::repository::DocumentRepository;

use crate::provider::EmbeddingProvider;

/// Background loop that backfills missing embeddings.
pub struct EmbeddingScheduler {
    repository: Arc<DocumentRepository>,
    provider: Arc<dyn EmbeddingProvider>,
    config: SchedulerConfig,
}

/// Control handle for a started scheduler.
///
/// Dropping the handle also stops the loop; [`stop`](SchedulerHandle::stop)
/// additionally waits for the task to finish.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Whether a background task was actually spawned.
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Signal the scheduler to stop and wait for it to finish.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl EmbeddingScheduler {
    /// Create a scheduler over the given repository and provider.
    pub fn new(
        repository: Arc<DocumentRepository>,
        provider: Arc<dyn EmbeddingProvider>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            repository,
            provider,
            config,
        }
    }

    /// Start the background loop.
    ///
    /// When the config disables the scheduler, no task is spawned and the
    /// returned handle is inert.
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        if !self.config.enabled {
            log::info!("background embedding scheduler is disabled by configuration");
            return SchedulerHandle {
                stop_tx,
                task: None,
            };
        }

        let interval = Duration::from_secs(self.config.interval_secs);
        let task = tokio::spawn(async move {
            log::info!("background embedding scheduler started");
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => {
                        log::info!("background embedding scheduler stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        self.run_cycle().await;
                    }
                }
            }
        });

        SchedulerHandle {
            stop_tx,
            task: Some(task),
        }
    }

    /// Run one embedding cycle and return the number of documents
    /// processed.
    ///
    /// Every fetched document counts against the cycle cap whether or not
    /// its embedding succeeds, bounding per-cycle embedding-service load.
    pub async fn run_cycle(&self) -> usize {
        let tenants = match self.repository.list_tenants().await {
            Ok(tenants) => tenants,
            Err(e) => {
                log::warn!("embedding cycle could not list tenants: {e}");
                return 0;
            }
        };

        let cap = self.config.cycle_cap;
        let embed_timeout = Duration::from_secs(self.config.embed_timeout_secs);
        let mut processed = 0;

        log::debug!("embedding cycle checking {} tenants", tenants.len());

        'tenants: for tenant in &tenants {
            if processed >= cap {
                break;
            }

            let collections = match self.repository.list_collections(tenant).await {
                Ok(collections) => collections,
                Err(e) => {
                    log::warn!("embedding cycle could not list collections in '{tenant}': {e}");
                    continue;
                }
            };

            for collection in &collections {
                if processed >= cap {
                    break 'tenants;
                }
                let remaining = cap - processed;

                let docs = match self
                    .repository
                    .list_unembedded(tenant, collection, remaining)
                    .await
                {
                    Ok(docs) => docs,
                    Err(e) => {
                        log::warn!(
                            "embedding cycle could not list unembedded documents in \
                             '{tenant}.{collection}': {e}"
                        );
                        continue;
                    }
                };

                if docs.is_empty() {
                    continue;
                }
                log::debug!(
                    "embedding {} documents from '{tenant}.{collection}'",
                    docs.len()
                );

                for doc in docs {
                    processed += 1;

                    let vector =
                        match tokio::time::timeout(embed_timeout, self.provider.embed(&doc.content))
                            .await
                        {
                            Ok(Ok(vector)) => vector,
                            Ok(Err(e)) => {
                                log::warn!(
                                    "failed to embed document {} in '{tenant}.{collection}': {e}",
                                    doc.id
                                );
                                continue;
                            }
                            Err(_) => {
                                log::warn!(
                                    "embedding timed out for document {} in '{tenant}.{collection}'",
                                    doc.id
                                );
                                continue;
                            }
                        };

                    if vector.len() != self.provider.dimension() {
                        log::warn!(
                            "embedding dimension mismatch for document {}: expected {}, got {}",
                            doc.id,
                            self.provider.dimension(),
                            vector.len()
                        );
                        continue;
                    }

                    if let Err(e) = self
                        .repository
                        .update_vector(tenant, collection, &doc.id, &vector)
                        .await
                    {
                        log::warn!(
                            "failed to persist vector for document {} in '{tenant}.{collection}': {e}",
                            doc.id
                        );
                    }
                }
            }
        }

        if processed > 0 {
            log::info!("embedding cycle processed {processed} documents");
        } else {
            log::debug!("embedding cycle found no documents to process");
        }
        processed
    }
}

// ============================================================================
// Tests
// ============================================================================
