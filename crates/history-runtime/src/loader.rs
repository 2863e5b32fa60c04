//! Concurrent batch loading.
//!
//! Every source is fetched on the blocking pool under its own timeout. The
//! outcomes are collected back in discovery order before any merging, so the
//! canonical sequence does not depend on which batch finished first.

use std::sync::Arc;
use std::time::Duration;

use history_core::error::{HistoryError, Result};
use history_data::normalizer::{load_batch, merge_all, BatchFailure, BatchOutcome, CanonicalHistory};
use history_data::reader::BatchSource;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Default per-batch load timeout in seconds.
pub const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 30;

// ── BatchLoader ───────────────────────────────────────────────────────────────

/// Fan-out / fan-in loader for a set of [`BatchSource`]s.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use history_runtime::loader::BatchLoader;
///
/// # async fn run() -> history_core::Result<()> {
/// let loader = BatchLoader::new(Duration::from_secs(30));
/// let history = loader.load_canonical(&[]).await?;
/// println!("{} events", history.events.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BatchLoader {
    /// Maximum time one batch may take before it is reported as failed.
    timeout: Duration,
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_BATCH_TIMEOUT_SECS))
    }
}

impl BatchLoader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load every source concurrently and return one outcome per source, in
    /// the order of `sources`.
    ///
    /// A slow, failing or panicking source only produces a failed outcome for
    /// itself.
    pub async fn load_all(&self, sources: &[Arc<dyn BatchSource>]) -> Vec<BatchOutcome> {
        let handles: Vec<(String, JoinHandle<BatchOutcome>)> = sources
            .iter()
            .map(|source| {
                let name = source.name().to_string();
                (name, self.spawn_one(Arc::clone(source)))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Loader task for batch {} failed: {}", name, e);
                    Err(BatchFailure {
                        cause: HistoryError::BatchTask(e.to_string()),
                        name,
                    })
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Load every source and merge the outcomes into the canonical history.
    pub async fn load_canonical(
        &self,
        sources: &[Arc<dyn BatchSource>],
    ) -> Result<CanonicalHistory> {
        info!("Loading {} history batches", sources.len());
        let outcomes = self.load_all(sources).await;
        let history = merge_all(outcomes)?;
        info!(
            "Loaded {} events from {} batches",
            history.events.len(),
            history.sources.len()
        );
        Ok(history)
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Spawn the fetch of one source. The timeout starts at spawn time.
    fn spawn_one(&self, source: Arc<dyn BatchSource>) -> JoinHandle<BatchOutcome> {
        let timeout = self.timeout;

        tokio::spawn(async move {
            let name = source.name().to_string();
            let fetch = tokio::task::spawn_blocking(move || load_batch(source.as_ref()));

            match tokio::time::timeout(timeout, fetch).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => Err(BatchFailure {
                    cause: HistoryError::BatchTask(e.to_string()),
                    name,
                }),
                Err(_) => {
                    warn!("Batch {} timed out after {:?}", name, timeout);
                    Err(BatchFailure {
                        cause: HistoryError::BatchTimeout {
                            name: name.clone(),
                            secs: timeout.as_secs(),
                        },
                        name,
                    })
                }
            }
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
