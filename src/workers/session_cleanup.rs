use crate::error::AppError;
use crate::storage::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug)]
pub struct SessionCleanupWorker {
    store: Arc<dyn SessionStore>,
    session_ttl_secs: u64,
    cleanup_interval_secs: u64,
}

impl SessionCleanupWorker {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, session_ttl_secs: u64, cleanup_interval_secs: u64) -> Self {
        Self { store, session_ttl_secs, cleanup_interval_secs }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        if self.cleanup_interval_secs == 0 {
            tracing::info!("Session cleanup is disabled (interval = 0)");
            return;
        }

        let mut interval = tokio::time::interval(Duration::from_secs(self.cleanup_interval_secs));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.perform_cleanup()
                        .instrument(tracing::info_span!("run_session_cleanup"))
                        .await
                    {
                        tracing::error!(error = ?e, "Session cleanup iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Session cleanup loop shutting down...");
    }

    /// Evicts sessions idle for longer than the session TTL.
    ///
    /// # Errors
    /// Returns an error if the session store cannot be pruned.
    #[tracing::instrument(skip(self), err, fields(evicted = tracing::field::Empty))]
    pub async fn perform_cleanup(&self) -> Result<usize, AppError> {
        tracing::debug!("Running session cleanup...");

        let count = self.store.evict_idle(self.session_ttl_secs).await?;
        if count > 0 {
            tracing::info!(count = %count, "Evicted idle sessions");
            tracing::Span::current().record("evicted", count);
        }

        Ok(count)
    }
}
