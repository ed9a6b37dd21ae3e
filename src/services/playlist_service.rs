use crate::adapters::spotify::ProviderClient;
use crate::domain::playlist::Playlist;
use crate::domain::session::Session;
use crate::domain::token::require_valid;
use crate::error::{AppError, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    lookups_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("qualm-relay");
        Self {
            lookups_total: meter
                .u64_counter("playlist_lookups_total")
                .with_description("Playlist lookups by result")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlaylistService {
    provider: Arc<dyn ProviderClient>,
    name_filter: String,
    metrics: Metrics,
}

impl PlaylistService {
    #[must_use]
    pub fn new(provider: Arc<dyn ProviderClient>, name_filter: String) -> Self {
        Self { provider, name_filter, metrics: Metrics::new() }
    }

    /// Finds the first playlist of the session's user whose name contains the configured filter.
    ///
    /// # Errors
    /// - Auth-state errors from [`require_valid`] when the session cannot call the provider.
    /// - `AppError::NotFound` when no playlist matches.
    /// - Provider failures; see [`ProviderClient::list_playlists`].
    #[tracing::instrument(skip_all, err(level = "debug"), fields(filter = %self.name_filter))]
    pub async fn find_playlist(&self, session: &Session, now: i64) -> Result<Playlist> {
        let access_token = require_valid(session, now)?;
        let page = self.provider.list_playlists(access_token).await?;

        if let Some(playlist) = page.find_by_name(&self.name_filter) {
            tracing::info!(playlist = %playlist.name, "Playlist found");
            self.metrics.lookups_total.add(1, &[KeyValue::new("result", "found")]);
            return Ok(playlist.clone());
        }

        tracing::info!(scanned = page.items.len(), "Playlist not found");
        self.metrics.lookups_total.add(1, &[KeyValue::new("result", "not_found")]);
        Err(AppError::NotFound(format!("{} playlist could not be found", self.name_filter)))
    }
}
