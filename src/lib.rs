#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod storage;
pub mod telemetry;
pub mod workers;

use crate::adapters::spotify::{ProviderClient, SpotifyClient};
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::auth_service::AuthService;
use crate::services::playlist_service::PlaylistService;
use crate::storage::{InMemorySessionStore, SessionStore};
use crate::workers::SessionCleanupWorker;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Fully wired application: request-facing services plus background workers.
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub workers: Workers,
}

#[derive(Debug)]
pub struct Workers {
    session_cleanup: SessionCleanupWorker,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![tokio::spawn(self.session_cleanup.run(shutdown_rx))]
    }
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    provider: Option<Arc<dyn ProviderClient>>,
    session_store: Option<Arc<dyn SessionStore>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, provider: None, session_store: None }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ProviderClient>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Wires services together, defaulting to the Spotify client and an in-memory session store.
    ///
    /// # Errors
    /// Returns an error if the Spotify client cannot be constructed from the configuration.
    pub fn build(self) -> anyhow::Result<App> {
        let provider: Arc<dyn ProviderClient> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(SpotifyClient::new(self.config.spotify.clone())?),
        };
        let session_store: Arc<dyn SessionStore> =
            self.session_store.unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));

        let auth_service = AuthService::new(self.config.spotify.clone(), Arc::clone(&provider));
        let playlist_service = PlaylistService::new(provider, self.config.spotify.playlist_name_filter.clone());

        let session_cleanup = SessionCleanupWorker::new(
            Arc::clone(&session_store),
            self.config.session.ttl_secs,
            self.config.session.cleanup_interval_secs,
        );

        Ok(App {
            services: ServiceContainer { auth_service, playlist_service, session_store },
            workers: Workers { session_cleanup },
        })
    }
}

/// Flips `shutdown_tx` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received, draining...");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(location = %location, panic = %payload, "Thread panicked");
    }));
}
