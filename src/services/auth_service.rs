use crate::adapters::spotify::{self, ProviderClient};
use crate::config::SpotifyConfig;
use crate::domain::session::Session;
use crate::domain::token::{TokenState, classify};
use crate::error::{AppError, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use reqwest::Url;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    exchange_total: Counter<u64>,
    refresh_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("qualm-relay");
        Self {
            exchange_total: meter
                .u64_counter("oauth_code_exchange_total")
                .with_description("Authorization code exchanges by outcome")
                .build(),
            refresh_total: meter
                .u64_counter("oauth_token_refresh_total")
                .with_description("Refresh token exchanges by outcome")
                .build(),
        }
    }
}

/// Token info returned to the browser after a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

/// Access token currently held by a session after `refresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentToken {
    pub access_token: String,
    pub expires_at: i64,
    pub refreshed: bool,
}

#[derive(Clone, Debug)]
pub struct AuthService {
    config: SpotifyConfig,
    provider: Arc<dyn ProviderClient>,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(config: SpotifyConfig, provider: Arc<dyn ProviderClient>) -> Self {
        Self { config, provider, metrics: Metrics::new() }
    }

    /// URL of the provider consent screen.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the configured authorization URL is malformed.
    pub fn login_url(&self) -> Result<Url> {
        spotify::authorize_url(&self.config)
    }

    /// Exchanges `code` and stores the resulting token pair in `session`.
    ///
    /// `session` is only modified when the exchange succeeds.
    ///
    /// # Errors
    /// Propagates provider failures; see [`ProviderClient::exchange_code`].
    #[tracing::instrument(skip_all, err(level = "warn"))]
    pub async fn complete_authorization(&self, session: &mut Session, code: &str, now: i64) -> Result<IssuedTokens> {
        let grant = match self.provider.exchange_code(code).await {
            Ok(grant) => grant,
            Err(e) => {
                self.metrics.exchange_total.add(1, &[KeyValue::new("outcome", "error")]);
                return Err(e);
            }
        };

        session.apply_grant(grant, now);
        self.metrics.exchange_total.add(1, &[KeyValue::new("outcome", "ok")]);
        tracing::info!("Authorization code exchanged");

        issued_tokens(session)
    }

    /// Refreshes the access token held by `session` if it has expired.
    ///
    /// A still-valid token is returned as-is without contacting the provider.
    ///
    /// # Errors
    /// - `AppError::ReauthRequired` when the session holds no refresh token.
    /// - Provider failures; see [`ProviderClient::refresh`].
    #[tracing::instrument(skip_all, err(level = "warn"), fields(refreshed = tracing::field::Empty))]
    pub async fn refresh(&self, session: &mut Session, now: i64) -> Result<CurrentToken> {
        let refresh_token = session.refresh_token.clone().ok_or(AppError::ReauthRequired)?;

        if classify(session, now) == TokenState::Valid {
            tracing::Span::current().record("refreshed", false);
            return current_token(session, false);
        }

        let grant = match self.provider.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                self.metrics.refresh_total.add(1, &[KeyValue::new("outcome", "error")]);
                return Err(e);
            }
        };

        session.apply_grant(grant, now);
        self.metrics.refresh_total.add(1, &[KeyValue::new("outcome", "ok")]);
        tracing::Span::current().record("refreshed", true);
        tracing::info!("Access token refreshed");

        current_token(session, true)
    }
}

fn issued_tokens(session: &Session) -> Result<IssuedTokens> {
    match (&session.access_token, session.expires_at) {
        (Some(access_token), Some(expires_at)) => Ok(IssuedTokens {
            access_token: access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at,
        }),
        _ => Err(AppError::Internal),
    }
}

fn current_token(session: &Session, refreshed: bool) -> Result<CurrentToken> {
    match (&session.access_token, session.expires_at) {
        (Some(access_token), Some(expires_at)) => {
            Ok(CurrentToken { access_token: access_token.clone(), expires_at, refreshed })
        }
        _ => Err(AppError::Internal),
    }
}
