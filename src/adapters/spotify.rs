use crate::config::SpotifyConfig;
use crate::domain::playlist::PlaylistPage;
use crate::domain::token::TokenGrant;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Outbound calls to the OAuth provider. Every call is a single request with no retry.
#[async_trait]
pub trait ProviderClient: Send + Sync + std::fmt::Debug {
    /// Exchanges an authorization code for a token pair.
    ///
    /// # Errors
    /// `AppError::Provider` on a non-2xx answer, `AppError::ProviderTimeout` on timeout and
    /// `AppError::BadRequest` when the answer lacks the expected fields.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant>;

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Errors
    /// Same as [`ProviderClient::exchange_code`].
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;

    /// Lists the playlists of the user owning `access_token`.
    ///
    /// # Errors
    /// `AppError::Provider` on a non-2xx answer or an unreadable body, `AppError::ProviderTimeout` on timeout.
    async fn list_playlists(&self, access_token: &str) -> Result<PlaylistPage>;
}

/// Builds the consent screen URL the user is sent to on login.
///
/// # Errors
/// Returns `AppError::Internal` if the configured authorization URL is not a valid URL.
pub fn authorize_url(config: &SpotifyConfig) -> Result<Url> {
    let mut params = vec![
        ("client_id", config.client_id.as_str()),
        ("response_type", "code"),
        ("scope", config.scope.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];
    if config.show_dialog {
        params.push(("show_dialog", "true"));
    }

    Url::parse_with_params(&config.auth_url, &params).map_err(|e| {
        tracing::error!(error = %e, url = %config.auth_url, "Invalid authorization URL");
        AppError::Internal
    })
}

/// Raw token endpoint answer. Fields are optional so that a malformed answer can be reported
/// instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_grant(self) -> Result<TokenGrant> {
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("Token response is missing access_token".to_string()))?;
        let expires_in = self
            .expires_in
            .ok_or_else(|| AppError::BadRequest("Token response is missing expires_in".to_string()))?;

        Ok(TokenGrant { access_token, refresh_token: self.refresh_token.filter(|t| !t.is_empty()), expires_in })
    }
}

#[derive(Clone, Debug)]
pub struct SpotifyClient {
    http: reqwest::Client,
    config: SpotifyConfig,
    playlists_url: Url,
}

impl SpotifyClient {
    /// # Errors
    /// Returns `AppError::Internal` if the HTTP client cannot be built or the API base URL is invalid.
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to build HTTP client");
                AppError::Internal
            })?;

        let playlists_url = Url::parse(&config.api_base_url).and_then(|base| base.join("me/playlists")).map_err(|e| {
            tracing::error!(error = %e, url = %config.api_base_url, "Invalid API base URL");
            AppError::Internal
        })?;

        Ok(Self { http, config, playlists_url })
    }

    async fn post_token_form(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let response = self.http.post(&self.config.token_url).form(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "Token endpoint returned a body that is not a token response");
            AppError::BadRequest("Token response could not be parsed".to_string())
        })?;
        parsed.into_grant()
    }
}

#[async_trait]
impl ProviderClient for SpotifyClient {
    #[tracing::instrument(skip_all, err(level = "warn"))]
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        self.post_token_form(&[
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ])
        .await
    }

    #[tracing::instrument(skip_all, err(level = "warn"))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.post_token_form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ])
        .await
    }

    #[tracing::instrument(skip_all, err(level = "warn"))]
    async fn list_playlists(&self, access_token: &str) -> Result<PlaylistPage> {
        let response = self.http.get(self.playlists_url.clone()).bearer_auth(access_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| AppError::Provider {
            status: status.as_u16(),
            message: format!("Unexpected playlist response: {e}"),
        })
    }
}

/// Maps a non-2xx answer to `AppError::Provider`, keeping the most specific message available.
///
/// The accounts service answers `{"error": "...", "error_description": "..."}` while the Web API
/// answers `{"error": {"status": 401, "message": "..."}}`.
fn provider_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|v| match &v["error"] {
        Value::String(code) => Some(
            v["error_description"].as_str().map_or_else(|| code.clone(), |desc| format!("{code}: {desc}")),
        ),
        Value::Object(obj) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    });

    AppError::Provider {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| format!("Spotify returned status {}", status.as_u16())),
    }
}
