use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub const LOGIN_PATH: &str = "/login";
pub const REFRESH_PATH: &str = "/refresh-token";

/// Seconds a client should wait before retrying after a provider timeout.
const RETRY_AFTER_SECS: &str = "5";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    AuthRequired,
    #[error("Access token expired")]
    RefreshRequired,
    #[error("Access token expired and no refresh token is available")]
    ReauthRequired,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("Provider request timed out")]
    ProviderTimeout,
    #[error("Session error: {0}")]
    Session(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::ProviderTimeout;
        }
        let status = e.status().map_or(StatusCode::BAD_GATEWAY.as_u16(), |s| s.as_u16());
        Self::Provider { status, message: format!("Provider request failed: {e}") }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn redirect(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::AuthRequired => {
                tracing::debug!("No access token in session, redirecting to login");
                return redirect(LOGIN_PATH);
            }
            Self::ReauthRequired => {
                tracing::debug!("No refresh token in session, redirecting to login");
                return redirect(LOGIN_PATH);
            }
            Self::RefreshRequired => {
                tracing::debug!("Access token expired, redirecting to refresh");
                return redirect(REFRESH_PATH);
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::NotFound(msg) => {
                tracing::debug!(message = %msg, "Resource not found");
                (StatusCode::NOT_FOUND, msg)
            }
            Self::Provider { status, message } => {
                tracing::warn!(provider_status = status, message = %message, "Provider error");
                (StatusCode::BAD_GATEWAY, message)
            }
            Self::ProviderTimeout => {
                tracing::warn!("Provider request timed out");
                let body = Json(json!({
                    "error": "Spotify did not respond in time, please retry"
                }));
                return (StatusCode::GATEWAY_TIMEOUT, [(header::RETRY_AFTER, RETRY_AFTER_SECS)], body)
                    .into_response();
            }
            Self::Session(msg) => {
                tracing::error!(message = %msg, "Session error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
