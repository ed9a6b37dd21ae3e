use crate::domain::session::Session;
use crate::error::{AppError, Result};

/// Current wall-clock time as unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Tokens returned by a successful code or refresh exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl TokenGrant {
    #[must_use]
    pub const fn expires_at(&self, issued_at: i64) -> i64 {
        issued_at.saturating_add(self.expires_in)
    }
}

/// Where a session stands in the OAuth token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Unauthenticated,
    Valid,
    Expired,
}

/// Classifies a session at instant `now` (unix seconds).
///
/// A token is expired from `expires_at` onwards. An access token with no recorded expiry is
/// treated as expired so that it is never sent upstream.
#[must_use]
pub fn classify(session: &Session, now: i64) -> TokenState {
    if session.access_token.is_none() {
        return TokenState::Unauthenticated;
    }
    match session.expires_at {
        Some(expires_at) if now < expires_at => TokenState::Valid,
        _ => TokenState::Expired,
    }
}

/// Returns the access token if it can be used right now.
///
/// # Errors
/// - `AppError::AuthRequired` when the session holds no access token.
/// - `AppError::RefreshRequired` when the token expired. The refresh route decides whether a
///   refresh token is left to use.
pub fn require_valid(session: &Session, now: i64) -> Result<&str> {
    match (classify(session, now), session.access_token.as_deref()) {
        (TokenState::Valid, Some(token)) => Ok(token),
        (TokenState::Expired, _) => Err(AppError::RefreshRequired),
        _ => Err(AppError::AuthRequired),
    }
}
