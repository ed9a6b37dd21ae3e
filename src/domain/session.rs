use crate::domain::token::TokenGrant;
use serde::{Deserialize, Serialize};

/// Per-browser OAuth state kept server-side and addressed by the session cookie.
///
/// `expires_at` is an absolute unix timestamp and is always set together with `access_token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

impl Session {
    /// Records a grant issued at `now`.
    ///
    /// A grant without a refresh token keeps the one already held.
    pub fn apply_grant(&mut self, grant: TokenGrant, now: i64) {
        self.expires_at = Some(grant.expires_at(now));
        self.access_token = Some(grant.access_token);
        if let Some(refresh_token) = grant.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.expires_at.is_none()
    }
}
