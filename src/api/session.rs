use crate::api::AppState;
use crate::config::SessionConfig;
use crate::domain::session::Session;
use crate::error::{AppError, Result};
use crate::storage::SessionStore;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct SessionClaims {
    sid: Uuid,
    exp: i64,
}

/// Signs and verifies the cookie that carries a session id.
///
/// The cookie value is an HS256 JWT whose `sid` claim is the session id, so a client can
/// neither forge nor guess another browser's session.
#[derive(Clone)]
pub struct SessionCookie {
    name: String,
    secret: String,
    ttl_secs: u64,
    secure: bool,
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("ttl_secs", &self.ttl_secs)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionCookie {
    #[must_use]
    pub fn new(config: &SessionConfig, secret: &str) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secret: secret.to_string(),
            ttl_secs: config.ttl_secs,
            secure: config.cookie_secure,
        }
    }

    /// Signs `id` into a cookie value.
    ///
    /// # Errors
    /// Returns `AppError::Session` if signing fails.
    pub fn sign(&self, id: Uuid) -> Result<String> {
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        let claims = SessionClaims { sid: id, exp: OffsetDateTime::now_utc().unix_timestamp().saturating_add(ttl) };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| AppError::Session(format!("Failed to sign session cookie: {e}")))
    }

    /// Session id carried by a cookie value, if the signature and expiry check out.
    #[must_use]
    pub fn verify(&self, value: &str) -> Option<Uuid> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<SessionClaims>(value, &DecodingKey::from_secret(self.secret.as_bytes()), &validation) {
            Ok(data) => Some(data.claims.sid),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session cookie");
                None
            }
        }
    }

    /// Finds and verifies the session cookie among the request's `Cookie` headers.
    #[must_use]
    pub fn read(&self, headers: &HeaderMap) -> Option<Uuid> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .and_then(|(_, value)| self.verify(value))
    }

    /// `Set-Cookie` header value for a freshly signed cookie.
    ///
    /// # Errors
    /// Returns `AppError::Session` if signing fails or the value is not a valid header.
    pub fn set_cookie(&self, id: Uuid) -> Result<HeaderValue> {
        let token = self.sign(id)?;
        let mut cookie = format!("{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}", self.name, self.ttl_secs);
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|e| AppError::Session(format!("Invalid Set-Cookie value: {e}")))
    }
}

/// The current request's session: its id plus the store it lives in.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: Uuid,
    store: Arc<dyn SessionStore>,
}

impl SessionHandle {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Loads the session, starting from an empty one if nothing was stored yet.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn load(&self) -> Result<Session> {
        Ok(self.store.get(self.id).await?.unwrap_or_default())
    }

    /// # Errors
    /// Propagates store failures.
    pub async fn save(&self, session: Session) -> Result<()> {
        self.store.set(self.id, session).await
    }
}

impl FromRequestParts<AppState> for SessionHandle {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::Session("Session layer is not installed".to_string()))
    }
}

/// Resolves the session id from the cookie (or mints one) and exposes it to handlers as a
/// [`SessionHandle`]. A newly minted id is sent back in a `Set-Cookie` header.
pub async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let (id, is_new) = match state.session_cookie.read(req.headers()) {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    };

    tracing::Span::current().record("session_id", tracing::field::display(id));
    req.extensions_mut().insert(SessionHandle { id, store: Arc::clone(&state.session_store) });
    let mut response = next.run(req).await;

    if is_new {
        match state.session_cookie.set_cookie(id) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Failed to issue session cookie"),
        }
    }

    response
}
