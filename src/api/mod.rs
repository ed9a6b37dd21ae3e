use crate::api::session::{SessionCookie, session_layer};
use crate::config::Config;
use crate::services::auth_service::AuthService;
use crate::services::playlist_service::PlaylistService;
use crate::storage::SessionStore;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{Router, middleware::from_fn_with_state, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod health;
pub mod middleware;
pub mod playlists;
pub mod schemas;
pub mod session;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub playlist_service: PlaylistService,
    pub session_store: Arc<dyn SessionStore>,
    pub session_cookie: SessionCookie,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub session_store: Arc<dyn SessionStore>,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub auth_service: AuthService,
    pub playlist_service: PlaylistService,
    pub session_store: Arc<dyn SessionStore>,
}

/// Configures and returns the public application router.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);
    let session_cookie = SessionCookie::new(&config.session, &config.secret_key);

    let state = AppState {
        config,
        auth_service: services.auth_service,
        playlist_service: services.playlist_service,
        session_store: services.session_store,
        session_cookie,
    };

    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/playlists", get(playlists::get_playlist))
        .route("/refresh-token", get(auth::refresh_token))
        .layer(from_fn_with_state(state.clone(), session_layer))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "session_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), middleware::MakeRequestUuidV7))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
