use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: reports the number of live sessions held in memory.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let sessions = state.session_store.count().await;
    Json(HealthResponse { status: "ok".to_string(), sessions })
}
