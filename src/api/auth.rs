use crate::api::AppState;
use crate::api::schemas::auth::{CallbackParams, CallbackResponse, ErrorBody, RefreshResponse};
use crate::api::session::SessionHandle;
use crate::domain::token::unix_now;
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Sends the browser to the provider consent screen.
pub async fn login(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let url = state.auth_service.login_url()?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]))
}

/// Landing point of the provider redirect.
///
/// A provider-reported `error` is echoed back without touching the session. An unparsable query
/// string is answered like any other bad request.
#[tracing::instrument(skip_all, fields(session_id = %session.id()))]
pub async fn callback(
    State(state): State<AppState>,
    session: SessionHandle,
    params: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = params?;
    if let Some(error) = params.error {
        tracing::info!(error = %error, "Provider denied authorization");
        return Ok(Json(ErrorBody { error }).into_response());
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'code' or 'error' query parameter".to_string()))?;

    let mut current = session.load().await?;
    let issued = state.auth_service.complete_authorization(&mut current, &code, unix_now()).await?;
    session.save(current).await?;

    Ok(Json(CallbackResponse {
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        expires_at: issued.expires_at,
    })
    .into_response())
}

/// Refreshes an expired access token; a valid one is returned unchanged.
#[tracing::instrument(skip_all, fields(session_id = %session.id()))]
pub async fn refresh_token(State(state): State<AppState>, session: SessionHandle) -> Result<impl IntoResponse> {
    let mut current = session.load().await?;
    let token = state.auth_service.refresh(&mut current, unix_now()).await?;
    if token.refreshed {
        session.save(current).await?;
    }

    Ok(Json(RefreshResponse { access_token: token.access_token, expires_at: token.expires_at }))
}
