use crate::api::AppState;
use crate::api::session::SessionHandle;
use crate::domain::token::unix_now;
use crate::error::Result;
use axum::{Json, extract::State, response::IntoResponse};

#[tracing::instrument(skip_all, fields(session_id = %session.id()))]
pub async fn get_playlist(State(state): State<AppState>, session: SessionHandle) -> Result<impl IntoResponse> {
    let current = session.load().await?;
    let playlist = state.playlist_service.find_playlist(&current, unix_now()).await?;
    Ok(Json(playlist))
}
