use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use compact_str::CompactString;

use super::ApiError;
use crate::state::AppState;

/// `GET /channels/{name}` — current snapshot of one channel.
///
/// Fails with an explicit 404 for an unregistered name.
pub(super) async fn get_channel_data(
    State(state): State<AppState>,
    Path(name): Path<CompactString>,
) -> Result<impl IntoResponse, ApiError> {
    let source = state
        .registry
        .get(&name)
        .await
        .ok_or(ApiError::ChannelNotFound)?;
    Ok(Json(source.data().await))
}
