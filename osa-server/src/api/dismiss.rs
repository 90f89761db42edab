use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;
use osa_sdk::objects::DismissRequest;

use crate::state::AppState;

/// `POST /dismiss` — acknowledge pending events of one kind for a user on
/// every registered channel.
///
/// The bus treats this as fire-and-forget; the REST mirror returns the
/// full report so failures stay observable.
pub(super) async fn dismiss(
    State(state): State<AppState>,
    Json(request): Json<DismissRequest>,
) -> impl IntoResponse {
    let report = state
        .dispatcher
        .process(request)
        .await
        .unwrap_or_else(|never| match never {});
    Json(report)
}
