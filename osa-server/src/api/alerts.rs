use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use osa_core::processors::AggregateQuery;
use osa_sdk::objects::{AlertsResponse, DismissKind};

use crate::state::AppState;

/// `GET /alerts/follows` — merged undismissed follow feed.
pub(super) async fn get_follows(state: State<AppState>) -> impl IntoResponse {
    query(state, DismissKind::Follow).await
}

/// `GET /alerts/subscriptions` — merged undismissed subscription feed.
pub(super) async fn get_subscriptions(state: State<AppState>) -> impl IntoResponse {
    query(state, DismissKind::Subscription).await
}

/// On failure the body still carries the (empty) alert list alongside the
/// error, mirroring the bus reply shape.
async fn query(State(state): State<AppState>, kind: DismissKind) -> impl IntoResponse {
    match state.aggregator.process(AggregateQuery { kind }).await {
        Ok(alerts) => (StatusCode::OK, Json(AlertsResponse::ok(alerts))),
        Err(e) => {
            tracing::error!(error = %e, %kind, "aggregate query failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(AlertsResponse::failed(e.to_string())),
            )
        }
    }
}
