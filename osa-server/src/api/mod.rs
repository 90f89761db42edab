//! HTTP API handlers.
//!
//! The REST endpoints mirror the bus commands one-to-one so simple
//! consumers can poll instead of holding a WebSocket open:
//!
//! - `GET  /alerts/follows`        – merged undismissed follow feed
//! - `GET  /alerts/subscriptions`  – merged undismissed subscription feed
//! - `GET  /channels/{name}`       – current snapshot of one channel
//! - `POST /dismiss`               – acknowledge pending events for a user
//! - `GET  /ws`                    – the alert bus (WebSocket)

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::state::AppState;

mod alerts;
mod channel_data;
mod dismiss;
mod ws;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alerts/follows", get(alerts::get_follows))
        .route("/alerts/subscriptions", get(alerts::get_subscriptions))
        .route("/channels/{name}", get(channel_data::get_channel_data))
        .route("/dismiss", post(dismiss::dismiss))
        .route("/ws", get(ws::alert_bus_ws))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    /// The requested channel is not registered. An unknown lookup fails
    /// explicitly instead of answering with an empty success.
    ChannelNotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::ChannelNotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "channel not found" })),
            )
                .into_response(),
        }
    }
}
