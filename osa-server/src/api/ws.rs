use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use kanau::processor::Processor;
use osa_core::processors::AggregateQuery;
use osa_sdk::objects::{
    AlertsResponse, BusClientMessage, BusCloseCode, BusServerMessage, DismissKind,
};

use crate::state::AppState;

/// `GET /ws` — the alert bus.
///
/// Upgrades the HTTP connection to a WebSocket, pushes every forwarded
/// audience event and `log` line as JSON frames, and answers command
/// frames (`get_follows`, `get_subscriptions`, `get_channel_data`,
/// `dismiss`) with their reply frames.
pub(super) async fn alert_bus_ws(state: State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_bus(socket, app_state))
}

/// Background task that drives a single bus connection.
async fn handle_bus(mut socket: WebSocket, state: AppState) {
    // Subscribe *before* serving any command so events forwarded while a
    // query runs are still captured in the receiver's buffer.
    let mut outbound_rx = state.outbound_tx.subscribe();

    loop {
        tokio::select! {
            frame = outbound_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if send_json(&mut socket, &frame).await.is_err() {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "bus connection lagged, frames skipped");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if handle_command(&mut socket, &state, text.as_str()).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => {
                        return;
                    }
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}

/// Parse and answer one command frame.
///
/// Returns `Err(())` only when the reply could not be sent (client
/// disconnected); command-level problems are answered with `error` frames
/// and keep the connection open.
async fn handle_command(socket: &mut WebSocket, state: &AppState, text: &str) -> Result<(), ()> {
    let command: BusClientMessage = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!(error = %e, "malformed bus command");
            return send_json(
                socket,
                &BusServerMessage::Error {
                    code: BusCloseCode::BAD_MESSAGE,
                    reason: format!("malformed command: {e}"),
                },
            )
            .await;
        }
    };

    match command {
        BusClientMessage::GetFollows => {
            let reply = query_alerts(state, DismissKind::Follow).await;
            send_json(socket, &reply).await
        }
        BusClientMessage::GetSubscriptions => {
            let reply = query_alerts(state, DismissKind::Subscription).await;
            send_json(socket, &reply).await
        }
        BusClientMessage::GetChannelData { channel } => {
            match state.registry.get(&channel).await {
                Some(source) => {
                    let data = source.data().await;
                    send_json(socket, &BusServerMessage::ChannelData { data }).await
                }
                None => {
                    send_json(
                        socket,
                        &BusServerMessage::Error {
                            code: BusCloseCode::CHANNEL_NOT_FOUND,
                            reason: format!("channel not found: {channel}"),
                        },
                    )
                    .await
                }
            }
        }
        BusClientMessage::Dismiss { request } => {
            let report = state
                .dispatcher
                .process(request)
                .await
                .unwrap_or_else(|never| match never {});
            send_json(socket, &BusServerMessage::Dismissed { report }).await
        }
    }
}

/// Run one aggregate query and shape the reply frame. A failed aggregation
/// is reported as the error alongside an empty alert list.
async fn query_alerts(state: &AppState, kind: DismissKind) -> BusServerMessage {
    match state.aggregator.process(AggregateQuery { kind }).await {
        Ok(alerts) => BusServerMessage::Alerts {
            kind,
            response: AlertsResponse::ok(alerts),
        },
        Err(e) => {
            tracing::error!(error = %e, %kind, "aggregate query failed");
            BusServerMessage::Alerts {
                kind,
                response: AlertsResponse::failed(e.to_string()),
            }
        }
    }
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
