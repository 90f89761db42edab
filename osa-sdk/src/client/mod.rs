//! WebSocket client for the alert bus.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `tokio-tungstenite`.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::objects::{BusClientMessage, BusServerMessage, DismissRequest};

/// Errors produced by the SDK bus client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame body could not be serialized or deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server closed the connection.
    #[error("connection closed")]
    Closed,
}

/// A connected alert-bus client.
///
/// The bus is a single duplex stream: pushed event frames and command
/// replies arrive interleaved on [`next`](BusClient::next). Callers that
/// issue a command should keep draining frames until the matching reply
/// kind shows up.
pub struct BusClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl BusClient {
    /// Connect to the bus endpoint (e.g. `ws://localhost:8080/ws`).
    pub async fn connect(url: &Url) -> Result<Self, ClientError> {
        let (stream, _response) = connect_async(url.as_str()).await?;
        Ok(Self { stream })
    }

    /// Send one command frame.
    pub async fn send(&mut self, command: &BusClientMessage) -> Result<(), ClientError> {
        let json = serde_json::to_string(command)?;
        self.stream.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Receive the next server frame, skipping non-text frames.
    ///
    /// Returns [`ClientError::Closed`] once the server has closed the
    /// connection.
    pub async fn next(&mut self) -> Result<BusServerMessage, ClientError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(text.as_str())?);
                }
                Some(Ok(Message::Close(_))) | None => return Err(ClientError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Request the merged undismissed follow feed.
    pub async fn get_follows(&mut self) -> Result<(), ClientError> {
        self.send(&BusClientMessage::GetFollows).await
    }

    /// Request the merged undismissed subscription feed.
    pub async fn get_subscriptions(&mut self) -> Result<(), ClientError> {
        self.send(&BusClientMessage::GetSubscriptions).await
    }

    /// Request the current snapshot of one channel.
    pub async fn get_channel_data(
        &mut self,
        channel: impl Into<compact_str::CompactString>,
    ) -> Result<(), ClientError> {
        self.send(&BusClientMessage::GetChannelData {
            channel: channel.into(),
        })
        .await
    }

    /// Acknowledge pending events for a user.
    pub async fn dismiss(&mut self, request: DismissRequest) -> Result<(), ClientError> {
        self.send(&BusClientMessage::Dismiss { request }).await
    }

    /// Close the connection gracefully.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
