//! WebSocket message types for the alert bus.
//!
//! The `GET /ws` endpoint upgrades to a WebSocket connection over which the
//! server pushes [`BusServerMessage`] JSON frames and accepts
//! [`BusClientMessage`] command frames.
//!
//! # Protocol
//!
//! 1. Immediately after the upgrade the client starts receiving every
//!    forwarded audience event (`follow`, `subscription`, `host`, `update`)
//!    and every `log` line.
//! 2. The client may send commands at any time; each command is answered
//!    with exactly one reply frame (`alerts`, `channel_data`, `dismissed`
//!    or `error`).
//! 3. A malformed command frame is answered with an `error` frame carrying
//!    [`BusCloseCode::BAD_MESSAGE`]; the connection stays open.
//! 4. A `get_channel_data` command for an unregistered channel is answered
//!    with an `error` frame carrying [`BusCloseCode::CHANNEL_NOT_FOUND`].

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::channel_data::ChannelData;
use super::commands::{AlertsResponse, DismissKind, DismissReport, DismissRequest};
use super::events::EventEnvelope;

/// Server-to-client bus frame.
///
/// Serialized as an internally-tagged JSON object so the client can
/// dispatch on the `"type"` field:
///
/// ```json
/// {"type":"follow","event":{"username":"nandor","type":"follow","channel":"laszlo","ts":1700000000000}}
/// {"type":"error","code":4004,"reason":"channel not found"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusServerMessage {
    /// Mirrored log line (every forwarded event is also logged here).
    Log { message: String },

    /// A new follow, forwarded in real time.
    Follow { event: EventEnvelope },

    /// A new subscription, forwarded in real time.
    Subscription { event: EventEnvelope },

    /// A new host, forwarded in real time.
    Host { event: EventEnvelope },

    /// A channel data refresh: the raw per-channel snapshot, not an
    /// envelope.
    Update {
        channel: CompactString,
        data: ChannelData,
    },

    /// Reply to `get_follows` / `get_subscriptions`. On an aggregation
    /// failure `response.error` is set and `response.alerts` is empty.
    Alerts {
        kind: DismissKind,
        response: AlertsResponse,
    },

    /// Reply to `get_channel_data`.
    ChannelData { data: ChannelData },

    /// Reply to `dismiss`.
    Dismissed { report: DismissReport },

    /// A command-level error that does **not** close the connection by
    /// itself.
    Error {
        /// Application-level error code (mirrors [`BusCloseCode`] values
        /// where applicable).
        code: u16,
        /// Human-readable reason.
        reason: String,
    },
}

/// Client-to-server bus command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusClientMessage {
    /// Query the merged undismissed follow feed.
    GetFollows,

    /// Query the merged undismissed subscription feed.
    GetSubscriptions,

    /// Fetch the current snapshot of one channel.
    GetChannelData { channel: CompactString },

    /// Acknowledge all pending events of one kind for a user.
    Dismiss { request: DismissRequest },
}

/// Well-known WebSocket close and error codes used by the alert bus.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct BusCloseCode;

impl BusCloseCode {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;

    /// An unexpected server-side error prevented the connection from
    /// continuing.
    pub const INTERNAL_ERROR: u16 = 1011;

    /// The requested channel is not registered.
    pub const CHANNEL_NOT_FOUND: u16 = 4004;

    /// The command frame could not be parsed.
    pub const BAD_MESSAGE: u16 = 4400;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::events::EventKind;

    #[test]
    fn server_frames_carry_expected_tags() {
        let frame = BusServerMessage::Follow {
            event: EventEnvelope {
                username: "colin".into(),
                kind: EventKind::Follow,
                channel: "energy".into(),
                ts: 7,
            },
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "follow");
        assert_eq!(json["event"]["username"], "colin");

        let frame = BusServerMessage::Update {
            channel: "energy".into(),
            data: ChannelData::offline("energy"),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["data"]["live"], false);
    }

    #[test]
    fn dismiss_command_parses_nested_request() {
        let json = r#"{"type":"dismiss","request":{"type":"subscription","username":"nadja"}}"#;
        let cmd: BusClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            BusClientMessage::Dismiss {
                request: DismissRequest {
                    kind: DismissKind::Subscription,
                    username: "nadja".into(),
                },
            }
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = serde_json::from_str::<BusClientMessage>(r#"{"type":"get_raids"}"#);
        assert!(err.is_err());
    }
}
