//! Event envelopes and aggregated alert items.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// All audience event kinds forwarded over the bus.
///
/// The kind of an event is set exactly once at creation and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Follow,
    Subscription,
    Host,
    Update,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Follow => write!(f, "follow"),
            EventKind::Subscription => write!(f, "subscription"),
            EventKind::Host => write!(f, "host"),
            EventKind::Update => write!(f, "update"),
        }
    }
}

/// The uniform shape wrapping any forwarded audience event.
///
/// `ts` is epoch milliseconds. Timestamps are monotonic non-decreasing
/// within one channel's own stream but carry no ordering guarantee across
/// channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// The user the event is about (the hoster for host events).
    pub username: CompactString,
    /// Event kind, fixed at creation.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Originating channel name.
    pub channel: CompactString,
    /// Epoch milliseconds.
    pub ts: i64,
}

/// The nested per-kind timestamp attached to a retained event record.
///
/// Sources may retain records without a stamp; the aggregated view then
/// reports `ts = 0` for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStamp {
    /// Epoch milliseconds.
    pub ts: i64,
}

/// One item of the merged cross-channel undismissed feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedAlert {
    pub username: CompactString,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Epoch milliseconds, `0` when the retained record carries no stamp.
    pub ts: i64,
    /// Originating channel name.
    pub channel: CompactString,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wire_shape() {
        let envelope = EventEnvelope {
            username: "nadja".into(),
            kind: EventKind::Follow,
            channel: "laszlo".into(),
            ts: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "follow");
        assert_eq!(json["channel"], "laszlo");
        assert_eq!(json["ts"], 1_700_000_000_000_i64);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = serde_json::from_str::<EventKind>("\"raid\"");
        assert!(err.is_err());
    }
}
