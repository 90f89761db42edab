//! Dismissal commands and aggregation query responses.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::events::{AggregatedAlert, EventKind};

/// The dismissable event kinds.
///
/// Only follows and subscriptions carry dismissal state; an unknown kind in
/// an incoming command is a deserialization error, never a silent fallback
/// to the follow path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissKind {
    Follow,
    Subscription,
}

impl From<DismissKind> for EventKind {
    fn from(value: DismissKind) -> Self {
        match value {
            DismissKind::Follow => EventKind::Follow,
            DismissKind::Subscription => EventKind::Subscription,
        }
    }
}

impl std::fmt::Display for DismissKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DismissKind::Follow => write!(f, "follow"),
            DismissKind::Subscription => write!(f, "subscription"),
        }
    }
}

/// A request to acknowledge all pending events of one kind for a user,
/// across every registered channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissRequest {
    #[serde(rename = "type")]
    pub kind: DismissKind,
    pub username: CompactString,
}

/// A dismissal failure on a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissFailure {
    pub channel: CompactString,
    pub reason: String,
}

/// Outcome of a dismissal fan-out.
///
/// The transport may treat `dismiss` as fire-and-forget, but the engine
/// always produces a report so failures are observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissReport {
    #[serde(rename = "type")]
    pub kind: DismissKind,
    pub username: CompactString,
    /// Number of channels whose mutator completed without error.
    pub channels_notified: u32,
    #[serde(default)]
    pub failures: Vec<DismissFailure>,
}

/// Response body for the undismissed-alert queries.
///
/// On an aggregation failure the error is reported alongside an empty alert
/// list rather than the list being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub error: Option<String>,
    pub alerts: Vec<AggregatedAlert>,
}

impl AlertsResponse {
    /// A successful response carrying the merged alert feed.
    pub fn ok(alerts: Vec<AggregatedAlert>) -> Self {
        Self {
            error: None,
            alerts,
        }
    }

    /// A failed response: the error plus an empty feed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            alerts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dismiss_request_parses_known_kinds() {
        let req: DismissRequest =
            serde_json::from_str(r#"{"type":"follow","username":"guillermo"}"#).unwrap();
        assert_eq!(req.kind, DismissKind::Follow);
        assert_eq!(req.username, "guillermo");
    }

    #[test]
    fn dismiss_request_rejects_unknown_kind() {
        let err = serde_json::from_str::<DismissRequest>(r#"{"type":"host","username":"g"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn failed_response_is_error_plus_empty_list() {
        let resp = AlertsResponse::failed("channel gone");
        assert_eq!(resp.error.as_deref(), Some("channel gone"));
        assert!(resp.alerts.is_empty());
    }
}
