//! The per-channel live snapshot carried by `update` frames.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Current state of one configured channel, as last observed by the
/// live-status poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelData {
    pub name: CompactString,
    /// Whether the channel is currently broadcasting.
    pub live: bool,
    pub viewers: u64,
    pub followers: u64,
    #[serde(default)]
    pub title: Option<String>,
    /// When this snapshot was taken, epoch milliseconds.
    pub updated_at: i64,
}

impl ChannelData {
    /// Placeholder snapshot used before the first poll completes.
    pub fn offline(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            live: false,
            viewers: 0,
            followers: 0,
            title: None,
            updated_at: 0,
        }
    }
}
