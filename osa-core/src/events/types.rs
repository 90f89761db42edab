//! Event type definitions for the aggregation engine.
//!
//! Source events are ephemeral: they are forwarded outward the moment the
//! router sees them. Follows carry no timestamp because the envelope is
//! stamped at forwarding time; subscriptions and hosts carry the timestamp
//! the source observed.

use compact_str::CompactString;
use osa_sdk::objects::ChannelData;

/// A typed event produced by one channel source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// A user started following the channel.
    Follow { username: CompactString },

    /// A user subscribed, at `ts` epoch milliseconds.
    Subscription { username: CompactString, ts: i64 },

    /// Another channel started hosting this one, at `ts` epoch
    /// milliseconds.
    Host { hoster: CompactString, ts: i64 },

    /// The channel's live snapshot was refreshed.
    DataUpdate { data: ChannelData },
}

/// A source event annotated with its originating channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub channel: CompactString,
    pub event: SourceEvent,
}

/// A refreshed live snapshot broadcast by the live-status poller.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    pub channel: CompactString,
    pub data: ChannelData,
}
