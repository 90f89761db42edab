//! Event system for the aggregation engine.
//!
//! This module provides the event types and channel infrastructure that
//! connect channel sources to the router and the router to the outbound
//! bus.
//!
//! # Event Flow
//!
//! 1. Each `ChannelSource` emits `ChannelEvent`s on the shared mpsc channel.
//! 2. The `EventRouter` consumes them, wraps them in envelopes and forwards
//!    them on the outbound broadcast channel.
//! 3. Bus connections subscribe to the broadcast channel and push frames to
//!    their clients.
//!
//! Events are ephemeral; the only retained state is the per-source
//! follow/subscription history used for undismissed queries.

pub mod channels;
pub mod types;

pub use channels::{
    ChannelEventReceiver, ChannelEventSender, DEFAULT_CHANNEL_BUFFER, OutboundSender,
    channel_event_channel, outbound_channel,
};
pub use types::{ChannelEvent, LiveUpdate, SourceEvent};
