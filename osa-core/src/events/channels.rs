//! Event channel factories and handles.

use super::types::ChannelEvent;
use osa_sdk::objects::BusServerMessage;
use tokio::sync::{broadcast, mpsc};

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory
/// bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for ChannelEvent values. Every channel source holds a
/// clone of the same sender.
pub type ChannelEventSender = mpsc::Sender<ChannelEvent>;
/// Receiver handle for ChannelEvent values, consumed by the router.
pub type ChannelEventReceiver = mpsc::Receiver<ChannelEvent>;

/// Sender handle for the outbound bus. Each connected bus client
/// subscribes via [`OutboundSender::subscribe`].
pub type OutboundSender = broadcast::Sender<BusServerMessage>;

/// Create the source-to-router event channel.
///
/// Returns a (sender, receiver) pair; the sender is cloned into every
/// channel source, the receiver is owned by the router.
pub fn channel_event_channel() -> (ChannelEventSender, ChannelEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the outbound broadcast channel.
///
/// Slow subscribers that fall more than the buffer behind skip the missed
/// frames; they are not disconnected.
pub fn outbound_channel() -> OutboundSender {
    let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_BUFFER);
    tx
}
