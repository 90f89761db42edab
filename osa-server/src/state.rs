//! Application state shared across all request handlers.

use osa_core::events::OutboundSender;
use osa_core::processors::{DismissalDispatcher, UndismissedAggregator};
use osa_core::registry::ChannelRegistry;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc or
/// is itself a channel handle).
#[derive(Clone)]
pub struct AppState {
    /// The registry of per-channel event sources.
    pub registry: Arc<ChannelRegistry>,
    /// Merges undismissed events across channels on demand.
    pub aggregator: Arc<UndismissedAggregator>,
    /// Fans dismissal writes out to every channel.
    pub dispatcher: Arc<DismissalDispatcher>,
    /// The outbound bus; each WebSocket connection subscribes to it.
    pub outbound_tx: OutboundSender,
}

impl AppState {
    /// Create a new AppState around a populated registry.
    pub fn new(registry: Arc<ChannelRegistry>, outbound_tx: OutboundSender) -> Self {
        Self {
            aggregator: Arc::new(UndismissedAggregator::new(Arc::clone(&registry))),
            dispatcher: Arc::new(DismissalDispatcher::new(Arc::clone(&registry))),
            registry,
            outbound_tx,
        }
    }
}
