//! Shared types for Open Stream Alerts.
//!
//! This crate defines the wire objects exchanged between the server, the
//! core event engine and downstream consumers: event envelopes, aggregated
//! alert items, dismissal commands and the WebSocket bus protocol.
//!
//! Enable the `client` feature to get [`client::BusClient`], a small
//! WebSocket client for the bus endpoint.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;
