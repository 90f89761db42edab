pub mod channel_data;
pub mod commands;
pub mod events;
pub mod ws;

pub use channel_data::ChannelData;
pub use commands::{
    AlertsResponse, DismissFailure, DismissKind, DismissReport, DismissRequest,
};
pub use events::{AggregatedAlert, EventEnvelope, EventKind, EventStamp};
pub use ws::{BusClientMessage, BusCloseCode, BusServerMessage};
