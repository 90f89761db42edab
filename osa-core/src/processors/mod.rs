//! Event processors for the aggregation engine.
//!
//! - `EventRouter`: consumes `ChannelEvent`s, wraps them in envelopes and
//!   forwards them on the outbound bus
//! - `UndismissedAggregator`: answers `AggregateQuery` by fanning a read
//!   out to every registered source and merging the results
//! - `DismissalDispatcher`: fans a `DismissRequest` out to every registered
//!   source and reports per-channel failures

pub mod aggregator;
pub mod dismissal;
pub mod router;

pub use aggregator::{AggregateError, AggregateQuery, UndismissedAggregator};
pub use dismissal::DismissalDispatcher;
pub use router::EventRouter;
