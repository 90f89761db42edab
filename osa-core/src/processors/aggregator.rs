//! UndismissedAggregator processor.
//!
//! Answers an [`AggregateQuery`] by fanning one read out to every
//! registered channel source, waiting for all legs, and merging the
//! per-source sequences into one flat feed:
//!
//! - All-or-nothing: a single failed leg fails the whole call; there is no
//!   partial-success mode.
//! - Every leg runs to completion; there is no cancellation or timeout.
//! - Per-source order is preserved; cross-source interleaving is
//!   unspecified.
//! - Each record is normalized to an [`AggregatedAlert`], taking the
//!   nested per-kind stamp when present and `0` otherwise.

use crate::registry::ChannelRegistry;
use crate::source::{ChannelSource, SourceError};
use futures_util::future::join_all;
use kanau::processor::Processor;
use osa_sdk::objects::{AggregatedAlert, DismissKind, EventKind};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can fail an aggregate query.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// One of the fanned-out source queries failed.
    #[error("undismissed query failed on channel {channel}: {source}")]
    Source {
        channel: String,
        source: SourceError,
    },
}

/// A query for the merged undismissed feed of one dismissable kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateQuery {
    pub kind: DismissKind,
}

/// UndismissedAggregator merges per-channel undismissed events into one
/// cross-channel feed.
pub struct UndismissedAggregator {
    registry: Arc<ChannelRegistry>,
}

impl UndismissedAggregator {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Query one source for its undismissed records of the requested kind,
    /// already normalized to the aggregated shape.
    async fn query_source(
        source: Arc<dyn ChannelSource>,
        kind: DismissKind,
    ) -> Result<Vec<AggregatedAlert>, AggregateError> {
        let channel = source.name().to_owned();
        match kind {
            DismissKind::Follow => source
                .find_undismissed_follows()
                .await
                .map(|records| {
                    records
                        .into_iter()
                        .map(|r| AggregatedAlert {
                            username: r.username,
                            kind: EventKind::Follow,
                            ts: r.follow.map(|s| s.ts).unwrap_or(0),
                            channel: channel.as_str().into(),
                        })
                        .collect()
                })
                .map_err(|source| AggregateError::Source { channel, source }),
            DismissKind::Subscription => source
                .find_undismissed_subscriptions()
                .await
                .map(|records| {
                    records
                        .into_iter()
                        .map(|r| AggregatedAlert {
                            username: r.username,
                            kind: EventKind::Subscription,
                            ts: r.subscription.map(|s| s.ts).unwrap_or(0),
                            channel: channel.as_str().into(),
                        })
                        .collect()
                })
                .map_err(|source| AggregateError::Source { channel, source }),
        }
    }
}

impl Processor<AggregateQuery> for UndismissedAggregator {
    type Output = Vec<AggregatedAlert>;
    type Error = AggregateError;

    async fn process(&self, query: AggregateQuery) -> Result<Vec<AggregatedAlert>, AggregateError> {
        let sources = self.registry.sources().await;
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        debug!(kind = %query.kind, channels = sources.len(), "aggregating undismissed events");

        // join_all rather than try_join_all: once the fan-out begins,
        // every leg runs to completion.
        let legs = join_all(
            sources
                .into_iter()
                .map(|source| Self::query_source(source, query.kind)),
        )
        .await;

        let mut merged = Vec::new();
        for leg in legs {
            merged.extend(leg?);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ChannelRegistry, SourceFactory};
    use crate::source::testing::MockSource;
    use async_trait::async_trait;
    use compact_str::CompactString;

    struct FixedFactory {
        sources: std::sync::Mutex<Vec<MockSource>>,
    }

    impl FixedFactory {
        fn new(sources: Vec<MockSource>) -> Self {
            Self {
                sources: std::sync::Mutex::new(sources),
            }
        }
    }

    #[async_trait]
    impl SourceFactory for FixedFactory {
        async fn create(&self, _name: &str) -> Result<Arc<dyn ChannelSource>, SourceError> {
            Ok(Arc::new(self.sources.lock().unwrap().remove(0)))
        }
    }

    async fn registry_with(sources: Vec<MockSource>) -> Arc<ChannelRegistry> {
        let names: Vec<CompactString> = sources.iter().map(|s| s.name().into()).collect();
        let factory = FixedFactory::new(sources);
        let registry = Arc::new(ChannelRegistry::new());
        let report = registry.ensure(&names, &factory).await;
        assert!(report.is_complete());
        registry
    }

    #[tokio::test]
    async fn zero_channels_resolves_to_empty() {
        let aggregator = UndismissedAggregator::new(Arc::new(ChannelRegistry::new()));
        let alerts = aggregator
            .process(AggregateQuery {
                kind: DismissKind::Follow,
            })
            .await
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn merges_across_channels_and_keeps_channel_names() {
        let registry = registry_with(vec![
            MockSource::new("nandor").with_follow("a", Some(100)),
            MockSource::new("laszlo").with_follow("b", Some(200)),
        ])
        .await;
        let aggregator = UndismissedAggregator::new(registry);

        let mut alerts = aggregator
            .process(AggregateQuery {
                kind: DismissKind::Follow,
            })
            .await
            .unwrap();
        alerts.sort_by(|x, y| x.username.cmp(&y.username));

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].username, "a");
        assert_eq!(alerts[0].ts, 100);
        assert_eq!(alerts[0].channel, "nandor");
        assert_eq!(alerts[0].kind, EventKind::Follow);
        assert_eq!(alerts[1].username, "b");
        assert_eq!(alerts[1].channel, "laszlo");
    }

    #[tokio::test]
    async fn missing_stamp_defaults_to_zero() {
        let registry =
            registry_with(vec![MockSource::new("colin").with_subscription("evie", None)]).await;
        let aggregator = UndismissedAggregator::new(registry);

        let alerts = aggregator
            .process(AggregateQuery {
                kind: DismissKind::Subscription,
            })
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].ts, 0);
        assert_eq!(alerts[0].kind, EventKind::Subscription);
    }

    #[tokio::test]
    async fn one_failing_source_fails_the_whole_call() {
        let registry = registry_with(vec![
            MockSource::new("nadja").with_follow("a", Some(1)),
            MockSource::new("gone").failing(),
        ])
        .await;
        let aggregator = UndismissedAggregator::new(registry);

        let err = aggregator
            .process(AggregateQuery {
                kind: DismissKind::Follow,
            })
            .await
            .unwrap_err();
        let AggregateError::Source { channel, .. } = err;
        assert_eq!(channel, "gone");
    }
}
