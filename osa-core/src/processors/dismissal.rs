//! DismissalDispatcher processor.
//!
//! Routes a dismissal command to the matching mutator on every registered
//! channel source. The bus transport treats `dismiss` as fire-and-forget,
//! but the dispatcher still produces a [`DismissReport`] so per-channel
//! failures are logged and observable. A source with no pending record for
//! the username is a per-source no-op, not an error.

use crate::registry::ChannelRegistry;
use crate::source::ChannelSource;
use futures_util::future::join_all;
use kanau::processor::Processor;
use osa_sdk::objects::{DismissFailure, DismissKind, DismissReport, DismissRequest};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// DismissalDispatcher fans dismissal writes out to every registered
/// source.
pub struct DismissalDispatcher {
    registry: Arc<ChannelRegistry>,
}

impl DismissalDispatcher {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    async fn dismiss_on(
        source: Arc<dyn ChannelSource>,
        request: &DismissRequest,
    ) -> Option<DismissFailure> {
        let result = match request.kind {
            DismissKind::Follow => source.dismiss_follow(&request.username).await,
            DismissKind::Subscription => source.dismiss_subscription(&request.username).await,
        };
        match result {
            Ok(()) => None,
            Err(e) => Some(DismissFailure {
                channel: source.name().into(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Processor<DismissRequest> for DismissalDispatcher {
    type Output = DismissReport;
    type Error = Infallible;

    async fn process(&self, request: DismissRequest) -> Result<DismissReport, Infallible> {
        let sources = self.registry.sources().await;
        debug!(kind = %request.kind, username = %request.username, channels = sources.len(), "dispatching dismissal");

        // Every leg runs to completion; failures are collected, never
        // silently swallowed.
        let outcomes = join_all(
            sources
                .iter()
                .map(|source| Self::dismiss_on(Arc::clone(source), &request)),
        )
        .await;

        let failures: Vec<DismissFailure> = outcomes.into_iter().flatten().collect();
        for failure in &failures {
            warn!(
                channel = %failure.channel,
                username = %request.username,
                reason = %failure.reason,
                "dismissal failed on channel"
            );
        }

        Ok(DismissReport {
            kind: request.kind,
            channels_notified: (sources.len() - failures.len()) as u32,
            username: request.username,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SourceFactory;
    use crate::source::testing::MockSource;
    use crate::source::SourceError;
    use async_trait::async_trait;
    use compact_str::CompactString;

    struct FixedFactory {
        sources: std::sync::Mutex<Vec<MockSource>>,
    }

    #[async_trait]
    impl SourceFactory for FixedFactory {
        async fn create(&self, _name: &str) -> Result<Arc<dyn ChannelSource>, SourceError> {
            Ok(Arc::new(self.sources.lock().unwrap().remove(0)))
        }
    }

    async fn registry_with(sources: Vec<MockSource>) -> Arc<ChannelRegistry> {
        let names: Vec<CompactString> = sources.iter().map(|s| s.name().into()).collect();
        let factory = FixedFactory {
            sources: std::sync::Mutex::new(sources),
        };
        let registry = Arc::new(ChannelRegistry::new());
        registry.ensure(&names, &factory).await;
        registry
    }

    #[tokio::test]
    async fn dismissal_reaches_every_channel_and_spares_other_kinds() {
        let registry = registry_with(vec![
            MockSource::new("nandor")
                .with_follow("guillermo", Some(1))
                .with_subscription("guillermo", Some(2)),
            MockSource::new("nadja"),
        ])
        .await;
        let dispatcher = DismissalDispatcher::new(Arc::clone(&registry));

        let report = dispatcher
            .process(DismissRequest {
                kind: DismissKind::Follow,
                username: "guillermo".into(),
            })
            .await
            .unwrap();

        assert_eq!(report.channels_notified, 2);
        assert!(report.failures.is_empty());

        // The channel that had the follow no longer reports it, while the
        // subscription record for the same user is untouched.
        let nandor = registry.get("nandor").await.unwrap();
        assert!(nandor.find_undismissed_follows().await.unwrap().is_empty());
        assert_eq!(
            nandor
                .find_undismissed_subscriptions()
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn per_channel_failures_are_reported_not_swallowed() {
        let registry = registry_with(vec![
            MockSource::new("colin").with_follow("evie", Some(1)),
            MockSource::new("gone").failing(),
        ])
        .await;
        let dispatcher = DismissalDispatcher::new(registry);

        let report = dispatcher
            .process(DismissRequest {
                kind: DismissKind::Follow,
                username: "evie".into(),
            })
            .await
            .unwrap();

        assert_eq!(report.channels_notified, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].channel, "gone");
    }
}
