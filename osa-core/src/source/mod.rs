//! Channel sources.
//!
//! A [`ChannelSource`] is the capability object the engine holds per
//! configured channel: it emits typed audience events from the moment it is
//! constructed, retains follow/subscription history with dismissal flags,
//! and answers undismissed queries.
//!
//! [`polling::PollingChannelSource`] is the production implementation,
//! backed by the streaming platform's REST API.

pub mod live;
pub mod polling;
pub mod state;

use async_trait::async_trait;
use compact_str::CompactString;
use osa_sdk::objects::{ChannelData, EventStamp};

/// Errors produced by channel sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The configured channel name cannot exist on the platform.
    #[error("invalid channel name: {name:?}")]
    InvalidChannelName { name: String },

    /// API request error
    #[error("API request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: status {status}")]
    Api { status: u16 },

    /// API response parsing error
    #[error("API response parsing error: {0}")]
    Parse(String),

    /// The API endpoint path could not be built.
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
}

/// A retained follow occurrence, as returned by the undismissed query.
///
/// The stamp is optional: records observed without a usable timestamp are
/// still retained and aggregate with `ts = 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRecord {
    pub username: CompactString,
    pub follow: Option<EventStamp>,
}

/// A retained subscription occurrence, as returned by the undismissed
/// query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub username: CompactString,
    pub subscription: Option<EventStamp>,
}

/// One registered channel's event source.
///
/// The registry holds exactly one boxed instance per configured channel
/// name and never touches its internal state directly; all mutation goes
/// through the dismissal mutators below.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// The channel name this source is bound to.
    fn name(&self) -> &str;

    /// All follow records not yet acknowledged, in the order the source
    /// observed them.
    async fn find_undismissed_follows(&self) -> Result<Vec<FollowRecord>, SourceError>;

    /// All subscription records not yet acknowledged, in the order the
    /// source observed them.
    async fn find_undismissed_subscriptions(&self)
    -> Result<Vec<SubscriptionRecord>, SourceError>;

    /// Mark every pending follow record for `username` acknowledged.
    /// Idempotent; a user with no pending record is a no-op.
    async fn dismiss_follow(&self, username: &str) -> Result<(), SourceError>;

    /// Mark every pending subscription record for `username` acknowledged.
    /// Idempotent; a user with no pending record is a no-op.
    async fn dismiss_subscription(&self, username: &str) -> Result<(), SourceError>;

    /// The current live snapshot of this channel.
    async fn data(&self) -> ChannelData;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory source used by the registry and processor tests.

    use super::*;
    use std::sync::Mutex;

    pub(crate) struct MockSource {
        name: CompactString,
        pub(crate) follows: Mutex<Vec<FollowRecord>>,
        pub(crate) subscriptions: Mutex<Vec<SubscriptionRecord>>,
        pub(crate) fail_queries: bool,
        pub(crate) dismissed_follows: Mutex<Vec<CompactString>>,
        pub(crate) dismissed_subscriptions: Mutex<Vec<CompactString>>,
    }

    impl MockSource {
        pub(crate) fn new(name: &str) -> Self {
            Self {
                name: name.into(),
                follows: Mutex::new(Vec::new()),
                subscriptions: Mutex::new(Vec::new()),
                fail_queries: false,
                dismissed_follows: Mutex::new(Vec::new()),
                dismissed_subscriptions: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_follow(self, username: &str, ts: Option<i64>) -> Self {
            self.follows.lock().unwrap().push(FollowRecord {
                username: username.into(),
                follow: ts.map(|ts| EventStamp { ts }),
            });
            self
        }

        pub(crate) fn with_subscription(self, username: &str, ts: Option<i64>) -> Self {
            self.subscriptions.lock().unwrap().push(SubscriptionRecord {
                username: username.into(),
                subscription: ts.map(|ts| EventStamp { ts }),
            });
            self
        }

        pub(crate) fn failing(mut self) -> Self {
            self.fail_queries = true;
            self
        }
    }

    #[async_trait]
    impl ChannelSource for MockSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn find_undismissed_follows(&self) -> Result<Vec<FollowRecord>, SourceError> {
            if self.fail_queries {
                return Err(SourceError::Api { status: 503 });
            }
            Ok(self.follows.lock().unwrap().clone())
        }

        async fn find_undismissed_subscriptions(
            &self,
        ) -> Result<Vec<SubscriptionRecord>, SourceError> {
            if self.fail_queries {
                return Err(SourceError::Api { status: 503 });
            }
            Ok(self.subscriptions.lock().unwrap().clone())
        }

        async fn dismiss_follow(&self, username: &str) -> Result<(), SourceError> {
            if self.fail_queries {
                return Err(SourceError::Api { status: 503 });
            }
            self.follows
                .lock()
                .unwrap()
                .retain(|r| r.username != username);
            self.dismissed_follows.lock().unwrap().push(username.into());
            Ok(())
        }

        async fn dismiss_subscription(&self, username: &str) -> Result<(), SourceError> {
            if self.fail_queries {
                return Err(SourceError::Api { status: 503 });
            }
            self.subscriptions
                .lock()
                .unwrap()
                .retain(|r| r.username != username);
            self.dismissed_subscriptions
                .lock()
                .unwrap()
                .push(username.into());
            Ok(())
        }

        async fn data(&self) -> ChannelData {
            ChannelData::offline(self.name.clone())
        }
    }
}
