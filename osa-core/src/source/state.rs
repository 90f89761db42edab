//! In-memory event history and dismissal bookkeeping for one channel.
//!
//! Persistence beyond the process lifetime is out of scope, so this is the
//! whole storage layer: every observed follow/subscription is recorded once
//! with a `dismissed` flag that starts false, is set true by a dismissal
//! command and never resets.

use compact_str::CompactString;
use osa_sdk::objects::EventStamp;

use super::{FollowRecord, SubscriptionRecord};

#[derive(Debug, Clone)]
struct Entry {
    username: CompactString,
    ts: Option<i64>,
    dismissed: bool,
}

/// Retained audience history for one channel.
#[derive(Debug, Default)]
pub struct SourceState {
    follows: Vec<Entry>,
    subscriptions: Vec<Entry>,
}

impl SourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a follow occurrence. A username already on record is not
    /// duplicated, and re-recording never resurrects a dismissed entry.
    pub fn record_follow(&mut self, username: &str, ts: Option<i64>) {
        if self.follows.iter().any(|e| e.username == username) {
            return;
        }
        self.follows.push(Entry {
            username: username.into(),
            ts,
            dismissed: false,
        });
    }

    /// Record a subscription occurrence, with the same once-per-username
    /// semantics as [`record_follow`](Self::record_follow).
    pub fn record_subscription(&mut self, username: &str, ts: Option<i64>) {
        if self.subscriptions.iter().any(|e| e.username == username) {
            return;
        }
        self.subscriptions.push(Entry {
            username: username.into(),
            ts,
            dismissed: false,
        });
    }

    /// Follow records not yet acknowledged, in insertion order.
    pub fn undismissed_follows(&self) -> Vec<FollowRecord> {
        self.follows
            .iter()
            .filter(|e| !e.dismissed)
            .map(|e| FollowRecord {
                username: e.username.clone(),
                follow: e.ts.map(|ts| EventStamp { ts }),
            })
            .collect()
    }

    /// Subscription records not yet acknowledged, in insertion order.
    pub fn undismissed_subscriptions(&self) -> Vec<SubscriptionRecord> {
        self.subscriptions
            .iter()
            .filter(|e| !e.dismissed)
            .map(|e| SubscriptionRecord {
                username: e.username.clone(),
                subscription: e.ts.map(|ts| EventStamp { ts }),
            })
            .collect()
    }

    /// Mark every follow record for `username` acknowledged. No-op when
    /// nothing matches.
    pub fn dismiss_follow(&mut self, username: &str) {
        for entry in self.follows.iter_mut().filter(|e| e.username == username) {
            entry.dismissed = true;
        }
    }

    /// Mark every subscription record for `username` acknowledged. No-op
    /// when nothing matches.
    pub fn dismiss_subscription(&mut self, username: &str) {
        for entry in self
            .subscriptions
            .iter_mut()
            .filter(|e| e.username == username)
        {
            entry.dismissed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_start_undismissed() {
        let mut state = SourceState::new();
        state.record_follow("nandor", Some(100));
        state.record_follow("guillermo", None);

        let pending = state.undismissed_follows();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].username, "nandor");
        assert_eq!(pending[0].follow, Some(EventStamp { ts: 100 }));
        assert_eq!(pending[1].follow, None);
    }

    #[test]
    fn dismissal_is_kind_scoped_and_idempotent() {
        let mut state = SourceState::new();
        state.record_follow("nadja", Some(100));
        state.record_subscription("nadja", Some(200));

        state.dismiss_follow("nadja");
        state.dismiss_follow("nadja");

        assert!(state.undismissed_follows().is_empty());
        // Subscription records for the same user are untouched.
        assert_eq!(state.undismissed_subscriptions().len(), 1);
    }

    #[test]
    fn dismissing_unknown_username_is_a_noop() {
        let mut state = SourceState::new();
        state.record_follow("laszlo", Some(1));
        state.dismiss_follow("baron");
        assert_eq!(state.undismissed_follows().len(), 1);
    }

    #[test]
    fn re_recording_does_not_resurrect_dismissed_entries() {
        let mut state = SourceState::new();
        state.record_follow("colin", Some(1));
        state.dismiss_follow("colin");
        state.record_follow("colin", Some(2));
        assert!(state.undismissed_follows().is_empty());
    }
}
