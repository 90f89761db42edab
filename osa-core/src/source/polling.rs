//! Polling channel source.
//!
//! The production [`ChannelSource`]: polls the platform's roster endpoints
//! (followers, subscriptions, hosts) per channel, diffs each roster against
//! the previously seen one to detect new events, retains follow and
//! subscription history for undismissed queries, and relays live snapshots
//! from the shared [`LivePoller`].
//!
//! The first successful roster fetch only seeds the known sets; diffing
//! starts from the second fetch so a restart does not replay the whole
//! follower history as fresh alerts.

use crate::config::PlatformConfig;
use crate::events::{ChannelEvent, ChannelEventSender, SourceEvent};
use crate::registry::SourceFactory;
use crate::source::live::LivePoller;
use crate::source::state::SourceState;
use crate::source::{ChannelSource, FollowRecord, SourceError, SubscriptionRecord};
use crate::utils::{now_millis, poll_interval::poll_freq};
use async_trait::async_trait;
use compact_str::CompactString;
use osa_sdk::objects::ChannelData;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, info, warn};

/// One page of a roster endpoint (`followers`, `subscriptions`, `hosts`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterEntry {
    username: CompactString,
    /// When the relationship was created, epoch milliseconds. Not every
    /// platform record carries it.
    #[serde(default)]
    created_at: Option<i64>,
}

/// A [`ChannelSource`] backed by the streaming platform's REST API.
///
/// Constructing one immediately starts its poll loops; there is no
/// explicit start step.
pub struct PollingChannelSource {
    name: CompactString,
    state: Arc<Mutex<SourceState>>,
    data: Arc<RwLock<ChannelData>>,
}

impl PollingChannelSource {
    /// Validate the channel name, then construct the source and spawn its
    /// audience and live-relay loops.
    pub fn spawn(
        name: &str,
        config: PlatformConfig,
        http: reqwest::Client,
        events_tx: ChannelEventSender,
        live: &LivePoller,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Arc<Self>, SourceError> {
        validate_channel_name(name)?;

        let source = Arc::new(Self {
            name: name.into(),
            state: Arc::new(Mutex::new(SourceState::new())),
            data: Arc::new(RwLock::new(ChannelData::offline(name))),
        });

        source.spawn_live_relay(live, events_tx.clone(), shutdown_rx.clone());
        source.spawn_audience_loop(config, http, events_tx, shutdown_rx);
        info!(channel = %source.name, "channel source started");

        Ok(source)
    }

    /// Relay live snapshots for this channel: refresh the `data` view and
    /// emit a `DataUpdate` event per snapshot.
    fn spawn_live_relay(
        &self,
        live: &LivePoller,
        events_tx: ChannelEventSender,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let name = self.name.clone();
        let data = Arc::clone(&self.data);
        let mut live_rx = live.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }

                    update = live_rx.recv() => {
                        match update {
                            Ok(update) if update.channel == name => {
                                *data.write().await = update.data.clone();
                                let event = ChannelEvent {
                                    channel: name.clone(),
                                    event: SourceEvent::DataUpdate { data: update.data },
                                };
                                if events_tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                            Ok(_) => continue,
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                                warn!(channel = %name, skipped = n, "live relay lagged");
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    /// Poll the roster endpoints, diff against the known rosters and
    /// record/emit what is new.
    fn spawn_audience_loop(
        &self,
        config: PlatformConfig,
        http: reqwest::Client,
        events_tx: ChannelEventSender,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let name = self.name.clone();
        let state = Arc::clone(&self.state);
        let data = Arc::clone(&self.data);

        tokio::spawn(async move {
            let mut known_follows: HashSet<CompactString> = HashSet::new();
            let mut known_subs: HashSet<CompactString> = HashSet::new();
            let mut known_hosts: HashSet<CompactString> = HashSet::new();
            let mut seeded = false;
            let mut last_activity = time::OffsetDateTime::now_utc();

            loop {
                let live = data.read().await.live;
                let since_activity = time::OffsetDateTime::now_utc() - last_activity;
                let interval = poll_freq(live, since_activity);
                let sleep_duration =
                    std::time::Duration::from_secs(interval.whole_seconds().max(1) as u64);

                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!(channel = %name, "audience loop received shutdown signal");
                            break;
                        }
                    }

                    _ = tokio::time::sleep(sleep_duration) => {
                        let follows = fetch_roster(&http, &config, &name, "followers").await;
                        let subs = fetch_roster(&http, &config, &name, "subscriptions").await;
                        let hosts = fetch_roster(&http, &config, &name, "hosts").await;

                        let (follows, subs, hosts) = match (follows, subs, hosts) {
                            (Ok(f), Ok(s), Ok(h)) => (f, s, h),
                            (f, s, h) => {
                                for err in [f.err(), s.err(), h.err()].into_iter().flatten() {
                                    warn!(channel = %name, error = %err, "roster fetch failed");
                                }
                                continue;
                            }
                        };

                        if !seeded {
                            known_follows.extend(follows.into_iter().map(|e| e.username));
                            known_subs.extend(subs.into_iter().map(|e| e.username));
                            known_hosts.extend(hosts.into_iter().map(|e| e.username));
                            seeded = true;
                            debug!(channel = %name, "rosters seeded");
                            continue;
                        }

                        let mut fresh = false;

                        for entry in follows {
                            if !known_follows.insert(entry.username.clone()) {
                                continue;
                            }
                            fresh = true;
                            state.lock().await.record_follow(&entry.username, entry.created_at);
                            let event = ChannelEvent {
                                channel: name.clone(),
                                event: SourceEvent::Follow { username: entry.username },
                            };
                            if events_tx.send(event).await.is_err() {
                                return;
                            }
                        }

                        for entry in subs {
                            if !known_subs.insert(entry.username.clone()) {
                                continue;
                            }
                            fresh = true;
                            state.lock().await.record_subscription(&entry.username, entry.created_at);
                            let event = ChannelEvent {
                                channel: name.clone(),
                                event: SourceEvent::Subscription {
                                    username: entry.username,
                                    ts: entry.created_at.unwrap_or_else(now_millis),
                                },
                            };
                            if events_tx.send(event).await.is_err() {
                                return;
                            }
                        }

                        // A channel that stops hosting and hosts again later
                        // should alert again, so the known set mirrors the
                        // current roster instead of growing forever.
                        let current_hosts: HashSet<CompactString> =
                            hosts.iter().map(|e| e.username.clone()).collect();
                        for entry in hosts {
                            if known_hosts.contains(&entry.username) {
                                continue;
                            }
                            fresh = true;
                            let event = ChannelEvent {
                                channel: name.clone(),
                                event: SourceEvent::Host {
                                    hoster: entry.username,
                                    ts: entry.created_at.unwrap_or_else(now_millis),
                                },
                            };
                            if events_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                        known_hosts = current_hosts;

                        if fresh {
                            last_activity = time::OffsetDateTime::now_utc();
                        }
                    }
                }
            }
        });
    }
}

#[async_trait]
impl ChannelSource for PollingChannelSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_undismissed_follows(&self) -> Result<Vec<FollowRecord>, SourceError> {
        Ok(self.state.lock().await.undismissed_follows())
    }

    async fn find_undismissed_subscriptions(
        &self,
    ) -> Result<Vec<SubscriptionRecord>, SourceError> {
        Ok(self.state.lock().await.undismissed_subscriptions())
    }

    async fn dismiss_follow(&self, username: &str) -> Result<(), SourceError> {
        self.state.lock().await.dismiss_follow(username);
        Ok(())
    }

    async fn dismiss_subscription(&self, username: &str) -> Result<(), SourceError> {
        self.state.lock().await.dismiss_subscription(username);
        Ok(())
    }

    async fn data(&self) -> ChannelData {
        self.data.read().await.clone()
    }
}

/// Fetch one roster page for a channel.
async fn fetch_roster(
    http: &reqwest::Client,
    config: &PlatformConfig,
    channel: &str,
    roster: &str,
) -> Result<Vec<RosterEntry>, SourceError> {
    let url = config.endpoint(&format!("channels/{channel}/{roster}"))?;
    let response = http
        .get(url)
        .header("Client-ID", &config.client_id)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Api {
            status: status.as_u16(),
        });
    }

    Ok(response.json().await?)
}

/// Channel names are path segments of the platform API, so only a narrow
/// charset is accepted.
fn validate_channel_name(name: &str) -> Result<(), SourceError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidChannelName { name: name.into() })
    }
}

/// Creates [`PollingChannelSource`] instances for the registry, wiring
/// each one to the shared event channel and live poller.
pub struct PollingSourceFactory {
    config: PlatformConfig,
    http: reqwest::Client,
    events_tx: ChannelEventSender,
    live: Arc<LivePoller>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollingSourceFactory {
    pub fn new(
        config: PlatformConfig,
        events_tx: ChannelEventSender,
        live: Arc<LivePoller>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            events_tx,
            live,
            shutdown_rx,
        }
    }
}

#[async_trait]
impl SourceFactory for PollingSourceFactory {
    async fn create(&self, name: &str) -> Result<Arc<dyn ChannelSource>, SourceError> {
        let source = PollingChannelSource::spawn(
            name,
            self.config.clone(),
            self.http.clone(),
            self.events_tx.clone(),
            &self.live,
            self.shutdown_rx.clone(),
        )?;
        let _ = self
            .live
            .spawn_watch(name.into(), self.shutdown_rx.clone());
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name_validation() {
        assert!(validate_channel_name("the_baron").is_ok());
        assert!(validate_channel_name("Nadja1992").is_ok());
        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name("no spaces").is_err());
        assert!(validate_channel_name("sl/ash").is_err());
    }
}
