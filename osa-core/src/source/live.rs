//! Live-status poller.
//!
//! One `LivePoller` instance serves every registered channel: it owns a
//! broadcast channel of [`LiveUpdate`] snapshots and runs one watch loop
//! per channel. Each loop fetches the channel endpoint, broadcasts the
//! fresh snapshot and sleeps for an interval that adapts to the channel's
//! live status (live channels are refreshed faster than offline ones).

use crate::config::PlatformConfig;
use crate::events::LiveUpdate;
use crate::source::SourceError;
use crate::utils::{now_millis, poll_interval::poll_freq};
use compact_str::CompactString;
use osa_sdk::objects::ChannelData;
use serde::Deserialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffer for live snapshot broadcasts; watchers that lag simply miss
/// intermediate snapshots.
const LIVE_UPDATE_BUFFER: usize = 64;

/// Wire shape of the platform's channel endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelResponse {
    online: bool,
    #[serde(default)]
    viewers_current: u64,
    #[serde(default)]
    num_followers: u64,
    #[serde(default)]
    name: Option<String>,
}

/// Shared poller that refreshes per-channel live metadata.
pub struct LivePoller {
    update_tx: broadcast::Sender<LiveUpdate>,
    http: reqwest::Client,
    config: PlatformConfig,
}

impl LivePoller {
    /// Create a new LivePoller for the given platform.
    pub fn new(config: PlatformConfig) -> Self {
        let (update_tx, _) = broadcast::channel(LIVE_UPDATE_BUFFER);
        Self {
            update_tx,
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    /// Subscribe to snapshot broadcasts. Every watcher sees snapshots for
    /// all channels and filters on [`LiveUpdate::channel`].
    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.update_tx.subscribe()
    }

    /// Spawn the watch loop for one channel.
    ///
    /// The loop runs until the shutdown signal fires. Fetch failures are
    /// logged and retried on the next tick; they never terminate the loop.
    pub fn spawn_watch(
        &self,
        channel: CompactString,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let update_tx = self.update_tx.clone();
        let http = self.http.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let mut live = false;
            let mut last_change = time::OffsetDateTime::now_utc();
            info!(%channel, "live watch started");

            loop {
                let since_change = time::OffsetDateTime::now_utc() - last_change;
                let interval = poll_freq(live, since_change);
                let sleep_duration =
                    std::time::Duration::from_secs(interval.whole_seconds().max(1) as u64);

                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!(%channel, "live watch received shutdown signal");
                            break;
                        }
                    }

                    _ = tokio::time::sleep(sleep_duration) => {
                        match fetch_snapshot(&http, &config, &channel).await {
                            Ok(data) => {
                                if data.live != live {
                                    last_change = time::OffsetDateTime::now_utc();
                                    live = data.live;
                                }
                                debug!(%channel, live = data.live, viewers = data.viewers, "live snapshot refreshed");
                                // Nobody subscribed yet is fine.
                                let _ = update_tx.send(LiveUpdate {
                                    channel: channel.clone(),
                                    data,
                                });
                            }
                            Err(e) => {
                                warn!(%channel, error = %e, "live snapshot fetch failed");
                            }
                        }
                    }
                }
            }
        })
    }
}

/// Fetch the current snapshot of one channel from the platform API.
async fn fetch_snapshot(
    http: &reqwest::Client,
    config: &PlatformConfig,
    channel: &str,
) -> Result<ChannelData, SourceError> {
    let url = config.endpoint(&format!("channels/{channel}"))?;
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

    let body: ChannelResponse = response.json().await?;
    Ok(ChannelData {
        name: channel.into(),
        live: body.online,
        viewers: body.viewers_current,
        followers: body.num_followers,
        title: body.name,
        updated_at: now_millis(),
    })
}
