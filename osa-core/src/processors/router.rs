//! EventRouter processor.
//!
//! The EventRouter is responsible for:
//! - Consuming `ChannelEvent`s from every registered channel source
//! - Wrapping follows, subscriptions and hosts in [`EventEnvelope`]s
//!   (follows are stamped at forwarding time, the rest carry the
//!   source-observed timestamp)
//! - Forwarding data updates as raw `(channel, data)` pairs
//! - Mirroring every forwarded alert to the bus `log` topic
//!
//! Forwarding preserves the order events arrive from one source; relative
//! order across sources is whatever the shared channel happens to deliver.

use crate::events::{ChannelEvent, ChannelEventReceiver, OutboundSender, SourceEvent};
use crate::utils::now_millis;
use kanau::processor::Processor;
use osa_sdk::objects::{BusServerMessage, EventEnvelope, EventKind};
use std::convert::Infallible;
use tokio::sync::watch;
use tracing::info;

/// EventRouter forwards typed source events to the outbound bus.
pub struct EventRouter {
    outbound_tx: OutboundSender,
}

impl EventRouter {
    /// Create a new EventRouter writing to the given outbound bus.
    pub fn new(outbound_tx: OutboundSender) -> Self {
        Self { outbound_tx }
    }

    /// Run the EventRouter until shutdown is signaled or every source
    /// sender is gone.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut event_rx: ChannelEventReceiver,
    ) {
        info!("EventRouter started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("EventRouter received shutdown signal");
                        break;
                    }
                }

                event = event_rx.recv() => {
                    match event {
                        Some(event) => {
                            let _ = self.process(event).await;
                        }
                        None => {
                            info!("ChannelEvent channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("EventRouter shutdown complete");
    }

    /// Mirror a line to the logging sink and the bus `log` topic.
    fn log(&self, message: String) {
        info!("{message}");
        let _ = self.outbound_tx.send(BusServerMessage::Log { message });
    }

    /// Forward a frame; a bus with no subscribers is not an error.
    fn forward(&self, frame: BusServerMessage) {
        let _ = self.outbound_tx.send(frame);
    }
}

impl Processor<ChannelEvent> for EventRouter {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, incoming: ChannelEvent) -> Result<(), Infallible> {
        let ChannelEvent { channel, event } = incoming;
        match event {
            SourceEvent::Follow { username } => {
                self.log(format!("Follow: {username}"));
                self.forward(BusServerMessage::Follow {
                    event: EventEnvelope {
                        username,
                        kind: EventKind::Follow,
                        channel,
                        ts: now_millis(),
                    },
                });
            }
            SourceEvent::Subscription { username, ts } => {
                self.log(format!("Sub: {username}"));
                self.forward(BusServerMessage::Subscription {
                    event: EventEnvelope {
                        username,
                        kind: EventKind::Subscription,
                        channel,
                        ts,
                    },
                });
            }
            SourceEvent::Host { hoster, ts } => {
                self.log(format!("Host: {hoster}"));
                self.forward(BusServerMessage::Host {
                    event: EventEnvelope {
                        username: hoster,
                        kind: EventKind::Host,
                        channel,
                        ts,
                    },
                });
            }
            SourceEvent::DataUpdate { data } => {
                self.forward(BusServerMessage::Update { channel, data });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::outbound_channel;
    use osa_sdk::objects::ChannelData;

    #[tokio::test]
    async fn follow_is_forwarded_as_envelope_with_stamp() {
        let outbound_tx = outbound_channel();
        let mut rx = outbound_tx.subscribe();
        let router = EventRouter::new(outbound_tx);

        let before = now_millis();
        let _ = router
            .process(ChannelEvent {
                channel: "laszlo".into(),
                event: SourceEvent::Follow {
                    username: "guillermo".into(),
                },
            })
            .await;
        let after = now_millis();

        // Log mirror first, then the envelope.
        let log = rx.recv().await.unwrap();
        assert_eq!(
            log,
            BusServerMessage::Log {
                message: "Follow: guillermo".into()
            }
        );

        let frame = rx.recv().await.unwrap();
        let BusServerMessage::Follow { event } = frame else {
            panic!("expected follow frame, got {frame:?}");
        };
        assert_eq!(event.kind, EventKind::Follow);
        assert_eq!(event.channel, "laszlo");
        assert_eq!(event.username, "guillermo");
        assert!(event.ts >= before && event.ts <= after);
    }

    #[tokio::test]
    async fn host_envelope_carries_the_hoster() {
        let outbound_tx = outbound_channel();
        let mut rx = outbound_tx.subscribe();
        let router = EventRouter::new(outbound_tx);

        let _ = router
            .process(ChannelEvent {
                channel: "nadja".into(),
                event: SourceEvent::Host {
                    hoster: "the_baron".into(),
                    ts: 4242,
                },
            })
            .await;

        let _log = rx.recv().await.unwrap();
        let frame = rx.recv().await.unwrap();
        let BusServerMessage::Host { event } = frame else {
            panic!("expected host frame, got {frame:?}");
        };
        assert_eq!(event.username, "the_baron");
        assert_eq!(event.ts, 4242);
    }

    #[tokio::test]
    async fn data_update_is_not_an_envelope_and_not_logged() {
        let outbound_tx = outbound_channel();
        let mut rx = outbound_tx.subscribe();
        let router = EventRouter::new(outbound_tx);

        let _ = router
            .process(ChannelEvent {
                channel: "colin".into(),
                event: SourceEvent::DataUpdate {
                    data: ChannelData::offline("colin"),
                },
            })
            .await;

        let frame = rx.recv().await.unwrap();
        let BusServerMessage::Update { channel, data } = frame else {
            panic!("expected update frame, got {frame:?}");
        };
        assert_eq!(channel, "colin");
        assert!(!data.live);
        // No log mirror for updates.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn forwarding_without_subscribers_is_fine() {
        let router = EventRouter::new(outbound_channel());
        let _ = router
            .process(ChannelEvent {
                channel: "nandor".into(),
                event: SourceEvent::Subscription {
                    username: "jenna".into(),
                    ts: 1,
                },
            })
            .await;
    }
}
