//! Channel registry.
//!
//! Owns exactly one [`ChannelSource`] per configured channel name. Entries
//! are created lazily by [`ensure`](ChannelRegistry::ensure) and live for
//! the process lifetime; there is no removal or replacement operation, so
//! the map only ever grows. Registration is expected to complete before
//! the server starts answering queries; later `ensure` calls (config
//! reload) only append.

use crate::source::{ChannelSource, SourceError};
use async_trait::async_trait;
use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Constructs channel sources on behalf of the registry.
///
/// Implementations wire the new source to the shared event channel so it
/// starts producing events immediately; the registry itself never touches
/// source internals.
#[async_trait]
pub trait SourceFactory: Send + Sync {
    async fn create(&self, name: &str) -> Result<Arc<dyn ChannelSource>, SourceError>;
}

/// Outcome of one [`ensure`](ChannelRegistry::ensure) pass.
#[derive(Debug, Default)]
pub struct EnsureReport {
    /// Names registered by this pass.
    pub created: Vec<CompactString>,
    /// Names that were already registered (no-op).
    pub already_registered: u32,
    /// Names whose source construction failed. Failures are isolated per
    /// name; the remaining names still register.
    pub failures: Vec<(CompactString, SourceError)>,
}

impl EnsureReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The registry of per-channel event sources.
pub struct ChannelRegistry {
    sources: RwLock<HashMap<CompactString, Arc<dyn ChannelSource>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Register every name not already present.
    ///
    /// Idempotent per name: presence is checked in the registry map, so a
    /// second call with the same name never constructs a second source.
    /// Each construction is wrapped independently; one bad channel does
    /// not block the rest.
    pub async fn ensure(
        &self,
        names: &[CompactString],
        factory: &dyn SourceFactory,
    ) -> EnsureReport {
        let mut report = EnsureReport::default();
        let mut sources = self.sources.write().await;

        for name in names {
            if sources.contains_key(name) {
                debug!(channel = %name, "channel already registered");
                report.already_registered += 1;
                continue;
            }
            match factory.create(name).await {
                Ok(source) => {
                    sources.insert(name.clone(), source);
                    report.created.push(name.clone());
                }
                Err(e) => {
                    error!(channel = %name, error = %e, "channel source construction failed");
                    report.failures.push((name.clone(), e));
                }
            }
        }

        info!(
            created = report.created.len(),
            existing = report.already_registered,
            failed = report.failures.len(),
            "channel registration pass complete"
        );
        report
    }

    /// Look up one channel's source.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn ChannelSource>> {
        self.sources.read().await.get(name).cloned()
    }

    /// Snapshot of every registered source, for fan-out operations.
    /// Iteration order across channels is unspecified.
    pub async fn sources(&self) -> Vec<Arc<dyn ChannelSource>> {
        self.sources.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sources.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sources.read().await.is_empty()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
