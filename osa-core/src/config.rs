//! Validated runtime configuration for the aggregation engine.
//!
//! These types are the checked form of the server's TOML sections; the
//! actual file loading and validation lives in the server crate.

use serde::{Deserialize, Serialize};
use url::Url;

/// Connection parameters for the streaming platform's REST API, shared by
/// every channel source and the live-status poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Root of the platform API, e.g. `https://api.example.tv/v1/`.
    /// Joined with relative paths, so a trailing slash matters.
    pub api_base: Url,
    /// The per-process client identification sent with every request.
    pub client_id: String,
}

impl PlatformConfig {
    /// Resolve an API path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.api_base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_relative_paths() {
        let config = PlatformConfig {
            api_base: Url::parse("https://api.example.tv/v1/").unwrap(),
            client_id: "osa-test".into(),
        };
        let url = config.endpoint("channels/nandor").unwrap();
        assert_eq!(url.as_str(), "https://api.example.tv/v1/channels/nandor");
    }
}
