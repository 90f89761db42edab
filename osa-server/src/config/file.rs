//! TOML file configuration structures.
//!
//! These structs directly map to the `osa-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub platform: PlatformSection,
    /// The channels to watch. An absent or empty list refuses startup.
    #[serde(default)]
    pub channels: Vec<String>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Streaming platform API section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSection {
    /// Root of the platform API. A trailing slash matters for joining.
    pub api_base: Url,
    /// The per-process client identification sent with every request.
    pub client_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
channels = ["nandor", "laszlo"]

[server]
listen = "127.0.0.1:3000"

[platform]
api_base = "https://api.example.tv/v1/"
client_id = "osa-dev"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.platform.client_id, "osa-dev");
        assert_eq!(config.channels, vec!["nandor", "laszlo"]);
    }

    #[test]
    fn test_listen_defaults_when_absent() {
        let toml_str = r#"
[platform]
api_base = "https://api.example.tv/v1/"
client_id = "osa-dev"

channels = ["nadja"]
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
    }

    #[test]
    fn test_channels_default_to_empty() {
        let toml_str = r#"
[platform]
api_base = "https://api.example.tv/v1/"
client_id = "osa-dev"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.channels.is_empty());
    }
}
