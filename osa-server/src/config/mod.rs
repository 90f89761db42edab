//! Configuration module for osa-server.
//!
//! Handles loading configuration from the TOML file and CLI arguments.
//! Missing configuration or a missing/empty channel list is startup-fatal:
//! the process refuses to start rather than running with nothing to watch.

pub mod file;

use crate::config::file::FileConfig;
use compact_str::CompactString;
use osa_core::config::PlatformConfig;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("no channels present in the config file")]
    NoChannels,
}

/// Loaded and validated configuration.
#[derive(Debug)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub platform: PlatformConfig,
    pub channels: Vec<CompactString>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and validate the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Refuse an absent or empty channel list
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        if file_config.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }

        Ok(LoadedConfig {
            listen: file_config.server.listen,
            platform: PlatformConfig {
                api_base: file_config.platform.api_base,
                client_id: file_config.platform.client_id,
            },
            channels: file_config
                .channels
                .into_iter()
                .map(CompactString::from)
                .collect(),
        })
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_config(content: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "osa-config-test-{}.toml",
            std::process::id() as u64 + content.len() as u64
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn empty_channel_list_refuses_startup() {
        let path = write_temp_config(
            r#"
[platform]
api_base = "https://api.example.tv/v1/"
client_id = "osa-dev"

channels = []
"#,
        );
        let err = ConfigLoader::new(&path, None).load().unwrap_err();
        assert!(matches!(err, ConfigError::NoChannels));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn listen_override_wins_over_file() {
        let path = write_temp_config(
            r#"
channels = ["nandor"]

[server]
listen = "127.0.0.1:3000"

[platform]
api_base = "https://api.example.tv/v1/"
client_id = "osa-dev"
"#,
        );
        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let config = ConfigLoader::new(&path, Some(listen)).load().unwrap();
        assert_eq!(config.listen, listen);
        assert_eq!(config.channels, vec!["nandor"]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = ConfigLoader::new("/nonexistent/osa-config.toml", None)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
