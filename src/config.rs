use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const CONFIG_ENV: &str = "VIMEO_BRIDGE_CONFIG";

const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 5000;
const DEFAULT_OEMBED_ENDPOINT: &str = "https://vimeo.com/api/oembed.json";
const DEFAULT_PLAYER_API_URL: &str = "https://player.vimeo.com/api/player.js";
const DEFAULT_CONTAINER_ID: &str = "vimeo-player";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read bridge config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        source: url::ParseError,
    },
    #[error("{0}")]
    InvalidValue(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// How long a command waits for its reply before resolving to a default.
    pub command_timeout_ms: u64,
    pub oembed_endpoint: String,
    /// Script tag source for the player API inside the rendered document.
    pub player_api_url: String,
    pub container_id: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
            player_api_url: DEFAULT_PLAYER_API_URL.to_string(),
            container_id: DEFAULT_CONTAINER_ID.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load from `config_path`. A missing path or file yields the defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                if contents.trim().is_empty() {
                    Self::default()
                } else {
                    serde_yaml::from_str(&contents)?
                }
            }
            _ => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `$VIMEO_BRIDGE_CONFIG`, else the per-user config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);
        if let Some(path) = &path {
            tracing::debug!(target: "bridge", path = %path.display(), "loading bridge config");
        }
        Self::load(path.as_deref())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("command_timeout_ms must be positive"));
        }
        if self.container_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("container_id must not be empty"));
        }
        for (field, value) in [
            ("oembed_endpoint", &self.oembed_endpoint),
            ("player_api_url", &self.player_api_url),
        ] {
            Url::parse(value).map_err(|source| ConfigError::InvalidUrl { field, source })?;
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "VimeoBridge", "vimeo-bridge")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_default() {
        let config = BridgeConfig::load(None).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.command_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config.container_id, "vimeo-player");
    }

    #[test]
    fn loads_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "command_timeout_ms: 250\ncontainer_id: stage").unwrap();
        let config = BridgeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.command_timeout_ms, 250);
        assert_eq!(config.container_id, "stage");
        assert_eq!(config.oembed_endpoint, DEFAULT_OEMBED_ENDPOINT);
    }

    #[test]
    fn rejects_bad_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "oembed_endpoint: not a url").unwrap();
        assert!(matches!(
            BridgeConfig::load(Some(file.path())),
            Err(ConfigError::InvalidUrl {
                field: "oembed_endpoint",
                ..
            })
        ));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "command_timeout_ms: 0").unwrap();
        assert!(matches!(
            BridgeConfig::load(Some(file.path())),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timeout: 3").unwrap();
        assert!(matches!(
            BridgeConfig::load(Some(file.path())),
            Err(ConfigError::Yaml(_))
        ));
    }
}
