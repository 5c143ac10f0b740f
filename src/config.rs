use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// obs-websocket endpoint
    #[serde(default = "default_url")]
    pub url: String,

    /// Pause between a successful StartReplayBuffer and the follow-up save
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Give up waiting for a response after this many seconds (wait forever if unset)
    #[serde(default)]
    pub response_timeout_secs: Option<u64>,

    /// Exit with status 1 when OBS rejects a request or the connection fails
    #[serde(default = "default_exit_nonzero_on_failure")]
    pub exit_nonzero_on_failure: bool,
}

fn default_url() -> String {
    "ws://localhost:4455".to_string()
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_exit_nonzero_on_failure() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            settle_delay_ms: default_settle_delay_ms(),
            response_timeout_secs: None,
            exit_nonzero_on_failure: default_exit_nonzero_on_failure(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/obsctl/config.json)
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(config_path) => Self::load_from(&config_path),
            Err(e) => {
                tracing::warn!("{:#}, using default config", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from `config_path`, writing the defaults there if the file is missing.
    /// Failing to write the defaults is not fatal.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save_to(config_path) {
                tracing::warn!("{:#}, continuing with defaults", e);
            }
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::debug!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("obsctl").join("config.json"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(anyhow::anyhow!("url cannot be empty"));
        }

        // Built without TLS support, so only plain ws:// endpoints work
        if !self.url.starts_with("ws://") {
            return Err(anyhow::anyhow!("url must start with ws://, got {}", self.url));
        }

        if self.response_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!(
                "response_timeout_secs must be positive (omit it to wait forever)"
            ));
        }

        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_secs.map(Duration::from_secs)
    }
}
