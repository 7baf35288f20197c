//! Configuration management for lpadder
//!
//! Handles loading, parsing and validating the YAML configuration file.
//! Every section is optional and falls back to its defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::devices::{ReconcilerSettings, UnmatchedOutputPolicy};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub midi: MidiConfig,
    pub devices: DevicesConfig,
    pub storage: StorageConfig,
}

/// MIDI backend configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Client name announced to the MIDI backend
    pub client_name: String,
    /// Request SysEx permission (needed to identify launchpads)
    pub sysex: bool,
    /// How often the port lists are polled for hot-plug
    pub poll_interval_ms: u64,
}

/// Device reconciliation timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DevicesConfig {
    pub settle_delay_ms: u64,
    pub debounce_ms: u64,
    pub guess_timeout_ms: u64,
    /// How long a SysEx probe waits for the identity reply; below `guess_timeout_ms`
    pub probe_timeout_ms: u64,
    pub unmatched_output: UnmatchedOutputPolicy,
}

/// Storage locations; `None` uses the application data directory
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<PathBuf>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: "lpadder".to_string(),
            sysex: true,
            poll_interval_ms: 250,
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 50,
            debounce_ms: 100,
            guess_timeout_ms: 1000,
            probe_timeout_ms: 750,
            unmatched_output: UnmatchedOutputPolicy::Skip,
        }
    }
}

impl DevicesConfig {
    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            debounce: Duration::from_millis(self.debounce_ms),
            guess_timeout: Duration::from_millis(self.guess_timeout_ms),
            unmatched_output: self.unmatched_output,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl MidiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml(&contents).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Load the file if it exists, defaults otherwise
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate YAML
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults config
        let config: AppConfig = if contents.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.midi.client_name.trim().is_empty() {
            anyhow::bail!("midi.client_name cannot be empty");
        }
        if self.midi.poll_interval_ms == 0 {
            anyhow::bail!("midi.poll_interval_ms must be greater than 0");
        }
        if self.devices.debounce_ms == 0 {
            anyhow::bail!("devices.debounce_ms must be greater than 0");
        }
        if self.devices.guess_timeout_ms == 0 {
            anyhow::bail!("devices.guess_timeout_ms must be greater than 0");
        }
        if self.devices.probe_timeout_ms == 0 || self.devices.probe_timeout_ms >= self.devices.guess_timeout_ms {
            anyhow::bail!("devices.probe_timeout_ms must be between 0 and devices.guess_timeout_ms (exclusive)");
        }

        Ok(())
    }
}
