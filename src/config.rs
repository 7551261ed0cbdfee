//! Configuration management for the step tracker core
//!
//! This module provides runtime configuration loading from JSON files so the
//! sensor rate, channel sizes and log level can be adjusted without
//! recompiling. Missing or invalid files fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::backend::SensorDelay;

/// Default config location for desktop runs
pub const DEFAULT_CONFIG_PATH: &str = "assets/steppo_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub channels: ChannelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Step counter subscription parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Sampling rate hint passed to the backend on subscribe
    #[serde(default)]
    pub delay: SensorDelay,
}

/// Broadcast channel sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Snapshot channel buffer (messages)
    pub snapshot_buffer: usize,
    /// Telemetry channel buffer (messages)
    pub telemetry_buffer: usize,
    /// Telemetry events retained for snapshots
    pub telemetry_history: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            snapshot_buffer: 64,
            telemetry_buffer: 128,
            telemetry_history: 64,
        }
    }
}

/// Logging parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Android logcat tag
    pub tag: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            tag: "Steppo".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level, falling back to INFO
    pub fn max_level(&self) -> tracing::Level {
        self.level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO)
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Android builds ship without a config file; use defaults
    #[cfg(target_os = "android")]
    pub fn load_android() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration for non-Android platforms
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration for the current platform
    pub fn load_platform() -> Self {
        #[cfg(target_os = "android")]
        {
            Self::load_android()
        }

        #[cfg(not(target_os = "android"))]
        {
            Self::load()
        }
    }
}
