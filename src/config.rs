//! Configuration management for the haptic playback core
//!
//! This module provides runtime configuration loading from JSON files so
//! channel sizes, telemetry retention and simulator limits can be adjusted
//! without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
    pub simulator: SimulatorConfig,
}

/// Engine lifecycle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the lifecycle broadcast channel
    pub lifecycle_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lifecycle_buffer: 64,
        }
    }
}

/// Diagnostics collector sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Capacity of the diagnostics broadcast channel
    pub channel_capacity: usize,
    /// Number of recent diagnostics kept for snapshots
    pub history_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_capacity: 64,
        }
    }
}

/// Simulated backend behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Report haptics hardware as present
    pub supports_haptics: bool,
    /// Largest pattern the simulated backend accepts
    pub max_events: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            supports_haptics: true,
            max_events: 4096,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// the JSON is invalid.
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

    pub fn load() -> Self {
        Self::load_from_file("assets/haptic_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.lifecycle_buffer, 64);
        assert_eq!(config.telemetry.history_capacity, 64);
        assert!(config.simulator.supports_haptics);
        assert_eq!(config.simulator.max_events, 4096);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"simulator":{"supports_haptics":false}}"#).unwrap();
        assert!(!parsed.simulator.supports_haptics);
        assert_eq!(parsed.simulator.max_events, 4096);
        assert_eq!(parsed.engine.lifecycle_buffer, 64);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/haptic_config.json");
        assert_eq!(config.telemetry.channel_capacity, 256);
    }

    #[test]
    fn test_invalid_json_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!(
            "haptic_pulse_invalid_config_{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config.engine.lifecycle_buffer, 64);
    }
}
