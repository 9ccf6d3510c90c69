//! Application configuration

use anyhow::{bail, Context, Result};
use dripwatch_types::display_configs::DripViewConfig;
use dripwatch_types::source_configs::{SensorConfig, SimulatedSensorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current config format version
pub const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_views() -> Vec<DripViewConfig> {
    DripViewConfig::defaults()
}

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Weight sensor endpoint and polling cadence
    #[serde(default)]
    pub sensor: SensorConfig,
    /// When set, readings come from a simulated bag instead of the endpoint
    #[serde(default)]
    pub simulation: Option<SimulatedSensorConfig>,
    /// Dashboard views over the weight feed
    #[serde(default = "default_views")]
    pub views: Vec<DripViewConfig>,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if no file exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "dripwatch", "dripwatch")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the values the poller relies on
    pub fn validate(&self) -> Result<()> {
        if self.simulation.is_none() && self.sensor.base_url.trim().is_empty() {
            bail!("sensor.base_url must be set (or enable simulation)");
        }
        if self.sensor.poll_interval_ms == 0 {
            bail!("sensor.poll_interval_ms must be greater than 0");
        }
        if self.sensor.request_timeout_ms == 0 {
            bail!("sensor.request_timeout_ms must be greater than 0");
        }
        for view in &self.views {
            if view.scaling.reference_volume <= 0.0 {
                bail!("view '{}' has a non-positive reference volume", view.id);
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            sensor: SensorConfig::default(),
            simulation: None,
            views: default_views(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_needs_base_url() {
        let config = AppConfig::default();
        assert_eq!(config.views.len(), 3);
        assert!(config.validate().is_err());

        let mut config = config;
        config.sensor.base_url = "http://192.168.236.194:8000".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_simulation_does_not_need_base_url() {
        let config = AppConfig {
            simulation: Some(SimulatedSensorConfig::default()),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.sensor.base_url = "http://localhost:8000".to_string();
        config.sensor.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_minimal_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"sensor": {"base_url": "http://localhost:8000"}}"#).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.sensor.poll_interval_ms, 2000);
        assert_eq!(config.views, DripViewConfig::defaults());
        assert!(config.simulation.is_none());
    }

    #[test]
    fn test_save_and_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.sensor.base_url = "http://10.0.0.2:8000".to_string();
        config.sensor.poll_interval_ms = 500;
        config.save_to_path(&path).unwrap();

        let loaded = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load_from_path(&dir.path().join("absent.json")).is_err());
    }
}
