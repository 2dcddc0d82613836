//! Thermal source configuration types.

use serde::{Deserialize, Serialize};

use super::memory::default_update_interval;

/// Thermal source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalSourceConfig {
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
    /// Only consider sensors whose label contains this text (case-insensitive)
    #[serde(default)]
    pub sensor_filter: Option<String>,
}

impl Default for ThermalSourceConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval(),
            sensor_filter: None,
        }
    }
}

impl ThermalSourceConfig {
    /// Whether a sensor label passes the configured filter
    pub fn matches(&self, label: &str) -> bool {
        match &self.sensor_filter {
            Some(filter) if !filter.is_empty() => {
                label.to_lowercase().contains(&filter.to_lowercase())
            }
            _ => true,
        }
    }
}
