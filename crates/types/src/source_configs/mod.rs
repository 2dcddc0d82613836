//! Source configuration types for all built-in sources.

pub mod location;
pub mod memory;
pub mod thermal;

pub use location::{LocationSourceConfig, SimulatedPosition};
pub use memory::MemorySourceConfig;
pub use thermal::ThermalSourceConfig;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Type-safe enum for all source configurations.
/// Uses serde tag for JSON serialization: {"source_type": "memory", ...}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type")]
pub enum SourceConfig {
    #[serde(rename = "memory")]
    Memory(MemorySourceConfig),

    #[serde(rename = "thermal")]
    Thermal(ThermalSourceConfig),

    #[serde(rename = "location")]
    Location(LocationSourceConfig),
}

impl SourceConfig {
    /// Get the source type ID string
    pub fn source_type(&self) -> &'static str {
        match self {
            SourceConfig::Memory(_) => "memory",
            SourceConfig::Thermal(_) => "thermal",
            SourceConfig::Location(_) => "location",
        }
    }

    /// Polling interval, for sources that poll
    pub fn update_interval(&self) -> Option<Duration> {
        match self {
            SourceConfig::Memory(cfg) => Some(Duration::from_millis(cfg.update_interval_ms)),
            SourceConfig::Thermal(cfg) => Some(Duration::from_millis(cfg.update_interval_ms)),
            SourceConfig::Location(_) => None,
        }
    }

    /// Default configuration for a source type ID
    pub fn default_for(source_type: &str) -> Option<Self> {
        match source_type {
            "memory" => Some(SourceConfig::Memory(MemorySourceConfig::default())),
            "thermal" => Some(SourceConfig::Thermal(ThermalSourceConfig::default())),
            "location" => Some(SourceConfig::Location(LocationSourceConfig::default())),
            _ => None,
        }
    }
}
