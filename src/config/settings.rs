//! Application configuration

use anyhow::{Context, Result};
use gathered_core::GatherError;
use gathered_types::{MemorySourceConfig, SourceConfig, ThermalSourceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Sources to create, in display order
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

fn default_version() -> u32 {
    1
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::Memory(MemorySourceConfig::default()),
        SourceConfig::Thermal(ThermalSourceConfig::default()),
    ]
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "gathered", "gathered")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Configs of the given source types, or every configured source when
    /// `ids` is empty. Types missing from the config get their defaults.
    pub fn select(&self, ids: &[String]) -> Result<Vec<SourceConfig>> {
        if ids.is_empty() {
            return Ok(self.sources.clone());
        }
        ids.iter()
            .map(|id| {
                self.sources
                    .iter()
                    .find(|cfg| cfg.source_type() == id)
                    .cloned()
                    .or_else(|| SourceConfig::default_for(id))
                    .ok_or_else(|| anyhow::Error::from(GatherError::UnknownSource(id.clone())))
            })
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            sources: default_sources(),
        }
    }
}
