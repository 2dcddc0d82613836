//! Memory source configuration types.

use serde::{Deserialize, Serialize};

pub(crate) fn default_update_interval() -> u64 {
    1000
}

/// Memory source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySourceConfig {
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
    /// Also publish swap usage
    #[serde(default = "default_include_swap")]
    pub include_swap: bool,
}

fn default_include_swap() -> bool {
    true
}

impl Default for MemorySourceConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval(),
            include_swap: default_include_swap(),
        }
    }
}
