//! Location source configuration types.
//!
//! Hosts without a native location service use the simulated provider, which
//! is driven entirely by this configuration.

use serde::{Deserialize, Serialize};

use crate::LocationAuthorization;

/// Fixed position reported by the simulated provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedPosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub horizontal_accuracy: Option<f64>,
}

/// Location source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSourceConfig {
    /// Authorization status the provider starts with
    #[serde(default)]
    pub authorization: LocationAuthorization,
    /// Answer given to a permission prompt. `None` leaves the prompt pending.
    #[serde(default)]
    pub grant_on_request: Option<bool>,
    /// Position reported once updates start
    #[serde(default)]
    pub position: Option<SimulatedPosition>,
}

impl Default for LocationSourceConfig {
    fn default() -> Self {
        Self {
            authorization: LocationAuthorization::NotDetermined,
            grant_on_request: Some(true),
            position: None,
        }
    }
}
