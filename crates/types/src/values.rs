//! Value types carried by properties

use crate::Availability;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-axis reading (acceleration, rotation rate, magnetic field, ...)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// One position report from a location service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Meters above sea level
    pub altitude: Option<f64>,
    /// Radius of uncertainty in meters
    pub horizontal_accuracy: Option<f64>,
    /// When the fix was taken by the service
    pub timestamp: DateTime<Utc>,
}

/// Coarse thermal pressure of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalState {
    Nominal,
    Fair,
    Serious,
    Critical,
}

/// Critical temperature assumed for sensors that do not report one
pub const DEFAULT_CRITICAL_CELSIUS: f32 = 100.0;

impl ThermalState {
    /// Classify a temperature against the sensor's critical threshold
    pub fn classify(temperature: f32, critical: Option<f32>) -> Self {
        let critical = critical
            .filter(|c| c.is_finite() && *c > 0.0)
            .unwrap_or(DEFAULT_CRITICAL_CELSIUS);
        let ratio = temperature / critical;
        if ratio < 0.70 {
            ThermalState::Nominal
        } else if ratio < 0.85 {
            ThermalState::Fair
        } else if ratio < 0.95 {
            ThermalState::Serious
        } else {
            ThermalState::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThermalState::Nominal => "Nominal",
            ThermalState::Fair => "Fair",
            ThermalState::Serious => "Serious",
            ThermalState::Critical => "Critical",
        }
    }
}

impl fmt::Display for ThermalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization status reported by a location service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationAuthorization {
    #[default]
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl LocationAuthorization {
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            LocationAuthorization::AuthorizedWhenInUse | LocationAuthorization::AuthorizedAlways
        )
    }

    pub fn availability(&self) -> Availability {
        match self {
            LocationAuthorization::NotDetermined => Availability::RequiresPermissionsPrompt,
            LocationAuthorization::Restricted => Availability::Restricted,
            LocationAuthorization::Denied => Availability::PermissionDenied,
            LocationAuthorization::AuthorizedWhenInUse
            | LocationAuthorization::AuthorizedAlways => Availability::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationAuthorization::NotDetermined => "Not Determined",
            LocationAuthorization::Restricted => "Restricted",
            LocationAuthorization::Denied => "Denied",
            LocationAuthorization::AuthorizedWhenInUse => "When In Use",
            LocationAuthorization::AuthorizedAlways => "Always",
        }
    }
}

impl fmt::Display for LocationAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
