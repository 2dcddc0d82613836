//! Source identity and availability classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a source can currently deliver data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// The source can start updating right away
    Available,
    /// The user has not decided yet; starting will ask for permission
    RequiresPermissionsPrompt,
    /// Access is blocked by policy and cannot be granted by the user
    Restricted,
    /// The user refused access
    PermissionDenied,
    /// The hardware or service does not exist on this host
    Unavailable,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::RequiresPermissionsPrompt => "Requires Permission",
            Availability::Restricted => "Restricted",
            Availability::PermissionDenied => "Permission Denied",
            Availability::Unavailable => "Unavailable",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the kind of a source (e.g. `"memory"`, `"location"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceIdentifier(String);

impl SourceIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_available_is_available() {
        assert!(Availability::Available.is_available());
        assert!(!Availability::RequiresPermissionsPrompt.is_available());
        assert!(!Availability::PermissionDenied.is_available());
    }

    #[test]
    fn test_identifier_serializes_as_string() {
        let id = SourceIdentifier::from("memory");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"memory\"");
        assert_eq!(id.to_string(), "memory");
    }
}
