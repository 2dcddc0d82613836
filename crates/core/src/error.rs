//! Error types

use gathered_types::Availability;
use thiserror::Error;

/// Errors returned by registry and configuration operations.
///
/// Nothing on the property update path returns these; update failures are
/// reported through [`SourceEvent`](crate::SourceEvent)s instead.
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("invalid configuration for {source_type}: {reason}")]
    InvalidConfig {
        source_type: String,
        reason: String,
    },

    #[error("config type mismatch: expected {expected}, got {actual}")]
    ConfigMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Why a source stopped, or could not start, updating
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("access restricted")]
    Restricted,

    #[error("source unavailable on this system")]
    Unavailable,

    #[error("platform error: {0}")]
    Platform(String),
}

impl SourceError {
    /// The error matching an availability that prevents updating, if any
    pub fn from_availability(availability: Availability) -> Option<Self> {
        match availability {
            Availability::Available | Availability::RequiresPermissionsPrompt => None,
            Availability::Restricted => Some(SourceError::Restricted),
            Availability::PermissionDenied => Some(SourceError::PermissionDenied),
            Availability::Unavailable => Some(SourceError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_availability() {
        assert_eq!(SourceError::from_availability(Availability::Available), None);
        assert_eq!(
            SourceError::from_availability(Availability::RequiresPermissionsPrompt),
            None
        );
        assert_eq!(
            SourceError::from_availability(Availability::PermissionDenied),
            Some(SourceError::PermissionDenied)
        );
    }

    #[test]
    fn test_error_messages() {
        let err = GatherError::UnknownSource("gpu".to_string());
        assert_eq!(err.to_string(), "unknown source: gpu");
        assert_eq!(
            SourceError::Platform("sensor offline".to_string()).to_string(),
            "platform error: sensor offline"
        );
    }
}
