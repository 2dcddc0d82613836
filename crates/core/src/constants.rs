//! Shared constants

use std::time::Duration;

pub const BYTES_PER_KB: f64 = 1024.0;
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
pub const BYTES_PER_TB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

/// Polling interval used when a config does not name one
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);

/// Shortest polling interval a source will honour
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Text shown for values that are not known
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown";
