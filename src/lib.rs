//! gathered: typed, timestamped properties over heterogeneous data sources
//!
//! This library ties the workspace crates together for the `gathered` CLI:
//! - Configuration management
//! - A [`Monitor`] that creates, starts and watches configured sources

pub mod config;
pub mod monitor;

// Re-export commonly used types
pub use config::AppConfig;
pub use monitor::{Monitor, MonitorEvent, SourceReport};

pub use gathered_core as core;
pub use gathered_sources as sources;
pub use gathered_types as types;
