//! gathered-types: Shared data types for the gathered workspace.
//!
//! This crate contains pure data types (snapshots, availability, value types
//! and typed source configuration) shared across all gathered crates. These
//! types carry no behaviour beyond construction and classification, making
//! them suitable as a foundation layer.

pub mod availability;
pub mod snapshot;
pub mod source_configs;
pub mod values;

// Re-export commonly used types at the crate root for convenience
pub use availability::{Availability, SourceIdentifier};
pub use snapshot::Snapshot;
pub use source_configs::{
    LocationSourceConfig, MemorySourceConfig, SimulatedPosition, SourceConfig, ThermalSourceConfig,
};
pub use values::{Coordinate, LocationAuthorization, LocationFix, ThermalState, Vector3};
