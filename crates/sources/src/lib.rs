//! gathered-sources: Reference source implementations for gathered.

mod location;
mod memory;
mod shared_sensors;
mod thermal;

pub use location::{
    LocationDelegate, LocationProvider, LocationSource, LocationUpdates, SimulatedLocationProvider,
};
pub use memory::{memory_source, MemorySampler, MemorySource};
pub use shared_sensors::{ComponentReading, MemoryReading};
pub use thermal::{thermal_source, ThermalSampler, ThermalSource};

use anyhow::Result;
use gathered_core::{BoxedSource, GatherError, Registry};
use gathered_types::SourceConfig;

/// Initialize shared sensor caches (call once at startup)
pub fn initialize_sensors() {
    shared_sensors::initialize();
}

fn mismatch(expected: &'static str, config: &SourceConfig) -> anyhow::Error {
    GatherError::ConfigMismatch {
        expected,
        actual: config.source_type(),
    }
    .into()
}

fn create_memory(config: &SourceConfig) -> Result<BoxedSource> {
    match config {
        SourceConfig::Memory(cfg) => Ok(Box::new(memory_source(cfg))),
        other => Err(mismatch("memory", other)),
    }
}

fn create_thermal(config: &SourceConfig) -> Result<BoxedSource> {
    match config {
        SourceConfig::Thermal(cfg) => Ok(Box::new(thermal_source(cfg))),
        other => Err(mismatch("thermal", other)),
    }
}

fn create_location(config: &SourceConfig) -> Result<BoxedSource> {
    match config {
        SourceConfig::Location(cfg) => Ok(Box::new(LocationSource::simulated(cfg))),
        other => Err(mismatch("location", other)),
    }
}

/// Register all built-in sources
pub fn register_all(registry: &mut Registry) {
    registry.register_source("memory", create_memory);
    registry.register_source("thermal", create_thermal);
    // No native location service on this host; the simulated provider
    // follows the authorization and position in the config
    registry.register_source("location", create_location);
}
