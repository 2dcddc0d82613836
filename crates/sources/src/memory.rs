//! Memory (RAM) source implementation

use crate::shared_sensors::{self, MemoryReading};
use chrono::{DateTime, Utc};
use gathered_core::{
    AnyProperty, BasicProperty, ByteCountFormatter, PercentFormatter, PollingSource, Sampler,
};
use gathered_types::{MemorySourceConfig, SourceIdentifier};
use std::sync::Arc;
use std::time::Duration;

/// Memory source: RAM and swap usage sampled on an interval
pub type MemorySource = PollingSource<MemorySampler>;

/// Reads RAM and swap counters from the shared `sysinfo::System`
pub struct MemorySampler {
    include_swap: bool,
    total: Arc<BasicProperty<u64>>,
    used: Arc<BasicProperty<u64>>,
    free: Arc<BasicProperty<u64>>,
    available: Arc<BasicProperty<u64>>,
    usage: Arc<BasicProperty<f64>>,
    swap_total: Arc<BasicProperty<u64>>,
    swap_used: Arc<BasicProperty<u64>>,
}

impl MemorySampler {
    pub fn new(config: &MemorySourceConfig) -> Self {
        let bytes = |name: &str| {
            Arc::new(BasicProperty::new(name, 0u64).with_formatter(ByteCountFormatter))
        };
        Self {
            include_swap: config.include_swap,
            total: bytes("Total Memory"),
            used: bytes("Used Memory"),
            free: bytes("Free Memory"),
            available: bytes("Available Memory"),
            usage: Arc::new(
                BasicProperty::new("Memory Usage", 0.0f64).with_formatter(PercentFormatter::default()),
            ),
            swap_total: bytes("Total Swap"),
            swap_used: bytes("Used Swap"),
        }
    }

    /// Write a reading into the properties.
    ///
    /// Unchanged counters keep their previous snapshot and notify nobody.
    pub fn apply(&self, reading: MemoryReading, date: DateTime<Utc>) {
        self.total.update_value_if_different(reading.total, date);
        self.used.update_value_if_different(reading.used, date);
        self.free.update_value_if_different(reading.free, date);
        self.available
            .update_value_if_different(reading.available, date);
        self.usage
            .update_value_if_different(reading.usage_percent(), date);
        if self.include_swap {
            self.swap_total
                .update_value_if_different(reading.swap_total, date);
            self.swap_used
                .update_value_if_different(reading.swap_used, date);
        }
    }
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new(&MemorySourceConfig::default())
    }
}

impl Sampler for MemorySampler {
    fn identifier(&self) -> SourceIdentifier {
        "memory".into()
    }

    fn name(&self) -> &str {
        "Memory"
    }

    fn properties(&self) -> Vec<AnyProperty> {
        let mut properties = vec![
            AnyProperty::new(Arc::clone(&self.total)),
            AnyProperty::new(Arc::clone(&self.used)),
            AnyProperty::new(Arc::clone(&self.free)),
            AnyProperty::new(Arc::clone(&self.available)),
            AnyProperty::new(Arc::clone(&self.usage)),
        ];
        if self.include_swap {
            properties.push(AnyProperty::new(Arc::clone(&self.swap_total)));
            properties.push(AnyProperty::new(Arc::clone(&self.swap_used)));
        }
        properties
    }

    fn sample(&self) {
        self.apply(shared_sensors::read_memory(), Utc::now());
    }
}

/// Create a memory source from its configuration
pub fn memory_source(config: &MemorySourceConfig) -> MemorySource {
    PollingSource::new(
        MemorySampler::new(config),
        Duration::from_millis(config.update_interval_ms),
    )
}
