//! Process-wide sysinfo handles
//!
//! Sensor discovery and the `System` handle are expensive, so every memory
//! and thermal source shares one lazily created instance of each.

use gathered_core::sync::lock;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Components, System};

/// Minimum interval between sensor refreshes
const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

static SHARED_SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| {
    log::info!("Creating shared sysinfo::System instance");
    Mutex::new(System::new())
});

struct SharedSensors {
    components: Components,
    last_refresh: Instant,
}

impl SharedSensors {
    fn new() -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
            last_refresh: Instant::now(),
        }
    }

    fn refresh_if_needed(&mut self) {
        if self.last_refresh.elapsed() >= MIN_REFRESH_INTERVAL {
            self.components.refresh();
            self.last_refresh = Instant::now();
        }
    }
}

static SHARED_COMPONENTS: Lazy<Mutex<SharedSensors>> = Lazy::new(|| {
    let sensors = SharedSensors::new();
    log::info!(
        "Shared temperature sensors initialized: {} components",
        sensors.components.len()
    );
    Mutex::new(sensors)
});

/// Memory counters in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryReading {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

impl MemoryReading {
    /// Used memory as a percentage of total, 0 when total is unknown
    pub fn usage_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64 * 100.0
        }
    }
}

pub fn read_memory() -> MemoryReading {
    let mut system = lock(&SHARED_SYSTEM);
    system.refresh_memory();
    MemoryReading {
        total: system.total_memory(),
        used: system.used_memory(),
        free: system.free_memory(),
        available: system.available_memory(),
        swap_total: system.total_swap(),
        swap_used: system.used_swap(),
    }
}

/// One temperature sensor reading
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentReading {
    pub label: String,
    pub temperature: f32,
    pub critical: Option<f32>,
}

/// Current readings of every sensor, refreshing at most every 250 ms
pub fn read_components() -> Vec<ComponentReading> {
    let mut sensors = lock(&SHARED_COMPONENTS);
    sensors.refresh_if_needed();
    sensors
        .components
        .iter()
        .map(|c| ComponentReading {
            label: c.label().to_string(),
            temperature: c.temperature(),
            critical: c.critical(),
        })
        .collect()
}

pub fn component_count() -> usize {
    lock(&SHARED_COMPONENTS).components.len()
}

/// Force sensor discovery now rather than on first read
pub fn initialize() {
    let _ = &*SHARED_COMPONENTS;
}
