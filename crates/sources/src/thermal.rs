//! Thermal state source implementation

use crate::shared_sensors::{self, ComponentReading};
use chrono::{DateTime, Utc};
use gathered_core::{
    AnyProperty, BasicProperty, DisplayFormatter, MeasurementFormatter, PollingSource, Sampler,
};
use gathered_types::{Availability, SourceIdentifier, ThermalSourceConfig, ThermalState};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Thermal source: host thermal pressure derived from temperature sensors
pub type ThermalSource = PollingSource<ThermalSampler>;

/// Summarizes the hottest matching sensor into a [`ThermalState`]
pub struct ThermalSampler {
    config: ThermalSourceConfig,
    state: Arc<BasicProperty<Option<ThermalState>>>,
    hottest: Arc<BasicProperty<Option<String>>>,
    max_temperature: Arc<BasicProperty<Option<f32>>>,
    sensor_count: Arc<BasicProperty<usize>>,
}

impl ThermalSampler {
    pub fn new(config: ThermalSourceConfig) -> Self {
        Self {
            config,
            state: Arc::new(BasicProperty::optional_with("Thermal State", DisplayFormatter)),
            hottest: Arc::new(BasicProperty::optional_with("Hottest Sensor", DisplayFormatter)),
            max_temperature: Arc::new(BasicProperty::<Option<f32>>::optional_with(
                "Max Temperature",
                MeasurementFormatter::new("°C", 1),
            )),
            sensor_count: Arc::new(BasicProperty::new("Sensors", 0usize).with_formatter(DisplayFormatter)),
        }
    }

    /// Write a set of readings into the properties.
    ///
    /// Sensors excluded by the filter are ignored. With no sensors left every
    /// value is cleared to `None`.
    pub fn apply(&self, readings: &[ComponentReading], date: DateTime<Utc>) {
        let matching: Vec<&ComponentReading> = readings
            .iter()
            .filter(|r| r.temperature.is_finite() && self.config.matches(&r.label))
            .collect();
        self.sensor_count
            .update_value_if_different(matching.len(), date);

        let hottest = matching
            .iter()
            .max_by(|a, b| a.temperature.total_cmp(&b.temperature));
        match hottest {
            Some(reading) => {
                let state = ThermalState::classify(reading.temperature, reading.critical);
                self.state.update_value_if_different(Some(state), date);
                self.hottest
                    .update_value_if_different(Some(reading.label.clone()), date);
                self.max_temperature
                    .update_value_if_different(Some(reading.temperature), date);
            }
            None => {
                debug!("No matching temperature sensors");
                self.state.clear(date);
                self.hottest.clear(date);
                self.max_temperature.clear(date);
            }
        }
    }
}

impl Default for ThermalSampler {
    fn default() -> Self {
        Self::new(ThermalSourceConfig::default())
    }
}

impl Sampler for ThermalSampler {
    fn identifier(&self) -> SourceIdentifier {
        "thermal".into()
    }

    fn name(&self) -> &str {
        "Thermal State"
    }

    fn availability(&self) -> Availability {
        if shared_sensors::component_count() == 0 {
            Availability::Unavailable
        } else {
            Availability::Available
        }
    }

    fn properties(&self) -> Vec<AnyProperty> {
        vec![
            AnyProperty::new(Arc::clone(&self.state)),
            AnyProperty::new(Arc::clone(&self.hottest)),
            AnyProperty::new(Arc::clone(&self.max_temperature)),
            AnyProperty::new(Arc::clone(&self.sensor_count)),
        ]
    }

    fn sample(&self) {
        self.apply(&shared_sensors::read_components(), Utc::now());
    }
}

/// Create a thermal source from its configuration
pub fn thermal_source(config: &ThermalSourceConfig) -> ThermalSource {
    PollingSource::new(
        ThermalSampler::new(config.clone()),
        Duration::from_millis(config.update_interval_ms),
    )
}
