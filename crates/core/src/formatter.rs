//! Rendering property values as user-facing text

use crate::constants::{BYTES_PER_GB, BYTES_PER_KB, BYTES_PER_MB, BYTES_PER_TB, UNKNOWN_PLACEHOLDER};
use gathered_types::Vector3;
use std::fmt::Display;

/// Turns a value into display text.
///
/// Implemented for any `Fn(&V) -> String` closure as well as the formatters
/// in this module.
pub trait Formatter<V: ?Sized>: Send + Sync {
    fn format(&self, value: &V) -> String;
}

impl<V: ?Sized, F> Formatter<V> for F
where
    F: Fn(&V) -> String + Send + Sync,
{
    fn format(&self, value: &V) -> String {
        self(value)
    }
}

/// Formats through the value's `Display` implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFormatter;

impl<V: Display + ?Sized> Formatter<V> for DisplayFormatter {
    fn format(&self, value: &V) -> String {
        value.to_string()
    }
}

/// Number followed by a unit, e.g. `"42.5 °C"`
#[derive(Debug, Clone)]
pub struct MeasurementFormatter {
    pub unit: String,
    pub precision: usize,
}

impl MeasurementFormatter {
    pub fn new(unit: impl Into<String>, precision: usize) -> Self {
        Self {
            unit: unit.into(),
            precision,
        }
    }

    fn render(&self, value: f64) -> String {
        if self.unit.is_empty() {
            format!("{:.*}", self.precision, value)
        } else {
            format!("{:.*} {}", self.precision, value, self.unit)
        }
    }
}

impl Formatter<f64> for MeasurementFormatter {
    fn format(&self, value: &f64) -> String {
        self.render(*value)
    }
}

impl Formatter<f32> for MeasurementFormatter {
    fn format(&self, value: &f32) -> String {
        self.render(f64::from(*value))
    }
}

impl Formatter<Vector3> for MeasurementFormatter {
    fn format(&self, value: &Vector3) -> String {
        format!(
            "x: {}, y: {}, z: {}",
            self.render(value.x),
            self.render(value.y),
            self.render(value.z)
        )
    }
}

/// Percentage with a fixed number of decimals, e.g. `"63.2%"`
#[derive(Debug, Clone, Copy)]
pub struct PercentFormatter {
    pub precision: usize,
}

impl Default for PercentFormatter {
    fn default() -> Self {
        Self { precision: 1 }
    }
}

impl Formatter<f64> for PercentFormatter {
    fn format(&self, value: &f64) -> String {
        format!("{:.*}%", self.precision, value)
    }
}

/// Byte counts in binary units, e.g. `"15.6 GB"`
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCountFormatter;

impl Formatter<u64> for ByteCountFormatter {
    fn format(&self, value: &u64) -> String {
        let bytes = *value as f64;
        if bytes >= BYTES_PER_TB {
            format!("{:.1} TB", bytes / BYTES_PER_TB)
        } else if bytes >= BYTES_PER_GB {
            format!("{:.1} GB", bytes / BYTES_PER_GB)
        } else if bytes >= BYTES_PER_MB {
            format!("{:.1} MB", bytes / BYTES_PER_MB)
        } else if bytes >= BYTES_PER_KB {
            format!("{:.1} KB", bytes / BYTES_PER_KB)
        } else {
            format!("{} B", value)
        }
    }
}

/// Formats `Some` through the inner formatter and `None` as a placeholder
#[derive(Debug, Clone)]
pub struct OptionalFormatter<F> {
    inner: F,
    placeholder: String,
}

impl<F> OptionalFormatter<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            placeholder: UNKNOWN_PLACEHOLDER.to_string(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

impl<T, F: Formatter<T>> Formatter<Option<T>> for OptionalFormatter<F> {
    fn format(&self, value: &Option<T>) -> String {
        match value {
            Some(value) => self.inner.format(value),
            None => self.placeholder.clone(),
        }
    }
}
