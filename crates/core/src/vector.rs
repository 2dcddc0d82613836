//! Vector-valued property with per-axis children

use crate::erased::AnyProperty;
use crate::formatter::MeasurementFormatter;
use crate::property::{BasicProperty, Property, ReadOnlyProperty};
use crate::subscription::UpdatePublisher;
use chrono::{DateTime, Utc};
use gathered_types::{Snapshot, Vector3};
use std::sync::Arc;

/// A [`Vector3`] property that also exposes `x`, `y` and `z` as properties of
/// their own, so a generic list can show each axis on its own row.
pub struct Vector3Property {
    vector: BasicProperty<Vector3>,
    x: Arc<BasicProperty<f64>>,
    y: Arc<BasicProperty<f64>>,
    z: Arc<BasicProperty<f64>>,
}

impl Vector3Property {
    pub fn new(display_name: impl Into<String>, formatter: MeasurementFormatter) -> Self {
        let date = Utc::now();
        let axis = |name: &str| -> Arc<BasicProperty<f64>> {
            Arc::new(BasicProperty::with_date(name, 0.0f64, date).with_formatter(formatter.clone()))
        };
        Self {
            x: axis("x"),
            y: axis("y"),
            z: axis("z"),
            vector: BasicProperty::with_date(display_name, Vector3::default(), date)
                .with_formatter(formatter),
        }
    }

    /// Update all axes and the vector with one capture date.
    ///
    /// Axes are written first, so a listener on the vector sees children that
    /// already match it.
    pub fn update_value(&self, value: Vector3, date: DateTime<Utc>) {
        self.x.update_value(value.x, date);
        self.y.update_value(value.y, date);
        self.z.update_value(value.z, date);
        self.vector.update_value(value, date);
    }

    pub fn x(&self) -> ReadOnlyProperty<BasicProperty<f64>> {
        self.x.read_only()
    }

    pub fn y(&self) -> ReadOnlyProperty<BasicProperty<f64>> {
        self.y.read_only()
    }

    pub fn z(&self) -> ReadOnlyProperty<BasicProperty<f64>> {
        self.z.read_only()
    }
}

impl Property for Vector3Property {
    type Value = Vector3;

    fn display_name(&self) -> &str {
        self.vector.display_name()
    }

    fn snapshot(&self) -> Snapshot<Vector3> {
        self.vector.snapshot()
    }

    fn format(&self, value: &Vector3) -> Option<String> {
        self.vector.format(value)
    }

    fn publisher(&self) -> &UpdatePublisher<Snapshot<Vector3>> {
        self.vector.publisher()
    }

    fn children(&self) -> Vec<AnyProperty> {
        vec![
            AnyProperty::new(Arc::clone(&self.x)),
            AnyProperty::new(Arc::clone(&self.y)),
            AnyProperty::new(Arc::clone(&self.z)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn acceleration() -> Vector3Property {
        Vector3Property::new("Acceleration", MeasurementFormatter::new("g", 2))
    }

    #[test]
    fn test_update_propagates_to_axes() {
        let property = acceleration();
        let date = Utc::now();

        property.update_value(Vector3::new(0.1, -0.98, 0.05), date);

        assert_eq!(property.value(), Vector3::new(0.1, -0.98, 0.05));
        assert_eq!(property.x().value(), 0.1);
        assert_eq!(property.y().value(), -0.98);
        assert_eq!(property.z().snapshot(), Snapshot::new(0.05, date));
        assert_eq!(property.y().formatted_value().as_deref(), Some("-0.98 g"));
    }

    #[test]
    fn test_children_are_erased_axes() {
        let property = Arc::new(acceleration());
        property.update_value(Vector3::new(1.0, 2.0, 3.0), Utc::now());

        let erased = AnyProperty::new(Arc::clone(&property));
        let flattened = erased.flattened();
        let names: Vec<_> = flattened.iter().map(|p| p.display_name().to_string()).collect();

        assert_eq!(names, ["Acceleration", "x", "y", "z"]);
        assert_eq!(flattened[3].value(), Some(json!(3.0)));
        assert_eq!(erased.value(), Some(json!({"x": 1.0, "y": 2.0, "z": 3.0})));
    }

    #[test]
    fn test_vector_listener_sees_updated_axes() {
        let property = Arc::new(acceleration());
        let observed = Arc::new(Mutex::new(None));

        let axes = property.x();
        let captured = Arc::clone(&observed);
        let _subscription = property.add_update_listener(move |snapshot| {
            *captured.lock().unwrap() = Some((snapshot.value.x, axes.value()));
        });

        property.update_value(Vector3::new(4.0, 0.0, 0.0), Utc::now());
        assert_eq!(*observed.lock().unwrap(), Some((4.0, 4.0)));
    }
}
