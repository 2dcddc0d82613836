//! Type-erased properties for heterogeneous lists
//!
//! An [`AnyProperty`] wraps any [`Property`] whose value is serializable and
//! exposes its value as a `serde_json::Value`, so properties of different
//! types can sit in one `Vec` and be rendered generically.

use crate::property::Property;
use crate::subscription::Subscription;
use chrono::{DateTime, Utc};
use gathered_types::Snapshot;
use log::warn;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Erased counterpart of [`Snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnySnapshot {
    pub display_name: String,
    /// `None` when the property holds no value
    pub value: Option<Value>,
    pub formatted_value: Option<String>,
    pub date: DateTime<Utc>,
}

/// Convert a value to its dynamic form.
///
/// Absent values come back as `None` rather than `Some(Value::Null)`, at any
/// depth of `Option` nesting, so "no value" has exactly one representation.
///
/// JSON has no NaN or infinity. A non-finite float erases to `None` like an
/// absent value, and a non-finite field inside a struct erases to `null`.
/// The formatted value still shows what the typed property holds.
pub fn erase_value<V: Serialize + ?Sized>(value: &V) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to erase property value: {}", e);
            None
        }
    }
}

/// Object-safe interface implemented for every serializable property
pub trait ErasedProperty: Send + Sync {
    fn display_name(&self) -> &str;
    fn any_snapshot(&self) -> AnySnapshot;
    fn add_any_listener(&self, listener: Box<dyn Fn(&AnySnapshot) + Send + Sync>) -> Subscription;
    fn children(&self) -> Vec<AnyProperty>;
}

struct PropertyBox<P> {
    property: Arc<P>,
}

fn erase_snapshot<P: Property>(property: &P, snapshot: &Snapshot<P::Value>) -> AnySnapshot
where
    P::Value: Serialize,
{
    AnySnapshot {
        display_name: property.display_name().to_string(),
        value: erase_value(&snapshot.value),
        formatted_value: property.format(&snapshot.value),
        date: snapshot.date,
    }
}

impl<P> ErasedProperty for PropertyBox<P>
where
    P: Property + 'static,
    P::Value: Serialize,
{
    fn display_name(&self) -> &str {
        self.property.display_name()
    }

    fn any_snapshot(&self) -> AnySnapshot {
        erase_snapshot(&*self.property, &self.property.snapshot())
    }

    fn add_any_listener(&self, listener: Box<dyn Fn(&AnySnapshot) + Send + Sync>) -> Subscription {
        // Weak: the property's publisher owns this closure
        let weak = Arc::downgrade(&self.property);
        self.property.add_update_listener(move |snapshot| {
            if let Some(property) = weak.upgrade() {
                listener(&erase_snapshot(&*property, snapshot));
            }
        })
    }

    fn children(&self) -> Vec<AnyProperty> {
        self.property.children()
    }
}

/// A property of any value type
#[derive(Clone)]
pub struct AnyProperty {
    inner: Arc<dyn ErasedProperty>,
}

impl AnyProperty {
    pub fn new<P>(property: Arc<P>) -> Self
    where
        P: Property + 'static,
        P::Value: Serialize,
    {
        Self {
            inner: Arc::new(PropertyBox { property }),
        }
    }

    pub fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    pub fn snapshot(&self) -> AnySnapshot {
        self.inner.any_snapshot()
    }

    pub fn value(&self) -> Option<Value> {
        self.snapshot().value
    }

    pub fn formatted_value(&self) -> Option<String> {
        self.snapshot().formatted_value
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.snapshot().date
    }

    /// Be called with the erased form of every future snapshot
    pub fn add_update_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AnySnapshot) + Send + Sync + 'static,
    {
        self.inner.add_any_listener(Box::new(listener))
    }

    pub fn children(&self) -> Vec<AnyProperty> {
        self.inner.children()
    }

    /// This property followed by all of its descendants, depth first
    pub fn flattened(&self) -> Vec<AnyProperty> {
        let mut all = vec![self.clone()];
        for child in self.children() {
            all.extend(child.flattened());
        }
        all
    }
}

impl fmt::Debug for AnyProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("AnyProperty")
            .field("display_name", &snapshot.display_name)
            .field("value", &snapshot.value)
            .field("date", &snapshot.date)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{ByteCountFormatter, MeasurementFormatter};
    use crate::property::BasicProperty;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_round_trip_matches_typed_property() {
        let typed = Arc::new(
            BasicProperty::new("Used Memory", 2048u64).with_formatter(ByteCountFormatter),
        );
        let erased = AnyProperty::new(Arc::clone(&typed));

        assert_eq!(erased.display_name(), typed.display_name());
        assert_eq!(erased.formatted_value(), typed.formatted_value());
        assert_eq!(erased.value(), Some(json!(2048)));
        assert_eq!(erased.date(), typed.date());
    }

    #[test]
    fn test_none_is_not_some_null() {
        let typed = Arc::new(BasicProperty::<Option<f64>>::optional_with(
            "Altitude",
            MeasurementFormatter::new("m", 0),
        ));
        let erased = AnyProperty::new(Arc::clone(&typed));

        assert_eq!(erased.value(), None);
        assert_eq!(erased.formatted_value().as_deref(), Some("Unknown"));

        typed.update_value_now(Some(12.0));
        assert_eq!(erased.value(), Some(json!(12.0)));
    }

    #[test]
    fn test_non_finite_float_erases_to_none() {
        let typed = Arc::new(BasicProperty::<Option<f64>>::optional_with(
            "Altitude",
            MeasurementFormatter::new("m", 0),
        ));
        let erased = AnyProperty::new(Arc::clone(&typed));

        typed.update_value_now(Some(f64::NAN));
        assert_eq!(erased.value(), None);
        assert_eq!(erased.formatted_value().as_deref(), Some("NaN m"));

        assert_eq!(erase_value(&f32::INFINITY), None);
        assert_eq!(
            erase_value(&gathered_types::Vector3 { x: 1.0, y: f64::NAN, z: 0.0 }),
            Some(json!({"x": 1.0, "y": null, "z": 0.0}))
        );
    }

    #[test]
    fn test_nested_options_flatten() {
        assert_eq!(erase_value(&Some(None::<u8>)), None);
        assert_eq!(erase_value(&Some(Some(3u8))), Some(json!(3)));
    }

    #[test]
    fn test_heterogeneous_list() {
        let properties = vec![
            AnyProperty::new(Arc::new(BasicProperty::new("Name", "sensor".to_string()))),
            AnyProperty::new(Arc::new(BasicProperty::new("Enabled", true))),
            AnyProperty::new(Arc::new(BasicProperty::<Option<i32>>::optional("Reading"))),
        ];

        let names: Vec<_> = properties.iter().map(|p| p.display_name().to_string()).collect();
        assert_eq!(names, ["Name", "Enabled", "Reading"]);
        assert_eq!(properties[0].value(), Some(json!("sensor")));
        assert_eq!(properties[1].value(), Some(json!(true)));
        assert_eq!(properties[2].value(), None);
    }

    #[test]
    fn test_erased_listener() {
        let typed = Arc::new(BasicProperty::new("Count", 0u32));
        let erased = AnyProperty::new(Arc::clone(&typed));
        let received = Arc::new(Mutex::new(Vec::new()));

        let captured = Arc::clone(&received);
        let subscription = erased.add_update_listener(move |snapshot| {
            captured.lock().unwrap().push(snapshot.value.clone());
        });

        typed.update_value_now(1);
        subscription.cancel();
        typed.update_value_now(2);

        assert_eq!(*received.lock().unwrap(), vec![Some(json!(1))]);
    }

    #[test]
    fn test_erased_listener_does_not_keep_property_alive() {
        let typed = Arc::new(BasicProperty::new("Count", 0u32));
        let erased = AnyProperty::new(Arc::clone(&typed));
        let subscription = erased.add_update_listener(|_| {});
        drop(erased);

        assert_eq!(Arc::strong_count(&typed), 1);
        drop(subscription);
    }
}
