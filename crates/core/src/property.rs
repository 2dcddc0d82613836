//! Typed properties holding the latest snapshot of a value

use crate::erased::AnyProperty;
use crate::formatter::{Formatter, OptionalFormatter};
use crate::subscription::{SnapshotReceiver, Subscription, UpdatePublisher, UpdateStream};
use crate::sync::{read, write};
use chrono::{DateTime, Utc};
use gathered_types::Snapshot;
use log::trace;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A named, formattable holder of the latest snapshot of a value.
///
/// Implementors only need to supply storage and formatting; subscription
/// helpers are provided on top of [`publisher`](Property::publisher).
pub trait Property: Send + Sync {
    type Value: Clone + Send + Sync + 'static;

    fn display_name(&self) -> &str;

    /// The current snapshot. Never a mix of two updates.
    fn snapshot(&self) -> Snapshot<Self::Value>;

    /// Render a value of this property, or `None` when no formatter is set
    fn format(&self, value: &Self::Value) -> Option<String>;

    /// Publisher notified with every new snapshot
    fn publisher(&self) -> &UpdatePublisher<Snapshot<Self::Value>>;

    /// Sub-properties derived from this one (e.g. the axes of a vector)
    fn children(&self) -> Vec<AnyProperty> {
        Vec::new()
    }

    fn value(&self) -> Self::Value {
        self.snapshot().value
    }

    fn date(&self) -> DateTime<Utc> {
        self.snapshot().date
    }

    fn formatted_value(&self) -> Option<String> {
        self.format(&self.snapshot().value)
    }

    /// Be called with every snapshot produced after this call
    fn add_update_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot<Self::Value>) + Send + Sync + 'static,
        Self: Sized,
    {
        self.publisher().subscribe(listener)
    }

    fn updates_channel(&self) -> SnapshotReceiver<Snapshot<Self::Value>>
    where
        Self: Sized,
    {
        self.publisher().channel()
    }

    fn updates_stream(&self) -> UpdateStream<Snapshot<Self::Value>>
    where
        Self: Sized,
    {
        self.publisher().stream()
    }
}

/// The standard property implementation.
///
/// The snapshot sits behind an `RwLock` because sources update from their
/// callback threads while consumers read from anywhere. Listeners run on the
/// updating thread after the lock is released, so they may read the property
/// (or update others) freely.
pub struct BasicProperty<V> {
    display_name: String,
    snapshot: RwLock<Snapshot<V>>,
    formatter: Option<Arc<dyn Formatter<V>>>,
    publisher: UpdatePublisher<Snapshot<V>>,
}

impl<V: Clone + Send + Sync + 'static> BasicProperty<V> {
    pub fn new(display_name: impl Into<String>, value: V) -> Self {
        Self::with_date(display_name, value, Utc::now())
    }

    pub fn with_date(display_name: impl Into<String>, value: V, date: DateTime<Utc>) -> Self {
        Self {
            display_name: display_name.into(),
            snapshot: RwLock::new(Snapshot::new(value, date)),
            formatter: None,
            publisher: UpdatePublisher::new(),
        }
    }

    pub fn with_formatter(mut self, formatter: impl Formatter<V> + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Replace the snapshot and notify every listener
    pub fn update_value(&self, value: V, date: DateTime<Utc>) {
        let snapshot = Snapshot::new(value, date);
        *write(&self.snapshot) = snapshot.clone();
        trace!("Property '{}' updated", self.display_name);
        self.publisher.publish(&snapshot);
    }

    pub fn update_value_now(&self, value: V) {
        self.update_value(value, Utc::now());
    }

    /// Read-only view for consumers
    pub fn read_only(self: &Arc<Self>) -> ReadOnlyProperty<Self> {
        ReadOnlyProperty::new(Arc::clone(self))
    }
}

impl<V: Clone + PartialEq + Send + Sync + 'static> BasicProperty<V> {
    /// Like [`update_value`](Self::update_value), but leaves the snapshot
    /// (including its date) untouched and notifies no one when the value is
    /// unchanged. Returns whether an update happened.
    pub fn update_value_if_different(&self, value: V, date: DateTime<Utc>) -> bool {
        let snapshot = {
            let mut current = write(&self.snapshot);
            if current.value == value {
                return false;
            }
            *current = Snapshot::new(value, date);
            current.clone()
        };
        trace!("Property '{}' changed", self.display_name);
        self.publisher.publish(&snapshot);
        true
    }
}

impl<T: Clone + Send + Sync + 'static> BasicProperty<Option<T>> {
    /// A property with no value yet and no formatter
    pub fn optional(display_name: impl Into<String>) -> Self {
        Self::new(display_name, None)
    }

    /// An optional property whose present values use `formatter`
    pub fn optional_with(
        display_name: impl Into<String>,
        formatter: impl Formatter<T> + 'static,
    ) -> Self {
        Self::optional(display_name).with_formatter(OptionalFormatter::new(formatter))
    }

    /// Reset to "no value". Does nothing if already empty.
    pub fn clear(&self, date: DateTime<Utc>) -> bool {
        if read(&self.snapshot).value.is_none() {
            return false;
        }
        self.update_value(None, date);
        true
    }
}

impl<V: Clone + Send + Sync + 'static> Property for BasicProperty<V> {
    type Value = V;

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn snapshot(&self) -> Snapshot<V> {
        read(&self.snapshot).clone()
    }

    fn format(&self, value: &V) -> Option<String> {
        self.formatter.as_ref().map(|formatter| formatter.format(value))
    }

    fn publisher(&self) -> &UpdatePublisher<Snapshot<V>> {
        &self.publisher
    }
}

impl<V: fmt::Debug> fmt::Debug for BasicProperty<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicProperty")
            .field("display_name", &self.display_name)
            .field("snapshot", &*read(&self.snapshot))
            .finish()
    }
}

/// Shared view of a property without its update methods.
///
/// Sources keep the `Arc` to the property they write and hand these out.
pub struct ReadOnlyProperty<P> {
    inner: Arc<P>,
}

impl<P> ReadOnlyProperty<P> {
    pub fn new(inner: Arc<P>) -> Self {
        Self { inner }
    }
}

impl<P: Property + 'static> ReadOnlyProperty<P>
where
    P::Value: serde::Serialize,
{
    pub fn erased(&self) -> AnyProperty {
        AnyProperty::new(Arc::clone(&self.inner))
    }
}

impl<P> Clone for ReadOnlyProperty<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Property> Property for ReadOnlyProperty<P> {
    type Value = P::Value;

    fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    fn snapshot(&self) -> Snapshot<P::Value> {
        self.inner.snapshot()
    }

    fn format(&self, value: &P::Value) -> Option<String> {
        self.inner.format(value)
    }

    fn publisher(&self) -> &UpdatePublisher<Snapshot<P::Value>> {
        self.inner.publisher()
    }

    fn children(&self) -> Vec<AnyProperty> {
        self.inner.children()
    }
}
