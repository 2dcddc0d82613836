//! Timestamped values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A captured value together with the time it was captured.
///
/// Snapshots are immutable. A property replaces its snapshot wholesale on
/// every update and keeps no history; `date` always reflects when `value` was
/// read from its source, not when a consumer observed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<V> {
    pub value: V,
    pub date: DateTime<Utc>,
}

impl<V> Snapshot<V> {
    pub fn new(value: V, date: DateTime<Utc>) -> Self {
        Self { value, date }
    }

    /// Snapshot stamped with the current time
    pub fn now(value: V) -> Self {
        Self::new(value, Utc::now())
    }

    /// Transform the value, keeping the capture date
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Snapshot<U> {
        Snapshot {
            value: f(self.value),
            date: self.date,
        }
    }

    pub fn as_ref(&self) -> Snapshot<&V> {
        Snapshot {
            value: &self.value,
            date: self.date,
        }
    }
}
