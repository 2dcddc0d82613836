//! gathered-core: properties, snapshots and source lifecycles.
//!
//! Sources write timestamped snapshots into typed [`Property`]s; consumers
//! read them, subscribe to updates, or erase them to [`AnyProperty`] for
//! generic display. Controllable sources share the [`MonitoringLifecycle`]
//! state machine, and timer-driven ones are built from a [`Sampler`] wrapped
//! in a [`PollingSource`].

pub mod constants;
mod erased;
mod error;
mod formatter;
mod lifecycle;
mod polling;
mod property;
mod registry;
mod source;
mod subscription;
pub mod sync;
mod vector;

pub use constants::{
    BYTES_PER_GB, BYTES_PER_KB, BYTES_PER_MB, BYTES_PER_TB, DEFAULT_UPDATE_INTERVAL,
    MIN_POLL_INTERVAL, UNKNOWN_PLACEHOLDER,
};
pub use erased::{erase_value, AnyProperty, AnySnapshot, ErasedProperty};
pub use error::{GatherError, SourceError};
pub use formatter::{
    ByteCountFormatter, DisplayFormatter, Formatter, MeasurementFormatter, OptionalFormatter,
    PercentFormatter,
};
pub use lifecycle::{MonitoringLifecycle, MonitoringState, SourceEvent};
pub use polling::{PollingSource, Sampler};
pub use property::{BasicProperty, Property, ReadOnlyProperty};
pub use registry::{Registry, SourceFactory};
pub use source::{BoxedSource, Controllable, ManuallyUpdatable, Source};
pub use subscription::{SnapshotReceiver, Subscription, UpdatePublisher, UpdateStream};
pub use vector::Vector3Property;

// Re-export types used in trait signatures for convenience
pub use gathered_types::{Availability, Snapshot, SourceConfig, SourceIdentifier};
