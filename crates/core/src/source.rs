//! Source traits

use crate::erased::AnyProperty;
use crate::lifecycle::{MonitoringLifecycle, MonitoringState, SourceEvent};
use crate::subscription::Subscription;
use gathered_types::{Availability, SourceIdentifier};

/// Trait for all sources
///
/// A source owns a fixed set of properties and writes new snapshots into them
/// as its platform API delivers data. Consumers read or subscribe to the
/// properties; they never write them.
pub trait Source: Send + Sync {
    /// Identifier of this source type
    fn identifier(&self) -> SourceIdentifier;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Whether the source can deliver data right now.
    ///
    /// Reflects the current platform permission state and is valid before
    /// updating has ever been started.
    fn availability(&self) -> Availability {
        Availability::Available
    }

    /// Every property of this source, in display order
    fn all_properties(&self) -> Vec<AnyProperty>;

    /// The lifecycle interface, if this source can be started and stopped
    fn as_controllable(&self) -> Option<&dyn Controllable> {
        None
    }

    /// The on-demand sampling interface, if supported
    fn as_manually_updatable(&self) -> Option<&dyn ManuallyUpdatable> {
        None
    }
}

/// A source that pushes updates only while it is monitoring
pub trait Controllable: Source {
    fn lifecycle(&self) -> &MonitoringLifecycle;

    /// Begin delivering updates.
    ///
    /// Never fails: a source that cannot start reports why through a
    /// [`SourceEvent::StoppedUpdating`] event. Calling this while already
    /// monitoring or asking for permission does nothing.
    fn start_updating(&self);

    /// Release platform resources and stop delivering updates.
    ///
    /// Properties keep their last values and subscriptions stay registered.
    /// Does nothing when not monitoring.
    fn stop_updating(&self);

    fn state(&self) -> MonitoringState {
        self.lifecycle().state()
    }

    fn is_updating(&self) -> bool {
        self.lifecycle().is_updating()
    }

    fn add_event_listener(
        &self,
        listener: Box<dyn Fn(&SourceEvent) + Send + Sync>,
    ) -> Subscription {
        self.lifecycle().add_event_listener(listener)
    }
}

/// A source that can sample fresh values on demand
pub trait ManuallyUpdatable: Source {
    /// Sample on the calling thread and return all properties
    fn update_values(&self) -> Vec<AnyProperty>;
}

/// Type-erased source for dynamic dispatch
pub type BoxedSource = Box<dyn Source>;
