//! Monitoring state machine shared by controllable sources
//!
//! ```text
//!                 start (needs prompt)                 permission granted
//! NotMonitoring ------------------------> AskingForPermissions ----------> Monitoring
//!      ^  |                                       |                          |
//!      |  +-------------- start (available) ------+--------------------------+
//!      |                                          |                          |
//!      +------------ denied / stop ---------------+-------- stop / error ----+
//! ```

use crate::error::SourceError;
use crate::subscription::{Subscription, UpdatePublisher};
use crate::sync::lock;
use gathered_types::{Availability, SourceIdentifier};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringState {
    NotMonitoring,
    AskingForPermissions,
    Monitoring,
}

impl fmt::Display for MonitoringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MonitoringState::NotMonitoring => "Not Monitoring",
            MonitoringState::AskingForPermissions => "Asking for Permissions",
            MonitoringState::Monitoring => "Monitoring",
        })
    }
}

/// Lifecycle notifications published by controllable sources
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    RequestingPermissions,
    StartedUpdating,
    /// `error` is set when the source stopped, or refused to start, because
    /// of an availability or platform failure
    StoppedUpdating { error: Option<SourceError> },
    AvailabilityChanged(Availability),
    /// A single read failed; the source keeps running with its last values
    UpdateFailed { message: String },
}

/// Guarded monitoring state plus the event stream describing its changes.
///
/// Transitions are compare-and-set: each returns `false` and publishes nothing
/// when the current state does not allow it. Events are published after the
/// state lock is released, so listeners may call back into the source.
pub struct MonitoringLifecycle {
    source: SourceIdentifier,
    state: Mutex<MonitoringState>,
    events: UpdatePublisher<SourceEvent>,
}

impl MonitoringLifecycle {
    pub fn new(source: SourceIdentifier) -> Self {
        Self {
            source,
            state: Mutex::new(MonitoringState::NotMonitoring),
            events: UpdatePublisher::new(),
        }
    }

    pub fn state(&self) -> MonitoringState {
        *lock(&self.state)
    }

    pub fn is_updating(&self) -> bool {
        self.state() == MonitoringState::Monitoring
    }

    fn transition(&self, allowed: &[MonitoringState], to: MonitoringState) -> bool {
        let mut state = lock(&self.state);
        if !allowed.contains(&*state) {
            debug!(
                "Source {} ignored transition {} -> {}",
                self.source, *state, to
            );
            return false;
        }
        info!("Source {}: {} -> {}", self.source, *state, to);
        *state = to;
        true
    }

    /// NotMonitoring -> AskingForPermissions
    pub fn begin_asking(&self) -> bool {
        let changed = self.transition(
            &[MonitoringState::NotMonitoring],
            MonitoringState::AskingForPermissions,
        );
        if changed {
            self.events.publish(&SourceEvent::RequestingPermissions);
        }
        changed
    }

    /// NotMonitoring -> Monitoring
    pub fn begin_monitoring(&self) -> bool {
        self.start_from(MonitoringState::NotMonitoring)
    }

    /// AskingForPermissions -> Monitoring
    pub fn permission_granted(&self) -> bool {
        self.start_from(MonitoringState::AskingForPermissions)
    }

    fn start_from(&self, from: MonitoringState) -> bool {
        let changed = self.transition(&[from], MonitoringState::Monitoring);
        if changed {
            self.events.publish(&SourceEvent::StartedUpdating);
        }
        changed
    }

    /// AskingForPermissions | Monitoring -> NotMonitoring
    pub fn finish(&self, error: Option<SourceError>) -> bool {
        let changed = self.transition(
            &[
                MonitoringState::AskingForPermissions,
                MonitoringState::Monitoring,
            ],
            MonitoringState::NotMonitoring,
        );
        if changed {
            if let Some(error) = &error {
                warn!("Source {} stopped: {}", self.source, error);
            }
            self.events.publish(&SourceEvent::StoppedUpdating { error });
        }
        changed
    }

    /// Report that a start request could not proceed. The state is unchanged.
    pub fn reject(&self, error: SourceError) {
        warn!("Source {} cannot start: {}", self.source, error);
        self.events
            .publish(&SourceEvent::StoppedUpdating { error: Some(error) });
    }

    /// Publish an event that does not change the state
    pub fn emit(&self, event: SourceEvent) {
        if let SourceEvent::UpdateFailed { message } = &event {
            warn!("Source {} update failed: {}", self.source, message);
        }
        self.events.publish(&event);
    }

    pub fn events(&self) -> &UpdatePublisher<SourceEvent> {
        &self.events
    }

    pub fn add_event_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SourceEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }
}

impl fmt::Debug for MonitoringLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoringLifecycle")
            .field("source", &self.source)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorded(lifecycle: &MonitoringLifecycle) -> (Arc<Mutex<Vec<SourceEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let subscription = lifecycle.add_event_listener(move |event| {
            captured.lock().unwrap().push(event.clone());
        });
        (events, subscription)
    }

    #[test]
    fn test_starts_not_monitoring() {
        let lifecycle = MonitoringLifecycle::new("test".into());
        assert_eq!(lifecycle.state(), MonitoringState::NotMonitoring);
        assert!(!lifecycle.is_updating());
    }

    #[test]
    fn test_permission_path() {
        let lifecycle = MonitoringLifecycle::new("test".into());
        let (events, _subscription) = recorded(&lifecycle);

        assert!(lifecycle.begin_asking());
        assert!(!lifecycle.begin_asking());
        assert!(!lifecycle.begin_monitoring());
        assert!(lifecycle.permission_granted());
        assert!(lifecycle.is_updating());
        assert!(lifecycle.finish(None));

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                SourceEvent::RequestingPermissions,
                SourceEvent::StartedUpdating,
                SourceEvent::StoppedUpdating { error: None },
            ]
        );
    }

    #[test]
    fn test_finish_when_idle_is_noop() {
        let lifecycle = MonitoringLifecycle::new("test".into());
        let (events, _subscription) = recorded(&lifecycle);

        assert!(!lifecycle.finish(None));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cannot_ask_while_monitoring() {
        let lifecycle = MonitoringLifecycle::new("test".into());
        assert!(lifecycle.begin_monitoring());
        assert!(!lifecycle.begin_asking());
        assert!(!lifecycle.begin_monitoring());
        assert!(!lifecycle.permission_granted());
        assert_eq!(lifecycle.state(), MonitoringState::Monitoring);
    }

    #[test]
    fn test_reject_keeps_state() {
        let lifecycle = MonitoringLifecycle::new("test".into());
        let (events, _subscription) = recorded(&lifecycle);

        lifecycle.reject(SourceError::Unavailable);

        assert_eq!(lifecycle.state(), MonitoringState::NotMonitoring);
        assert_eq!(
            *events.lock().unwrap(),
            vec![SourceEvent::StoppedUpdating {
                error: Some(SourceError::Unavailable)
            }]
        );
    }

    #[test]
    fn test_listener_can_read_state_during_event() {
        let lifecycle = Arc::new(MonitoringLifecycle::new("test".into()));
        let seen = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&lifecycle);
        let captured = Arc::clone(&seen);
        let _subscription = lifecycle.add_event_listener(move |_| {
            if let Some(lifecycle) = weak.upgrade() {
                *captured.lock().unwrap() = Some(lifecycle.state());
            }
        });

        lifecycle.begin_monitoring();
        assert_eq!(*seen.lock().unwrap(), Some(MonitoringState::Monitoring));
    }
}
