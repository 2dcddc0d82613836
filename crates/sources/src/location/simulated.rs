//! In-process location service for hosts without one, and for tests

use super::provider::{LocationDelegate, LocationProvider, LocationUpdates};
use chrono::Utc;
use gathered_core::sync::lock;
use gathered_core::SourceError;
use gathered_types::{
    Coordinate, LocationAuthorization, LocationFix, LocationSourceConfig, SimulatedPosition,
};
use log::debug;
use std::sync::{Arc, Mutex};

struct SimulatedState {
    authorization: LocationAuthorization,
    services_enabled: bool,
    /// Answer given automatically to a prompt; `None` leaves it pending
    grant_on_request: Option<bool>,
    position: Option<SimulatedPosition>,
    /// Delegate that receives authorization changes
    observer: Option<LocationDelegate>,
    subscribers: Vec<(u64, LocationDelegate)>,
    next_id: u64,
    prompts: usize,
}

/// A [`LocationProvider`] driven by method calls instead of hardware.
///
/// Cloning yields another handle to the same simulated service, so a test can
/// keep one handle while the source owns another.
#[derive(Clone)]
pub struct SimulatedLocationProvider {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedLocationProvider {
    pub fn new(authorization: LocationAuthorization) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimulatedState {
                authorization,
                services_enabled: true,
                grant_on_request: None,
                position: None,
                observer: None,
                subscribers: Vec::new(),
                next_id: 0,
                prompts: 0,
            })),
        }
    }

    pub fn from_config(config: &LocationSourceConfig) -> Self {
        let provider = Self::new(config.authorization);
        {
            let mut state = lock(&provider.state);
            state.grant_on_request = config.grant_on_request;
            state.position = config.position;
        }
        provider
    }

    /// Change the authorization status and tell the observing source
    pub fn set_authorization(&self, status: LocationAuthorization) {
        let observer = {
            let mut state = lock(&self.state);
            state.authorization = status;
            state.observer.clone()
        };
        debug!("Simulated location authorization is now {}", status);
        if let Some(observer) = observer {
            observer.authorization_changed(status);
        }
    }

    /// The user grants when-in-use access
    pub fn grant(&self) {
        self.set_authorization(LocationAuthorization::AuthorizedWhenInUse);
    }

    /// The user denies access
    pub fn deny(&self) {
        self.set_authorization(LocationAuthorization::Denied);
    }

    pub fn set_services_enabled(&self, enabled: bool) {
        lock(&self.state).services_enabled = enabled;
    }

    /// Deliver a fix to every running update stream
    pub fn push_fix(&self, fix: LocationFix) {
        for delegate in self.subscribers() {
            delegate.location_updated(fix);
        }
    }

    /// Deliver a fix at a coordinate, stamped now
    pub fn push_coordinate(&self, latitude: f64, longitude: f64) {
        self.push_fix(LocationFix {
            coordinate: Coordinate::new(latitude, longitude),
            altitude: None,
            horizontal_accuracy: None,
            timestamp: Utc::now(),
        });
    }

    /// Report a transient failure to every running update stream
    pub fn fail(&self, message: &str) {
        for delegate in self.subscribers() {
            delegate.failed(message);
        }
    }

    /// Number of permission prompts shown so far
    pub fn prompt_count(&self) -> usize {
        lock(&self.state).prompts
    }

    /// Number of update streams currently running
    pub fn active_updates(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    fn subscribers(&self) -> Vec<LocationDelegate> {
        lock(&self.state)
            .subscribers
            .iter()
            .map(|(_, delegate)| delegate.clone())
            .collect()
    }
}

impl LocationProvider for SimulatedLocationProvider {
    fn authorization_status(&self) -> LocationAuthorization {
        lock(&self.state).authorization
    }

    fn services_enabled(&self) -> bool {
        lock(&self.state).services_enabled
    }

    fn set_delegate(&self, delegate: LocationDelegate) {
        lock(&self.state).observer = Some(delegate);
    }

    fn request_when_in_use_authorization(&self, delegate: LocationDelegate) {
        let answer = {
            let mut state = lock(&self.state);
            state.observer = Some(delegate);
            if state.authorization != LocationAuthorization::NotDetermined {
                return;
            }
            state.prompts += 1;
            state.grant_on_request
        };
        match answer {
            Some(true) => self.grant(),
            Some(false) => self.deny(),
            None => debug!("Simulated location prompt left pending"),
        }
    }

    fn start_updating_location(
        &self,
        delegate: LocationDelegate,
    ) -> Result<Box<dyn LocationUpdates>, SourceError> {
        let (id, position) = {
            let mut state = lock(&self.state);
            if !state.services_enabled {
                return Err(SourceError::Unavailable);
            }
            if !state.authorization.is_authorized() {
                return Err(SourceError::PermissionDenied);
            }
            state.observer = Some(delegate.clone());
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.push((id, delegate.clone()));
            (id, state.position)
        };

        if let Some(position) = position {
            delegate.location_updated(LocationFix {
                coordinate: Coordinate::new(position.latitude, position.longitude),
                altitude: position.altitude,
                horizontal_accuracy: position.horizontal_accuracy,
                timestamp: Utc::now(),
            });
        }

        Ok(Box::new(SimulatedUpdates {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct SimulatedUpdates {
    id: u64,
    state: Arc<Mutex<SimulatedState>>,
}

impl LocationUpdates for SimulatedUpdates {
    fn stop(self: Box<Self>) {
        lock(&self.state)
            .subscribers
            .retain(|(id, _)| *id != self.id);
    }
}
