//! Location source implementation
//!
//! Location is the permission-gated source: starting it may first have to ask
//! the user for access, and the answer can arrive at any later time on any
//! thread. The platform service sits behind [`LocationProvider`]; hosts
//! without one use [`SimulatedLocationProvider`].

mod provider;
mod simulated;

pub use provider::{LocationDelegate, LocationProvider, LocationUpdates};
pub use simulated::SimulatedLocationProvider;

use chrono::{DateTime, Utc};
use gathered_core::sync::lock;
use gathered_core::{
    AnyProperty, BasicProperty, Controllable, DisplayFormatter, MeasurementFormatter,
    MonitoringLifecycle, MonitoringState, Property, Source, SourceError, SourceEvent,
};
use gathered_types::{
    Availability, Coordinate, LocationAuthorization, LocationFix, LocationSourceConfig,
    SourceIdentifier,
};
use log::{debug, info};
use provider::LocationEvents;
use std::sync::{Arc, Mutex, Weak};

struct LocationInner<P: LocationProvider> {
    provider: P,
    delegate: LocationDelegate,
    lifecycle: MonitoringLifecycle,
    updates: Mutex<Option<Box<dyn LocationUpdates>>>,
    authorization: Arc<BasicProperty<LocationAuthorization>>,
    coordinate: Arc<BasicProperty<Option<Coordinate>>>,
    latitude: Arc<BasicProperty<Option<f64>>>,
    longitude: Arc<BasicProperty<Option<f64>>>,
    altitude: Arc<BasicProperty<Option<f64>>>,
    horizontal_accuracy: Arc<BasicProperty<Option<f64>>>,
}

impl<P: LocationProvider> LocationInner<P> {
    fn availability(&self) -> Availability {
        if !self.provider.services_enabled() {
            return Availability::Unavailable;
        }
        self.provider.authorization_status().availability()
    }

    /// Ask the provider for fixes. Called only after the lifecycle has moved
    /// to `Monitoring`.
    fn open_updates(&self) {
        match self.provider.start_updating_location(self.delegate.clone()) {
            Ok(handle) => {
                let mut updates = lock(&self.updates);
                if self.lifecycle.is_updating() && updates.is_none() {
                    *updates = Some(handle);
                } else {
                    // Stopped while the provider was starting
                    drop(updates);
                    handle.stop();
                }
            }
            Err(error) => {
                self.lifecycle.finish(Some(error));
            }
        }
    }

    fn close_updates(&self) {
        let handle = lock(&self.updates).take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    fn clear_position(&self, date: DateTime<Utc>) {
        self.coordinate.clear(date);
        self.latitude.clear(date);
        self.longitude.clear(date);
        self.altitude.clear(date);
        self.horizontal_accuracy.clear(date);
    }
}

impl<P: LocationProvider> LocationEvents for LocationInner<P> {
    fn authorization_changed(&self, status: LocationAuthorization) {
        let now = Utc::now();
        if self.authorization.update_value_if_different(status, now) {
            self.lifecycle
                .emit(SourceEvent::AvailabilityChanged(self.availability()));
        }

        if status.is_authorized() {
            if self.lifecycle.permission_granted() {
                self.open_updates();
            }
            return;
        }
        if status == LocationAuthorization::NotDetermined {
            return;
        }

        // Denied or restricted: whatever we knew about the position is stale
        let error = SourceError::from_availability(status.availability())
            .unwrap_or(SourceError::PermissionDenied);
        match self.lifecycle.state() {
            MonitoringState::NotMonitoring => self.clear_position(now),
            MonitoringState::AskingForPermissions | MonitoringState::Monitoring => {
                self.close_updates();
                self.clear_position(now);
                self.lifecycle.finish(Some(error));
            }
        }
    }

    fn location_updated(&self, fix: LocationFix) {
        if !self.lifecycle.is_updating() {
            debug!("Ignoring location fix delivered while not monitoring");
            return;
        }
        let date = fix.timestamp;
        self.latitude
            .update_value(Some(fix.coordinate.latitude), date);
        self.longitude
            .update_value(Some(fix.coordinate.longitude), date);
        self.altitude.update_value(fix.altitude, date);
        self.horizontal_accuracy
            .update_value(fix.horizontal_accuracy, date);
        self.coordinate.update_value(Some(fix.coordinate), date);
    }

    fn failed(&self, message: String) {
        self.lifecycle.emit(SourceEvent::UpdateFailed { message });
    }
}

/// Device position, gated on the user's permission
pub struct LocationSource<P: LocationProvider> {
    inner: Arc<LocationInner<P>>,
}

impl<P: LocationProvider> LocationSource<P> {
    pub fn new(provider: P) -> Self {
        let status = provider.authorization_status();
        let degrees = || MeasurementFormatter::new("°", 5);
        let meters = || MeasurementFormatter::new("m", 1);
        let inner = Arc::new_cyclic(|weak: &Weak<LocationInner<P>>| {
            let target: Weak<dyn LocationEvents> = weak.clone();
            LocationInner {
                provider,
                delegate: LocationDelegate::new(target),
                lifecycle: MonitoringLifecycle::new("location".into()),
                updates: Mutex::new(None),
                authorization: Arc::new(
                    BasicProperty::new("Authorization", status).with_formatter(DisplayFormatter),
                ),
                coordinate: Arc::new(BasicProperty::optional_with("Coordinate", DisplayFormatter)),
                latitude: Arc::new(BasicProperty::<Option<f64>>::optional_with("Latitude", degrees())),
                longitude: Arc::new(BasicProperty::<Option<f64>>::optional_with("Longitude", degrees())),
                altitude: Arc::new(BasicProperty::<Option<f64>>::optional_with("Altitude", meters())),
                horizontal_accuracy: Arc::new(BasicProperty::<Option<f64>>::optional_with(
                    "Horizontal Accuracy",
                    meters(),
                )),
            }
        });
        inner.provider.set_delegate(inner.delegate.clone());
        Self { inner }
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    pub fn authorization(&self) -> &BasicProperty<LocationAuthorization> {
        &self.inner.authorization
    }

    pub fn coordinate(&self) -> &BasicProperty<Option<Coordinate>> {
        &self.inner.coordinate
    }

    pub fn latitude(&self) -> &BasicProperty<Option<f64>> {
        &self.inner.latitude
    }

    pub fn longitude(&self) -> &BasicProperty<Option<f64>> {
        &self.inner.longitude
    }

    pub fn altitude(&self) -> &BasicProperty<Option<f64>> {
        &self.inner.altitude
    }

    pub fn horizontal_accuracy(&self) -> &BasicProperty<Option<f64>> {
        &self.inner.horizontal_accuracy
    }

    /// Ask for when-in-use access and wait for the user's answer.
    ///
    /// Resolves immediately when the status is already decided. Does not
    /// start updating on its own.
    pub async fn request_permission(&self) -> LocationAuthorization {
        let status = self.inner.provider.authorization_status();
        if status != LocationAuthorization::NotDetermined {
            return status;
        }

        let mut answers = self.inner.authorization.updates_stream();
        self.inner
            .provider
            .request_when_in_use_authorization(self.inner.delegate.clone());
        loop {
            let status = self.inner.provider.authorization_status();
            if status != LocationAuthorization::NotDetermined {
                return status;
            }
            if answers.recv().await.is_none() {
                return self.inner.provider.authorization_status();
            }
        }
    }
}

impl LocationSource<SimulatedLocationProvider> {
    /// A location source backed by the simulated provider
    pub fn simulated(config: &LocationSourceConfig) -> Self {
        Self::new(SimulatedLocationProvider::from_config(config))
    }
}

impl<P: LocationProvider> Source for LocationSource<P> {
    fn identifier(&self) -> SourceIdentifier {
        "location".into()
    }

    fn name(&self) -> &str {
        "Location"
    }

    fn availability(&self) -> Availability {
        self.inner.availability()
    }

    fn all_properties(&self) -> Vec<AnyProperty> {
        vec![
            AnyProperty::new(Arc::clone(&self.inner.authorization)),
            AnyProperty::new(Arc::clone(&self.inner.coordinate)),
            AnyProperty::new(Arc::clone(&self.inner.latitude)),
            AnyProperty::new(Arc::clone(&self.inner.longitude)),
            AnyProperty::new(Arc::clone(&self.inner.altitude)),
            AnyProperty::new(Arc::clone(&self.inner.horizontal_accuracy)),
        ]
    }

    fn as_controllable(&self) -> Option<&dyn Controllable> {
        Some(self)
    }
}

impl<P: LocationProvider> Controllable for LocationSource<P> {
    fn lifecycle(&self) -> &MonitoringLifecycle {
        &self.inner.lifecycle
    }

    fn start_updating(&self) {
        let inner = &self.inner;
        if inner.lifecycle.state() != MonitoringState::NotMonitoring {
            debug!("Location source already started");
            return;
        }

        match inner.availability() {
            Availability::Available => {
                if inner.lifecycle.begin_monitoring() {
                    inner.open_updates();
                }
            }
            Availability::RequiresPermissionsPrompt => {
                if inner.lifecycle.begin_asking() {
                    info!("Requesting location permission");
                    inner
                        .provider
                        .request_when_in_use_authorization(inner.delegate.clone());
                }
            }
            availability => {
                let error = SourceError::from_availability(availability)
                    .unwrap_or(SourceError::Unavailable);
                inner.lifecycle.reject(error);
            }
        }
    }

    fn stop_updating(&self) {
        self.inner.close_updates();
        self.inner.lifecycle.finish(None);
    }
}

impl<P: LocationProvider> Drop for LocationSource<P> {
    fn drop(&mut self) {
        self.inner.close_updates();
    }
}
