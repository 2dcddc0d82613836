//! Platform boundary for location services

use gathered_core::SourceError;
use gathered_types::{LocationAuthorization, LocationFix};
use std::sync::{Arc, Weak};

/// A location service: reports permission state, shows the permission
/// prompt, and delivers fixes.
///
/// Callbacks go through the [`LocationDelegate`] passed in and may arrive on
/// any thread, including synchronously from within these calls.
pub trait LocationProvider: Send + Sync + 'static {
    fn authorization_status(&self) -> LocationAuthorization;

    /// Whether location services are switched on for the whole host
    fn services_enabled(&self) -> bool;

    /// Register the delegate told about authorization changes
    fn set_delegate(&self, delegate: LocationDelegate);

    /// Ask the user for when-in-use access. The answer arrives through
    /// [`LocationDelegate::authorization_changed`].
    fn request_when_in_use_authorization(&self, delegate: LocationDelegate);

    /// Begin delivering fixes to `delegate` until the returned handle is
    /// stopped
    fn start_updating_location(
        &self,
        delegate: LocationDelegate,
    ) -> Result<Box<dyn LocationUpdates>, SourceError>;
}

/// Handle to a running stream of location fixes
pub trait LocationUpdates: Send {
    fn stop(self: Box<Self>);
}

pub(crate) trait LocationEvents: Send + Sync {
    fn authorization_changed(&self, status: LocationAuthorization);
    fn location_updated(&self, fix: LocationFix);
    fn failed(&self, message: String);
}

/// Callback target handed to a [`LocationProvider`].
///
/// Holds only a weak reference to its source: callbacks arriving after the
/// source is dropped are ignored.
#[derive(Clone)]
pub struct LocationDelegate {
    target: Weak<dyn LocationEvents>,
}

impl LocationDelegate {
    pub(crate) fn new(target: Weak<dyn LocationEvents>) -> Self {
        Self { target }
    }

    fn target(&self) -> Option<Arc<dyn LocationEvents>> {
        self.target.upgrade()
    }

    pub fn authorization_changed(&self, status: LocationAuthorization) {
        if let Some(target) = self.target() {
            target.authorization_changed(status);
        }
    }

    pub fn location_updated(&self, fix: LocationFix) {
        if let Some(target) = self.target() {
            target.location_updated(fix);
        }
    }

    pub fn failed(&self, message: impl Into<String>) {
        if let Some(target) = self.target() {
            target.failed(message.into());
        }
    }

    /// Whether the source behind this delegate still exists
    pub fn is_connected(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl std::fmt::Debug for LocationDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationDelegate")
            .field("connected", &self.is_connected())
            .finish()
    }
}
