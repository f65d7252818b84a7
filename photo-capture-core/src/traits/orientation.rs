use std::sync::Arc;

use crate::models::orientation::InterfaceOrientation;
use crate::session::notifications::Subscription;

pub type OrientationHandler = Arc<dyn Fn(InterfaceOrientation) + Send + Sync + 'static>;

/// A restartable source of device orientation readings (e.g. a motion
/// sensor observer).
///
/// Subscribers receive readings between `start()` and `stop()`.
pub trait OrientationSource: Send + Sync {
    fn start(&self);

    fn stop(&self);

    fn subscribe(&self, handler: OrientationHandler) -> Subscription;
}

/// An orientation source that never changes. Used when no sensor-backed
/// source is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOrientation(pub InterfaceOrientation);

impl Default for FixedOrientation {
    fn default() -> Self {
        Self(InterfaceOrientation::Portrait)
    }
}

impl OrientationSource for FixedOrientation {
    fn start(&self) {}

    fn stop(&self) {}

    fn subscribe(&self, _handler: OrientationHandler) -> Subscription {
        Subscription::empty()
    }
}
