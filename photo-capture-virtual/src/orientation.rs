//! Virtual device orientation sensor.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use photo_capture_core::models::orientation::InterfaceOrientation;
use photo_capture_core::session::notifications::Subscription;
use photo_capture_core::traits::orientation::{OrientationHandler, OrientationSource};

#[derive(Default)]
struct Handlers {
    next_id: u64,
    registered: Vec<(u64, OrientationHandler)>,
}

/// An orientation source driven by [`rotate`](Self::rotate).
///
/// Like a motion sensor it only reports readings while started.
#[derive(Default)]
pub struct VirtualOrientation {
    handlers: Arc<Mutex<Handlers>>,
    started: AtomicBool,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
}

impl VirtualOrientation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().registered.len()
    }

    /// Report a new reading on the calling thread. Returns the number of
    /// subscribers notified; zero while stopped.
    pub fn rotate(&self, orientation: InterfaceOrientation) -> usize {
        if !self.is_started() {
            log::debug!("Virtual orientation stopped; dropping {:?}", orientation);
            return 0;
        }
        let handlers: Vec<OrientationHandler> = self
            .handlers
            .lock()
            .registered
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in &handlers {
            handler(orientation);
        }
        handlers.len()
    }
}

impl OrientationSource for VirtualOrientation {
    fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
        self.start_count.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        self.stop_count.fetch_add(1, Ordering::SeqCst);
    }

    fn subscribe(&self, handler: OrientationHandler) -> Subscription {
        let id = {
            let mut handlers = self.handlers.lock();
            handlers.next_id += 1;
            let id = handlers.next_id;
            handlers.registered.push((id, handler));
            id
        };

        let weak: Weak<Mutex<Handlers>> = Arc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = weak.upgrade() {
                handlers.lock().registered.retain(|(registered, _)| *registered != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_while_started() {
        let source = VirtualOrientation::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = source.subscribe(Arc::new(move |o: InterfaceOrientation| sink.lock().push(o)));

        assert_eq!(source.rotate(InterfaceOrientation::LandscapeLeft), 0);
        source.start();
        assert_eq!(source.rotate(InterfaceOrientation::LandscapeRight), 1);
        source.stop();
        source.rotate(InterfaceOrientation::Portrait);

        assert_eq!(*seen.lock(), vec![InterfaceOrientation::LandscapeRight]);
        assert_eq!((source.start_count(), source.stop_count()), (1, 1));
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let source = VirtualOrientation::new();
        let subscription = source.subscribe(Arc::new(|_: InterfaceOrientation| {}));
        assert_eq!(source.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(source.subscriber_count(), 0);
    }
}
