use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::traits::hardware::{EventHandler, HardwareEvent, Topic};

/// Cancellation token for a registered callback.
///
/// Dropping the token unregisters the callback. Holders keep tokens in a
/// `Vec` per scope (lifetime, session, device) and clear the `Vec` to tear
/// the whole scope down.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct Registration {
    id: u64,
    topic: Topic,
    handler: EventHandler,
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// Topic-filtered fan-out of [`HardwareEvent`]s.
///
/// Backends embed a hub to implement
/// [`CaptureHardware::subscribe`](crate::CaptureHardware::subscribe).
/// Handlers run on the posting thread, outside the hub's lock.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Arc<Mutex<HubInner>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: Topic, handler: EventHandler) -> Subscription {
        let id = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.registrations.push(Registration { id, topic, handler });
            id
        };

        let weak: Weak<Mutex<HubInner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().registrations.retain(|r| r.id != id);
            }
        })
    }

    /// Deliver `event` to every handler subscribed to its topic. Returns
    /// the number of handlers invoked.
    pub fn post(&self, event: &HardwareEvent) -> usize {
        let topic = event.topic();
        let handlers: Vec<EventHandler> = self
            .inner
            .lock()
            .registrations
            .iter()
            .filter(|r| r.topic == topic)
            .map(|r| Arc::clone(&r.handler))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.inner
            .lock()
            .registrations
            .iter()
            .filter(|r| &r.topic == topic)
            .count()
    }

    pub fn total_subscribers(&self) -> usize {
        self.inner.lock().registrations.len()
    }
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.total_subscribers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, EventHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, Arc::new(move |_: &HardwareEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn delivers_only_matching_topic() {
        let hub = NotificationHub::new();
        let (began, began_handler) = counter();
        let (ended, ended_handler) = counter();
        let _a = hub.subscribe(Topic::InterruptionBegan, began_handler);
        let _b = hub.subscribe(Topic::InterruptionEnded, ended_handler);

        assert_eq!(hub.post(&HardwareEvent::InterruptionBegan(None)), 1);
        assert_eq!(began.load(Ordering::SeqCst), 1);
        assert_eq!(ended.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn device_topics_match_on_device_id() {
        let hub = NotificationHub::new();
        let (count, handler) = counter();
        let _s = hub.subscribe(
            Topic::SubjectAreaChanged { device_id: "back-wide".into() },
            handler,
        );

        hub.post(&HardwareEvent::SubjectAreaChanged { device_id: "front-wide".into() });
        assert_eq!(count.load(Ordering::SeqCst), 0);

        hub.post(&HardwareEvent::SubjectAreaChanged { device_id: "back-wide".into() });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let hub = NotificationHub::new();
        let (count, handler) = counter();
        let subscription = hub.subscribe(Topic::RuntimeError, handler);
        assert_eq!(hub.subscriber_count(&Topic::RuntimeError), 1);

        drop(subscription);
        assert_eq!(hub.subscriber_count(&Topic::RuntimeError), 0);
        assert_eq!(hub.post(&HardwareEvent::RuntimeError(None)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscription_outliving_hub_is_harmless() {
        let hub = NotificationHub::new();
        let (_count, handler) = counter();
        let subscription = hub.subscribe(Topic::InputFormatChanged, handler);
        drop(hub);
        subscription.cancel();
    }

    #[test]
    fn handler_may_subscribe_while_posting() {
        let hub = NotificationHub::new();
        let nested = hub.clone();
        let keep: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let keep_in_handler = Arc::clone(&keep);
        let _s = hub.subscribe(
            Topic::InputFormatChanged,
            Arc::new(move |_| {
                let (_c, h) = counter();
                keep_in_handler.lock().push(nested.subscribe(Topic::InterruptionEnded, h));
            }),
        );

        hub.post(&HardwareEvent::InputFormatChanged);
        assert_eq!(hub.subscriber_count(&Topic::InterruptionEnded), 1);
    }
}
