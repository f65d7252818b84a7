use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::models::camera_models::{AutoToggle, BodyPosition, DeviceInfo, Dimensions, Mode, Toggle};
use crate::models::capture_item::PhotoCaptureItem;
use crate::models::captured_photo::CapturedPhoto;
use crate::models::interruption::SessionInterruption;
use crate::models::orientation::VideoOrientation;
use crate::models::state::SessionState;

pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Identifies a listener registered on a [`Published`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(ListenerId, Listener<T>)>,
}

/// An observable value.
///
/// Readable from any thread. Only the session writes it, always from its
/// queue, and every write invokes the listeners on the queue with the new
/// value. Separate `Published` fields are not updated atomically with
/// respect to each other.
pub struct Published<T> {
    value: RwLock<T>,
    listeners: Mutex<Listeners<T>>,
}

impl<T: Clone + Send + Sync + 'static> Published<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            listeners: Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Register `listener` for every future write. The current value is not
    /// replayed.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let mut listeners = self.listeners.lock();
        listeners.next_id += 1;
        let id = ListenerId(listeners.next_id);
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(existing, _)| *existing != id);
        listeners.entries.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    pub(crate) fn set(&self, value: T) {
        *self.value.write() = value.clone();
        self.notify(&value);
    }

    /// Mutate in place, then notify with the result.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, snapshot) = {
            let mut value = self.value.write();
            let result = f(&mut value);
            (result, value.clone())
        };
        self.notify(&snapshot);
        result
    }

    fn notify(&self, value: &T) {
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Published<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Published").field(&*self.value.read()).finish()
    }
}

/// Everything a capture session publishes, each field independently
/// observable.
#[derive(Debug)]
pub struct SessionObservables {
    pub state: Published<SessionState>,
    pub mode: Published<Mode>,
    pub current_camera: Published<Option<DeviceInfo>>,
    pub body_position: Published<BodyPosition>,
    /// `None` when the current camera has no flash.
    pub flash: Published<Option<AutoToggle>>,
    /// `None` when the photo output cannot record live photos.
    pub live_photos: Published<Option<Toggle>>,
    pub dimensions: Published<Option<Dimensions>>,
    pub session_interruption: Published<Option<SessionInterruption>>,
    pub photo_capture_items: Published<Vec<PhotoCaptureItem>>,
    pub live_photos_in_progress: Published<usize>,
    pub video_orientation: Published<VideoOrientation>,
}

impl SessionObservables {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            state: Published::default(),
            mode: Published::new(mode),
            current_camera: Published::new(None),
            body_position: Published::new(BodyPosition::Back),
            flash: Published::new(None),
            live_photos: Published::new(None),
            dimensions: Published::new(None),
            session_interruption: Published::new(None),
            photo_capture_items: Published::new(Vec::new()),
            live_photos_in_progress: Published::new(0),
            video_orientation: Published::default(),
        }
    }
}

/// Fans completed photos out to every subscribed receiver.
#[derive(Default)]
pub struct PhotoBroadcaster {
    subscribers: Mutex<Vec<Sender<Arc<CapturedPhoto>>>>,
}

impl PhotoBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// A receiver for every photo published from now on. Dropping it
    /// unsubscribes.
    pub fn subscribe(&self) -> Receiver<Arc<CapturedPhoto>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Returns the number of receivers the photo was delivered to.
    pub(crate) fn publish(&self, photo: Arc<CapturedPhoto>) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(Arc::clone(&photo)).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl fmt::Debug for PhotoBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::captured_photo::fixtures;

    #[test]
    fn listeners_see_every_write() {
        let value = Published::new(0usize);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        value.subscribe(move |v| sink.lock().push(*v));

        value.set(1);
        value.update(|v| *v += 2);
        value.set(3);

        assert_eq!(value.get(), 3);
        assert_eq!(*seen.lock(), vec![1, 3, 3]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let value = Published::new(String::new());
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let id = value.subscribe(move |_| *counter.lock() += 1);

        assert!(value.unsubscribe(id));
        assert!(!value.unsubscribe(id));
        value.set("changed".into());
        assert_eq!(*calls.lock(), 0);
        assert_eq!(value.listener_count(), 0);
    }

    #[test]
    fn listener_may_read_the_value_it_is_notified_about() {
        let value = Arc::new(Published::new(false));
        let reader = Arc::clone(&value);
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        value.subscribe(move |_| *sink.lock() = Some(reader.get()));

        value.set(true);
        assert_eq!(*observed.lock(), Some(true));
    }

    #[test]
    fn observables_start_idle_on_the_back_camera() {
        let observables = SessionObservables::new(Mode::Photo);
        assert_eq!(observables.state.get(), SessionState::Idle);
        assert_eq!(observables.body_position.get(), BodyPosition::Back);
        assert_eq!(observables.live_photos_in_progress.get(), 0);
        assert!(observables.photo_capture_items.get().is_empty());
        assert_eq!(observables.video_orientation.get(), VideoOrientation::Portrait);
    }

    #[test]
    fn broadcaster_delivers_to_every_live_subscriber() {
        let broadcaster = PhotoBroadcaster::new();
        let first = broadcaster.subscribe();
        let second = broadcaster.subscribe();
        drop(second);

        let photo = Arc::new(fixtures::photo(b"one"));
        assert_eq!(broadcaster.publish(Arc::clone(&photo)), 1);
        assert_eq!(broadcaster.subscriber_count(), 1);
        assert_eq!(first.try_recv().unwrap().request_id, photo.request_id);
    }

    #[test]
    fn late_subscriber_misses_earlier_photos() {
        let broadcaster = PhotoBroadcaster::new();
        broadcaster.publish(Arc::new(fixtures::photo(b"early")));
        let late = broadcaster.subscribe();
        assert!(late.try_recv().is_err());
    }
}
