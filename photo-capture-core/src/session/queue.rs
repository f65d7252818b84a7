use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::models::error::QueueError;

type Job<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

enum Message<T> {
    Run(Job<T>),
    Shutdown,
}

struct Shared<T> {
    label: String,
    worker: OnceLock<ThreadId>,
    /// Work submitted with `asap` from the worker itself. Drained right
    /// after the job that submitted it, ahead of the mailbox.
    front: Mutex<VecDeque<Job<T>>>,
}

/// Cloneable submitter for a [`SerialQueue`].
///
/// Handles are `Send + Sync` whatever `T` is: the context never leaves the
/// worker thread, only closures travel.
pub struct QueueHandle<T: 'static> {
    sender: Sender<Message<T>>,
    shared: Arc<Shared<T>>,
}

impl<T: 'static> Clone for QueueHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: 'static> fmt::Debug for QueueHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueHandle")
            .field("label", &self.shared.label)
            .finish()
    }
}

impl<T: 'static> QueueHandle<T> {
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Whether the calling thread is this queue's worker.
    pub fn is_current(&self) -> bool {
        self.shared.worker.get() == Some(&thread::current().id())
    }

    /// Enqueue `job` behind everything already submitted.
    pub fn submit(&self, job: impl FnOnce(&mut T) + Send + 'static) -> Result<(), QueueError> {
        self.sender
            .send(Message::Run(Box::new(job)))
            .map_err(|_| QueueError::Closed)
    }

    /// Run `job` as soon as possible without blocking.
    ///
    /// From another thread this is [`submit`](Self::submit). On the worker
    /// the running job holds the context, so `job` runs immediately after
    /// it, before any other queued work.
    pub fn asap(&self, job: impl FnOnce(&mut T) + Send + 'static) -> Result<(), QueueError> {
        if self.is_current() {
            self.shared.front.lock().push_back(Box::new(job));
            Ok(())
        } else {
            self.submit(job)
        }
    }

    /// Run `f` on the queue and block until it returns.
    ///
    /// Everything submitted before the call has run by the time this
    /// returns. Fails with [`QueueError::Reentrant`] on the worker itself.
    pub fn sync<R, F>(&self, f: F) -> Result<R, QueueError>
    where
        R: Send + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
    {
        if self.is_current() {
            return Err(QueueError::Reentrant);
        }
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.submit(move |context| {
            let _ = reply_tx.send(f(context));
        })?;
        reply_rx.recv().map_err(|_| QueueError::Closed)
    }
}

/// A single worker thread that owns a context `T` and runs submitted jobs
/// against it one at a time, in submission order.
///
/// The context is created on the worker, so it never needs to be `Send`.
pub struct SerialQueue<T: 'static> {
    handle: QueueHandle<T>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<T: 'static> SerialQueue<T> {
    /// Spawn the worker and build its context with `init`, which receives
    /// a handle to the queue being created.
    pub fn new<F>(label: &str, init: F) -> Self
    where
        F: FnOnce(QueueHandle<T>) -> T + Send + 'static,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = QueueHandle {
            sender,
            shared: Arc::new(Shared {
                label: label.to_string(),
                worker: OnceLock::new(),
                front: Mutex::new(VecDeque::new()),
            }),
        };

        let worker_handle = handle.clone();
        let worker = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                let shared = Arc::clone(&worker_handle.shared);
                let _ = shared.worker.set(thread::current().id());
                let mut context = init(worker_handle);
                drain_front(&shared, &mut context);
                run_loop(&receiver, &shared, &mut context);
                log::debug!("Session queue '{}' stopped", shared.label);
            })
            .expect("failed to spawn session queue thread");

        Self {
            handle,
            worker: Some(worker),
        }
    }

    pub fn handle(&self) -> QueueHandle<T> {
        self.handle.clone()
    }

    pub fn is_current(&self) -> bool {
        self.handle.is_current()
    }

    pub fn submit(&self, job: impl FnOnce(&mut T) + Send + 'static) -> Result<(), QueueError> {
        self.handle.submit(job)
    }

    pub fn asap(&self, job: impl FnOnce(&mut T) + Send + 'static) -> Result<(), QueueError> {
        self.handle.asap(job)
    }

    pub fn sync<R, F>(&self, f: F) -> Result<R, QueueError>
    where
        R: Send + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
    {
        self.handle.sync(f)
    }
}

impl<T: 'static> Drop for SerialQueue<T> {
    fn drop(&mut self) {
        let _ = self.handle.sender.send(Message::Shutdown);
        if self.handle.is_current() {
            // Dropped from one of our own jobs; the loop exits on its own.
            return;
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Session queue '{}' worker panicked", self.handle.label());
            }
        }
    }
}

fn run_loop<T>(receiver: &Receiver<Message<T>>, shared: &Shared<T>, context: &mut T) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Run(job) => {
                job(context);
                drain_front(shared, context);
            }
            Message::Shutdown => break,
        }
    }
}

fn drain_front<T>(shared: &Shared<T>, context: &mut T) {
    loop {
        let next = shared.front.lock().pop_front();
        match next {
            Some(job) => job(context),
            None => break,
        }
    }
}
