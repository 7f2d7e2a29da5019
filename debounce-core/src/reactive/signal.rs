//! Signal Implementation
//!
//! A Signal is a shared, observable value cell. It is the state that UI
//! code reads from and that debounced writes land in.
//!
//! # How Signals Work
//!
//! 1. `set` replaces the value under a write lock.
//!
//! 2. After the value lock is released, every subscriber is called with
//!    the new value. Subscribers may read or write signals from inside
//!    the callback without deadlocking.
//!
//! 3. Subscribing returns a [`Subscription`]; dropping it unsubscribes.
//!
//! # Thread Safety
//!
//! Values are behind a `parking_lot::RwLock`, so signals can be shared
//! with timer callbacks running on other threads. Writes and their
//! notifications are serialized by a per-signal reentrant lock, so the
//! last value subscribers see is always the value the signal holds.
//! Subscribers on different threads must not write each other's signals
//! in a cycle.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};

/// Counter for generating unique subscription IDs.
static SUBSCRIPTION_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_subscription_id() -> u64 {
    SUBSCRIPTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: RwLock<T>,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    /// Held across a write and its notification.
    writes: ReentrantMutex<()>,
}

/// A reactive value cell.
///
/// Clones share the same value and subscribers.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let _sub = count.subscribe(|v| println!("count is now {v}"));
///
/// count.set(5);  // Prints: "count is now 5"
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<Inner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                subscribers: Mutex::new(Vec::new()),
                writes: ReentrantMutex::new(()),
            }),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Set a new value and notify subscribers.
    pub fn set(&self, value: T) {
        let _writing = self.inner.writes.lock();
        *self.inner.value.write() = value.clone();
        self.notify(&value);
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let _writing = self.inner.writes.lock();
        let value = {
            let mut guard = self.inner.value.write();
            let next = f(&*guard);
            *guard = next.clone();
            next
        };
        self.notify(&value);
    }

    /// Call `callback` with the new value after every change.
    ///
    /// The callback stays registered until the returned [`Subscription`]
    /// is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = next_subscription_id();
        self.inner
            .subscribers
            .lock()
            .push((id, Arc::new(callback)));

        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.subscribers.lock().retain(|(sub, _)| *sub != id);
                }
            })),
        }
    }

    /// Get the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    fn notify(&self, value: &T) {
        // Snapshot so callbacks run without the list locked.
        let callbacks: Vec<Callback<T>> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(value);
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.get())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Guard for a signal subscription.
///
/// Dropping this guard removes the callback from the signal.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the callback registered for the signal's whole lifetime.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
