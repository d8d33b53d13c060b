//! Typed event members
//!
//! Handler types expose their events as [`Event<T>`] (carries a payload) or
//! [`Signal`] (carries nothing). Both are statically typed, so an observer
//! that wants to watch every event without knowing the payload types goes
//! through [`EventMember`]: the type-erased view that reports whether a
//! payload exists and builds a callback specialized for it.

use eyre::Result;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::inspect::{Inspect, Layout};

/// Identifies one attached callback on one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> HandlerId {
    HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Receives every firing of the events it is attached to
pub trait Observer: Send + Sync {
    /// An event fired with a payload
    fn on_payload(&self, payload: &dyn Inspect);

    /// A payload-less event fired; `event` is the name it was attached under
    fn on_signal(&self, event: &str);
}

/// Type-erased view of an event member used during discovery
pub trait EventMember: Send + Sync {
    fn name(&self) -> &str;

    /// Layout of the payload type, `None` for signals
    fn payload(&self) -> Option<Layout>;

    /// Build a callback bound to `observer` and attach it
    fn attach(&self, observer: Arc<dyn Observer>) -> Result<HandlerId>;

    /// Detach a callback; returns false when it was not attached
    fn detach(&self, id: HandlerId) -> Result<bool>;
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type SignalCallback = Arc<dyn Fn() + Send + Sync>;

/// Subscriber list shared by both event kinds
struct Subscribers<F: ?Sized> {
    name: String,
    entries: RwLock<Vec<(HandlerId, Arc<F>)>>,
}

impl<F: ?Sized> Subscribers<F> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(Vec::new()),
        }
    }

    fn add(&self, callback: Arc<F>) -> Result<HandlerId> {
        let id = next_id();
        self.entries
            .write()
            .map_err(|_| eyre::eyre!("subscriber list of '{}' is poisoned", self.name))?
            .push((id, callback));
        Ok(id)
    }

    fn remove(&self, id: HandlerId) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| eyre::eyre!("subscriber list of '{}' is poisoned", self.name))?;
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        Ok(entries.len() != before)
    }

    /// Callbacks are cloned out so they may re-enter the event while running
    fn snapshot(&self) -> Vec<Arc<F>> {
        match self.entries.read() {
            Ok(entries) => entries.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            Err(poisoned) => poisoned.into_inner().iter().map(|(_, cb)| Arc::clone(cb)).collect(),
        }
    }

    fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// An event that delivers a `T` to every subscriber
pub struct Event<T> {
    subscribers: Subscribers<dyn Fn(&T) + Send + Sync>,
}

impl<T> Event<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            subscribers: Subscribers::new(name),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Result<HandlerId>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        self.subscribers.add(callback)
    }

    pub fn unsubscribe(&self, id: HandlerId) -> Result<bool> {
        self.subscribers.remove(id)
    }

    /// Invoke every subscriber synchronously, in subscription order
    pub fn fire(&self, payload: &T) {
        for callback in self.subscribers.snapshot() {
            callback(payload);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.subscribers.name)
            .field("payload", &std::any::type_name::<T>())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T> EventMember for Event<T>
where
    T: Inspect + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.subscribers.name
    }

    fn payload(&self) -> Option<Layout> {
        Some(T::layout())
    }

    fn attach(&self, observer: Arc<dyn Observer>) -> Result<HandlerId> {
        // Monomorphized per payload type: the event only accepts `Fn(&T)`
        self.subscribe(move |payload: &T| observer.on_payload(payload))
    }

    fn detach(&self, id: HandlerId) -> Result<bool> {
        self.unsubscribe(id)
    }
}

/// An event without a payload
pub struct Signal {
    subscribers: Subscribers<dyn Fn() + Send + Sync>,
}

impl Signal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            subscribers: Subscribers::new(name),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Result<HandlerId>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let callback: SignalCallback = Arc::new(callback);
        self.subscribers.add(callback)
    }

    pub fn unsubscribe(&self, id: HandlerId) -> Result<bool> {
        self.subscribers.remove(id)
    }

    pub fn fire(&self) {
        for callback in self.subscribers.snapshot() {
            callback();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.subscribers.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventMember for Signal {
    fn name(&self) -> &str {
        &self.subscribers.name
    }

    fn payload(&self) -> Option<Layout> {
        None
    }

    fn attach(&self, observer: Arc<dyn Observer>) -> Result<HandlerId> {
        // Nothing in the firing identifies the event, so the name is captured here
        let name = self.subscribers.name.clone();
        self.subscribe(move || observer.on_signal(&name))
    }

    fn detach(&self, id: HandlerId) -> Result<bool> {
        self.unsubscribe(id)
    }
}
