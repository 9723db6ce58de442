//! Topic broker: an in-process multicast registry.
//!
//! Listeners are kept per topic in registration order. Delivery snapshots the
//! topic's list under the lock and invokes the snapshot with the lock
//! released, so listeners may register or deregister while a delivery runs:
//!   - a listener removed during delivery still runs in that round,
//!   - a listener added during delivery first runs on the next delivery.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::Value;

type ListenerFn = dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync;

/// A unit of work invoked with each payload published to its topic.
///
/// Clones share identity: deregistration removes the registration made with
/// the same underlying allocation, never an equal-looking closure.
#[derive(Clone)]
pub struct Listener(Arc<ListenerFn>);

impl Listener {
    /// Wrap an async callback.
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: Arc<ListenerFn> = Arc::new(move |payload| callback(payload).boxed());
        Self(callback)
    }

    /// Start one invocation. The returned future settles when the listener has.
    pub fn invoke(&self, payload: Value) -> BoxFuture<'static, ()> {
        (self.0)(payload)
    }

    /// Whether both handles refer to the same registration.
    pub fn same_as(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Topic to listeners registry.
#[derive(Default)]
pub struct Broker {
    topics: Mutex<HashMap<String, Vec<Listener>>>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to `topic`. Registering the same listener twice
    /// makes it run twice per delivery.
    pub fn register(&self, topic: &str, listener: Listener) {
        let count = {
            let mut topics = self.topics.lock();
            let listeners = topics.entry(topic.to_string()).or_default();
            listeners.push(listener);
            listeners.len()
        };
        tracing::debug!(topic, listeners = count, "listener registered");
    }

    /// Remove one registration of `listener` from `topic`.
    ///
    /// Returns `false` when the listener was not registered there.
    pub fn deregister(&self, topic: &str, listener: &Listener) -> bool {
        let removed = {
            let mut topics = self.topics.lock();
            let Some(listeners) = topics.get_mut(topic) else {
                return false;
            };
            let Some(index) = listeners.iter().position(|l| l.same_as(listener)) else {
                return false;
            };
            listeners.remove(index);
            if listeners.is_empty() {
                topics.remove(topic);
            }
            true
        };
        tracing::debug!(topic, "listener deregistered");
        removed
    }

    fn snapshot(&self, topic: &str) -> Vec<Listener> {
        self.topics.lock().get(topic).cloned().unwrap_or_default()
    }

    /// Start every listener currently on `topic`, in registration order,
    /// without waiting for them.
    pub fn dispatch(&self, topic: &str, payload: &Value) -> Vec<BoxFuture<'static, ()>> {
        let snapshot = self.snapshot(topic);
        tracing::trace!(topic, listeners = snapshot.len(), "delivering payload");
        snapshot.iter().map(|l| l.invoke(payload.clone())).collect()
    }

    /// Invoke every listener on `topic` and wait until all have settled.
    ///
    /// Returns how many listeners were invoked.
    pub async fn deliver(&self, topic: &str, payload: &Value) -> usize {
        let invocations = self.dispatch(topic, payload);
        let count = invocations.len();
        join_all(invocations).await;
        count
    }

    /// Number of registrations on `topic`.
    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, Vec::len)
    }

    /// Number of topics with at least one listener.
    pub fn topic_count(&self) -> usize {
        self.topics.lock().len()
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.lock();
        let mut map = f.debug_map();
        for (topic, listeners) in topics.iter() {
            map.entry(topic, &listeners.len());
        }
        map.finish()
    }
}
