//! Process-wide typed event bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::messages::{DeadLetterEvent, EndpointConnectedEvent, EndpointTerminatedEvent};

/// Events published on the system event stream.
#[derive(Debug, Clone)]
pub enum SystemEvent {
  /// A remote endpoint established its connection.
  EndpointConnected(EndpointConnectedEvent),
  /// A remote endpoint terminated and will be unloaded.
  EndpointTerminated(EndpointTerminatedEvent),
  /// A message could not be delivered to its target.
  DeadLetter(DeadLetterEvent),
}

type Handler = Arc<dyn Fn(&SystemEvent) + Send + Sync>;

/// Subscription token returned by [`EventStream::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
  id: u64,
}

/// Fan-out bus delivering [`SystemEvent`]s to registered handlers.
///
/// Cloning shares the underlying bus. Handlers run on the publisher's task,
/// outside the subscriber lock.
#[derive(Clone)]
pub struct EventStream {
  inner: Arc<EventStreamInner>,
}

struct EventStreamInner {
  next_id:     AtomicU64,
  subscribers: RwLock<HashMap<u64, Handler>>,
}

impl EventStream {
  /// Creates an empty event stream.
  #[must_use]
  pub fn new() -> Self {
    Self {
      inner: Arc::new(EventStreamInner {
        next_id:     AtomicU64::new(0),
        subscribers: RwLock::new(HashMap::new()),
      }),
    }
  }

  /// Registers a handler and returns its subscription token.
  pub fn subscribe<F>(&self, handler: F) -> Subscription
  where
    F: Fn(&SystemEvent) + Send + Sync + 'static, {
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    self.inner.subscribers.write().insert(id, Arc::new(handler));
    Subscription { id }
  }

  /// Removes a previously registered handler.
  pub fn unsubscribe(&self, subscription: &Subscription) {
    self.inner.subscribers.write().remove(&subscription.id);
  }

  /// Publishes an event to every current subscriber.
  pub fn publish(&self, event: &SystemEvent) {
    let handlers: Vec<Handler> = self.inner.subscribers.read().values().cloned().collect();
    for handler in handlers {
      handler(event);
    }
  }
}

impl Default for EventStream {
  fn default() -> Self {
    Self::new()
  }
}
