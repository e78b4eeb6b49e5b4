//! Per-address endpoint registry and lifecycle owner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::concurrent_map::ConcurrentMap;
use crate::endpoint::endpoint_handle::Endpoint;
use crate::endpoint::endpoint_lazy::EndpointLazy;
use crate::endpoint::endpoint_supervisor::EndpointSupervisor;
use crate::endpoint::endpoint_writer_mailbox::{MailboxSystemMessage, QueueFull};
use crate::messages::{
  DeadLetterEvent, EndpointConnectedEvent, RemoteDeliver, RemoteTerminate, RemoteUnwatch, RemoteWatch,
};
use crate::system::{ActorSystem, Subscription, SystemEvent};

#[cfg(test)]
mod tests;

/// One-shot disconnect trigger for an inbound reader connection.
///
/// Cloning shares the trigger; only the first call wins.
#[derive(Clone)]
pub struct DisconnectSignal {
  sender: Arc<Mutex<Option<oneshot::Sender<bool>>>>,
}

impl DisconnectSignal {
  pub(crate) fn new(sender: oneshot::Sender<bool>) -> Self {
    Self { sender: Arc::new(Mutex::new(Some(sender))) }
  }

  /// Asks the connection to close; `graceful` sends a disconnect frame first.
  pub fn disconnect(&self, graceful: bool) {
    if let Some(sender) = self.sender.lock().take() {
      let _ = sender.send(graceful);
    }
  }
}

/// Owns the lazy-connect endpoint registry and the reader connection table.
///
/// Cloning shares the manager.
#[derive(Clone)]
pub struct EndpointManager {
  inner: Arc<ManagerInner>,
}

struct ManagerInner {
  system:             ActorSystem,
  connections:        ConcurrentMap<String, Arc<EndpointLazy>>,
  reader_connections: ConcurrentMap<String, DisconnectSignal>,
  supervisor:         OnceLock<EndpointSupervisor>,
  subscription:       Mutex<Option<Subscription>>,
  stopped:            AtomicBool,
}

impl EndpointManager {
  /// Creates a manager that is inert until [`EndpointManager::start`].
  #[must_use]
  pub fn new(system: ActorSystem) -> Self {
    Self {
      inner: Arc::new(ManagerInner {
        system,
        connections: ConcurrentMap::new(),
        reader_connections: ConcurrentMap::new(),
        supervisor: OnceLock::new(),
        subscription: Mutex::new(None),
        stopped: AtomicBool::new(false),
      }),
    }
  }

  pub(crate) fn start(&self, supervisor: EndpointSupervisor) {
    let _ = self.inner.supervisor.set(supervisor);
    let manager = self.clone();
    let subscription = self.inner.system.event_stream().subscribe(move |event| match event {
      | SystemEvent::EndpointTerminated(terminated) => manager.remove_endpoint(&terminated.address),
      | SystemEvent::EndpointConnected(connected) => manager.endpoint_connected(connected),
      | SystemEvent::DeadLetter(_) => {},
    });
    *self.inner.subscription.lock() = Some(subscription);
    tracing::debug!("endpoint manager started");
  }

  /// Returns whether the manager has been stopped.
  #[must_use]
  pub fn is_stopped(&self) -> bool {
    self.inner.stopped.load(Ordering::SeqCst)
  }

  fn dead_letter(&self, deliver: RemoteDeliver) {
    self.inner.system.event_stream().publish(&SystemEvent::DeadLetter(DeadLetterEvent {
      target:  deliver.target,
      message: deliver.message,
      sender:  deliver.sender,
    }));
  }

  fn endpoint_slot(&self, address: &str) -> Option<Arc<EndpointLazy>> {
    if self.is_stopped() || self.inner.supervisor.get().is_none() {
      return None;
    }
    let (lazy, _) = self
      .inner
      .connections
      .get_or_set(address.to_string(), Arc::new(EndpointLazy::new(address)));
    Some(lazy)
  }

  /// Returns the live endpoint for `address`, spawning it when absent.
  ///
  /// Concurrent callers observe the same endpoint. Returns `None` before
  /// start and after stop.
  #[must_use]
  pub fn ensure_connected(&self, address: &str) -> Option<Endpoint> {
    let lazy = self.endpoint_slot(address)?;
    let supervisor = self.inner.supervisor.get()?;
    Some(lazy.get_or_spawn(supervisor).clone())
  }

  fn endpoint_connected(&self, event: &EndpointConnectedEvent) {
    if let Some(endpoint) = self.ensure_connected(&event.address) {
      endpoint.watcher().connected(event.clone());
    }
  }

  /// Routes an outbound delivery to its target's endpoint.
  ///
  /// Dead-letters the delivery when the manager is stopped or the writer
  /// queue is full.
  pub fn deliver(&self, deliver: RemoteDeliver) {
    let address = deliver.target.address().to_string();
    match self.endpoint_slot(&address) {
      | Some(lazy) => self.deliver_via(&lazy, deliver),
      | None => self.dead_letter(deliver),
    }
  }

  pub(crate) fn deliver_via(&self, lazy: &EndpointLazy, deliver: RemoteDeliver) {
    let Some(supervisor) = self.inner.supervisor.get() else {
      self.dead_letter(deliver);
      return;
    };
    let mailbox = lazy.get_or_spawn(supervisor).writer_mailbox().clone();
    match mailbox.post_user_message(deliver) {
      | Ok(()) => {
        // an unload may have drained the queue between the slot lookup and the post
        if !lazy.is_active() {
          mailbox.suspend();
          for stranded in mailbox.drain() {
            self.dead_letter(stranded);
          }
        }
      },
      | Err(QueueFull(rejected)) => {
        tracing::warn!(address = %lazy.address(), "writer queue full, dead-lettering delivery");
        self.dead_letter(rejected);
      },
    }
  }

  /// Registers a remote watch. No-op when remoting is stopped.
  pub fn remote_watch(&self, watch: RemoteWatch) {
    if let Some(endpoint) = self.ensure_connected(watch.watchee.address()) {
      endpoint.watcher().watch(watch);
    }
  }

  /// Cancels a remote watch.
  pub fn remote_unwatch(&self, unwatch: RemoteUnwatch) {
    if let Some(endpoint) = self.ensure_connected(unwatch.watchee.address()) {
      endpoint.watcher().unwatch(unwatch);
    }
  }

  /// Reports a single remote process as terminated.
  pub fn remote_terminate(&self, terminate: RemoteTerminate) {
    if let Some(endpoint) = self.ensure_connected(terminate.watchee.address()) {
      endpoint.watcher().terminate(terminate);
    }
  }

  /// Unloads the endpoint for `address`, at most once per registry slot.
  ///
  /// Everything still queued in the writer mailbox is dead-lettered; the
  /// watcher notifies its registrants and stops.
  pub fn remove_endpoint(&self, address: &str) {
    let Some(lazy) = self.inner.connections.get(address) else {
      return;
    };
    if !lazy.begin_unload() {
      return;
    }
    self.inner.connections.delete(address);
    if let Some(endpoint) = lazy.endpoint() {
      endpoint.watcher().address_terminated();
      endpoint.watcher().stop();
      let mailbox = endpoint.writer_mailbox();
      mailbox.suspend();
      for deliver in mailbox.drain() {
        self.dead_letter(deliver);
      }
      mailbox.post_system_message(MailboxSystemMessage::Stop);
    }
    lazy.finish_unload();
    tracing::info!(address, "endpoint unloaded");
  }

  /// Registers the disconnect trigger of an inbound reader connection.
  pub fn register_reader_connection(&self, connection_id: &str, signal: DisconnectSignal) {
    self.inner.reader_connections.set(connection_id.to_string(), signal);
  }

  /// Removes an inbound reader connection from the table.
  pub fn deregister_reader_connection(&self, connection_id: &str) {
    self.inner.reader_connections.delete(connection_id);
  }

  /// Stops the manager: unloads every endpoint and closes every inbound
  /// connection. Later deliveries are dead-lettered.
  pub fn stop(&self, graceful: bool) {
    if self.inner.stopped.swap(true, Ordering::SeqCst) {
      return;
    }
    if let Some(subscription) = self.inner.subscription.lock().take() {
      self.inner.system.event_stream().unsubscribe(&subscription);
    }
    let mut addresses = Vec::new();
    self.inner.connections.range(|address, _| {
      addresses.push(address.clone());
      true
    });
    for address in addresses {
      self.remove_endpoint(&address);
    }
    for (_, signal) in self.inner.reader_connections.drain() {
      signal.disconnect(graceful);
    }
    tracing::info!(graceful, "endpoint manager stopped");
  }
}
