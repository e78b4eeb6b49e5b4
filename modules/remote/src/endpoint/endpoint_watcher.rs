//! Per-address watch bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::endpoint::endpoint_writer_mailbox::Dispatcher;
use crate::messages::{EndpointConnectedEvent, RemoteDeliver, RemoteTerminate, RemoteUnwatch, RemoteWatch};
use crate::system::{ActorSystem, Pid, SystemMessage, Terminated, TerminatedReason, Unwatch, Watch};


/// Commands handled by an endpoint watcher.
#[derive(Debug, Clone)]
pub enum WatcherMessage {
  /// Register a watch and forward it to the remote node.
  Watch(RemoteWatch),
  /// Remove a watch and forward the cancellation.
  Unwatch(RemoteUnwatch),
  /// The endpoint established its connection.
  Connected(EndpointConnectedEvent),
  /// A single watched process terminated.
  Terminate(RemoteTerminate),
  /// The whole remote address terminated.
  AddressTerminated,
  /// Stop the watcher task.
  Stop,
}

pub(crate) type DeliverFn = Arc<dyn Fn(RemoteDeliver) + Send + Sync>;

/// Watch state for one remote address, keyed by watcher id.
///
/// Guarantees exactly one `Terminated` per registered watchee: entries are
/// removed as they are notified, and after address termination new watch
/// attempts are answered immediately instead of being recorded.
pub(crate) struct WatcherBehavior {
  system:     ActorSystem,
  address:    String,
  deliver:    DeliverFn,
  watched:    HashMap<String, (Pid, HashMap<String, Pid>)>,
  terminated: bool,
}

impl WatcherBehavior {
  pub(crate) fn new(system: ActorSystem, address: String, deliver: DeliverFn) -> Self {
    Self { system, address, deliver, watched: HashMap::new(), terminated: false }
  }

  fn notify_terminated(&self, watcher: &Pid, watchee: &Pid, why: TerminatedReason) {
    self
      .system
      .send_system(watcher, SystemMessage::Terminated(Terminated { who: watchee.clone(), why }));
  }

  /// Handles one command; returns `false` when the watcher must stop.
  pub(crate) fn handle(&mut self, message: WatcherMessage) -> bool {
    match message {
      | WatcherMessage::Watch(watch) => {
        if self.terminated {
          self.notify_terminated(&watch.watcher, &watch.watchee, TerminatedReason::AddressTerminated);
          return true;
        }
        let entry = self
          .watched
          .entry(watch.watcher.id().to_string())
          .or_insert_with(|| (watch.watcher.clone(), HashMap::new()));
        entry.1.insert(watch.watchee.lookup_key(), watch.watchee.clone());
        (self.deliver)(RemoteDeliver {
          header:  None,
          message: Arc::new(Watch { watcher: watch.watcher }),
          target:  watch.watchee,
          sender:  None,
        });
      },
      | WatcherMessage::Unwatch(unwatch) => {
        if self.terminated {
          return true;
        }
        if let Some(entry) = self.watched.get_mut(unwatch.watcher.id()) {
          entry.1.remove(&unwatch.watchee.lookup_key());
          if entry.1.is_empty() {
            self.watched.remove(unwatch.watcher.id());
          }
        }
        (self.deliver)(RemoteDeliver {
          header:  None,
          message: Arc::new(Unwatch { watcher: unwatch.watcher }),
          target:  unwatch.watchee,
          sender:  None,
        });
      },
      | WatcherMessage::Connected(event) => {
        // registrations survive the connection coming up
        tracing::debug!(address = %event.address, "endpoint connected");
      },
      | WatcherMessage::Terminate(terminate) => {
        let mut notified = false;
        if let Some(entry) = self.watched.get_mut(terminate.watcher.id()) {
          if entry.1.remove(&terminate.watchee.lookup_key()).is_some() {
            notified = true;
          }
          if entry.1.is_empty() {
            self.watched.remove(terminate.watcher.id());
          }
        }
        if notified {
          self.notify_terminated(&terminate.watcher, &terminate.watchee, TerminatedReason::Stopped);
        }
      },
      | WatcherMessage::AddressTerminated => {
        if !self.terminated {
          self.terminated = true;
          tracing::info!(
            address = %self.address,
            watchers = self.watched.len(),
            "notifying watchers of terminated address"
          );
          let watched = std::mem::take(&mut self.watched);
          for (_, (watcher, watchees)) in watched {
            for (_, watchee) in watchees {
              self.notify_terminated(&watcher, &watchee, TerminatedReason::AddressTerminated);
            }
          }
        }
      },
      | WatcherMessage::Stop => return false,
    }
    true
  }
}

/// Handle to a watcher task. Cloning shares the task.
#[derive(Clone)]
pub struct EndpointWatcher {
  sender: mpsc::UnboundedSender<WatcherMessage>,
}

impl EndpointWatcher {
  pub(crate) fn spawn(dispatcher: &Dispatcher, behavior: WatcherBehavior) -> Self {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    dispatcher.schedule(async move {
      let mut behavior = behavior;
      while let Some(message) = receiver.recv().await {
        if !behavior.handle(message) {
          break;
        }
      }
    });
    Self { sender }
  }

  /// Registers a watch on a remote process.
  pub fn watch(&self, watch: RemoteWatch) {
    let _ = self.sender.send(WatcherMessage::Watch(watch));
  }

  /// Cancels a watch on a remote process.
  pub fn unwatch(&self, unwatch: RemoteUnwatch) {
    let _ = self.sender.send(WatcherMessage::Unwatch(unwatch));
  }

  /// Notes that the endpoint's connection was established.
  pub fn connected(&self, event: EndpointConnectedEvent) {
    let _ = self.sender.send(WatcherMessage::Connected(event));
  }

  /// Reports one remote process as terminated.
  pub fn terminate(&self, terminate: RemoteTerminate) {
    let _ = self.sender.send(WatcherMessage::Terminate(terminate));
  }

  /// Reports the whole remote address as terminated.
  pub fn address_terminated(&self) {
    let _ = self.sender.send(WatcherMessage::AddressTerminated);
  }

  /// Stops the watcher task after the commands already queued.
  pub fn stop(&self) {
    let _ = self.sender.send(WatcherMessage::Stop);
  }
}
