//! Process handle standing in for an actor hosted on another node.

use std::sync::Arc;

use crate::endpoint::EndpointManager;
use crate::messages::{RemoteDeliver, RemoteUnwatch, RemoteWatch};
use crate::system::{Envelope, Pid, Process, Stop, SystemMessage};

/// The address resolver's product: forwards everything sent to a remote pid
/// into the endpoint manager.
pub struct RemoteProcess {
  manager: EndpointManager,
}

impl RemoteProcess {
  /// Creates a handle forwarding into `manager`.
  #[must_use]
  pub fn new(manager: EndpointManager) -> Self {
    Self { manager }
  }
}

impl Process for RemoteProcess {
  fn send_user_message(&self, target: &Pid, envelope: Envelope) {
    let (header, message, sender) = envelope.into_parts();
    self.manager.deliver(RemoteDeliver { header, message, target: target.clone(), sender });
  }

  fn send_system_message(&self, target: &Pid, message: SystemMessage) {
    match message {
      | SystemMessage::Watch(watch) => {
        self.manager.remote_watch(RemoteWatch { watcher: watch.watcher, watchee: target.clone() });
      },
      | SystemMessage::Unwatch(unwatch) => {
        self.manager.remote_unwatch(RemoteUnwatch { watcher: unwatch.watcher, watchee: target.clone() });
      },
      | SystemMessage::Stop(_) => {
        self.manager.deliver(RemoteDeliver {
          header:  None,
          message: Arc::new(Stop),
          target:  target.clone(),
          sender:  None,
        });
      },
      | SystemMessage::Terminated(_) => {
        tracing::debug!(target = %target, "dropping terminated notification addressed to remote pid");
      },
    }
  }
}
