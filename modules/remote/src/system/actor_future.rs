//! One-shot reply capture for request/response messaging.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::system::envelope::Envelope;
use crate::system::message::DynMessage;
use crate::system::pid::Pid;
use crate::system::process::Process;
use crate::system::process_registry::ProcessRegistry;
use crate::system::system_message::SystemMessage;

/// Error raised while awaiting a future reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FutureError {
  /// No reply arrived within the timeout.
  #[error("future timed out")]
  Timeout,
  /// The reply channel was dropped before a reply arrived.
  #[error("future dead lettered")]
  DeadLetter,
}

/// Registry-backed process capturing the first user message it receives.
pub(crate) struct FutureProcess {
  sender: Mutex<Option<oneshot::Sender<DynMessage>>>,
}

impl FutureProcess {
  pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<DynMessage>) {
    let (tx, rx) = oneshot::channel();
    (Arc::new(Self { sender: Mutex::new(Some(tx)) }), rx)
  }
}

impl Process for FutureProcess {
  fn send_user_message(&self, _target: &Pid, envelope: Envelope) {
    if let Some(tx) = self.sender.lock().take() {
      let (_, message, _) = envelope.into_parts();
      let _ = tx.send(message);
    }
  }

  fn send_system_message(&self, _target: &Pid, _message: SystemMessage) {}
}

/// Handle awaiting a single reply addressed to a temporary pid.
pub struct ActorFuture {
  pid:      Pid,
  receiver: oneshot::Receiver<DynMessage>,
  registry: ProcessRegistry,
}

impl ActorFuture {
  pub(crate) fn new(pid: Pid, receiver: oneshot::Receiver<DynMessage>, registry: ProcessRegistry) -> Self {
    Self { pid, receiver, registry }
  }

  /// Returns the temporary reply pid.
  #[must_use]
  pub fn pid(&self) -> &Pid {
    &self.pid
  }

  /// Awaits the reply, failing after `timeout`.
  ///
  /// The temporary process is unregistered regardless of the outcome.
  pub async fn result(self, timeout: Duration) -> Result<DynMessage, FutureError> {
    let outcome = tokio::time::timeout(timeout, self.receiver).await;
    self.registry.remove(self.pid.id());
    match outcome {
      | Ok(Ok(message)) => Ok(message),
      | Ok(Err(_)) => Err(FutureError::DeadLetter),
      | Err(_) => Err(FutureError::Timeout),
    }
  }
}
