//! Facade over the process registry and event stream.

use std::sync::Arc;

use uuid::Uuid;

use crate::messages::DeadLetterEvent;
use crate::system::actor_future::{ActorFuture, FutureProcess};
use crate::system::envelope::Envelope;
use crate::system::event_stream::{EventStream, SystemEvent};
use crate::system::message::DynMessage;
use crate::system::pid::Pid;
use crate::system::process_registry::ProcessRegistry;
use crate::system::props::{Props, SpawnError};
use crate::system::system_message::SystemMessage;

/// The local runtime surface the remoting layer collaborates with.
///
/// Cloning shares the underlying system.
#[derive(Clone)]
pub struct ActorSystem {
  inner: Arc<ActorSystemInner>,
}

struct ActorSystemInner {
  id:           String,
  registry:     ProcessRegistry,
  event_stream: EventStream,
}

impl ActorSystem {
  /// Creates a system with a fresh random id.
  #[must_use]
  pub fn new() -> Self {
    Self {
      inner: Arc::new(ActorSystemInner {
        id:           Uuid::new_v4().to_string(),
        registry:     ProcessRegistry::new(),
        event_stream: EventStream::new(),
      }),
    }
  }

  /// Returns the system's unique id.
  #[must_use]
  pub fn id(&self) -> &str {
    &self.inner.id
  }

  /// Returns the node's advertised address.
  #[must_use]
  pub fn address(&self) -> String {
    self.inner.registry.address()
  }

  /// Returns the process registry.
  #[must_use]
  pub fn process_registry(&self) -> &ProcessRegistry {
    &self.inner.registry
  }

  /// Returns the event stream.
  #[must_use]
  pub fn event_stream(&self) -> &EventStream {
    &self.inner.event_stream
  }

  /// Returns a pid on this node for a registered process id.
  #[must_use]
  pub fn local_pid(&self, id: impl Into<String>) -> Pid {
    Pid::new(self.address(), id)
  }

  /// Spawns a process under an explicit name.
  pub fn spawn_named(&self, props: &Props, name: &str) -> Result<Pid, SpawnError> {
    let process = props.produce(self);
    if !self.inner.registry.add(name, process) {
      return Err(SpawnError::NameExists(name.to_string()));
    }
    Ok(self.local_pid(name))
  }

  /// Spawns a process under a generated name.
  pub fn spawn(&self, props: &Props) -> Result<Pid, SpawnError> {
    let name = self.inner.registry.next_id();
    self.spawn_named(props, &name)
  }

  /// Delivers a user envelope, dead-lettering when the target is unknown.
  pub fn send(&self, target: &Pid, envelope: Envelope) {
    match self.inner.registry.get(target) {
      | Some(process) => process.send_user_message(target, envelope),
      | None => {
        let (_, message, sender) = envelope.into_parts();
        self.inner.event_stream.publish(&SystemEvent::DeadLetter(DeadLetterEvent {
          target: target.clone(),
          message,
          sender,
        }));
      },
    }
  }

  /// Delivers a system message, dropping it when the target is unknown.
  pub fn send_system(&self, target: &Pid, message: SystemMessage) {
    if let Some(process) = self.inner.registry.get(target) {
      process.send_system_message(target, message);
    }
  }

  /// Sends `message` to `target` and returns a future capturing the reply.
  #[must_use]
  pub fn request_future(&self, target: &Pid, message: DynMessage) -> ActorFuture {
    let (process, receiver) = FutureProcess::new();
    let name = format!("$future{}", self.inner.registry.next_id());
    // next_id never repeats, the add cannot collide
    let _ = self.inner.registry.add(name.clone(), process);
    let future_pid = self.local_pid(name);
    self.send(target, Envelope::new(message).with_sender(future_pid.clone()));
    ActorFuture::new(future_pid, receiver, self.inner.registry.clone())
  }
}

impl Default for ActorSystem {
  fn default() -> Self {
    Self::new()
  }
}
