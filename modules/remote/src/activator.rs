//! Remote-spawn request handler.

use std::sync::Arc;

use crate::config::RemoteConfig;
use crate::messages::{ActorPidRequest, ActorPidResponse, Ping, Pong};
use crate::response_status_code::ResponseStatusCode;
use crate::system::{downcast_message, ActorSystem, Envelope, Message, Pid, Process, SpawnError, SystemMessage};


/// Registry name of the activator process.
pub const ACTIVATOR_NAME: &str = "activator";

/// Local process answering activation requests from remote nodes.
///
/// Spawned kinds get a `Remote$` name prefix so locally spawned processes
/// never collide with remotely activated ones.
pub struct Activator {
  system: ActorSystem,
  config: RemoteConfig,
}

impl Activator {
  pub(crate) fn new(system: ActorSystem, config: RemoteConfig) -> Self {
    Self { system, config }
  }

  fn activate(&self, request: &ActorPidRequest) -> ActorPidResponse {
    let Some(props) = self.config.kind(&request.kind) else {
      tracing::warn!(kind = %request.kind, "activation requested for unregistered kind");
      return ActorPidResponse { pid: None, status_code: ResponseStatusCode::Error.as_u32() };
    };
    let name = if request.name.is_empty() {
      self.system.process_registry().next_id()
    } else {
      request.name.clone()
    };
    let full_name = format!("Remote${name}");
    match self.system.spawn_named(props, &full_name) {
      | Ok(pid) => {
        tracing::info!(kind = %request.kind, name = %full_name, "activated remote kind");
        ActorPidResponse { pid: Some(pid), status_code: ResponseStatusCode::Ok.as_u32() }
      },
      | Err(SpawnError::NameExists(_)) => ActorPidResponse {
        pid:         Some(self.system.local_pid(full_name)),
        status_code: ResponseStatusCode::ProcessNameAlreadyExist.as_u32(),
      },
      | Err(error) => {
        tracing::error!(kind = %request.kind, name = %full_name, %error, "activation failed");
        ActorPidResponse { pid: None, status_code: ResponseStatusCode::Error.as_u32() }
      },
    }
  }
}

impl Process for Activator {
  fn send_user_message(&self, _target: &Pid, envelope: Envelope) {
    let (_, message, sender) = envelope.into_parts();
    if downcast_message::<Ping>(&message).is_some() {
      if let Some(sender) = sender {
        self.system.send(&sender, Envelope::new(Arc::new(Pong)));
      }
      return;
    }
    if let Some(request) = downcast_message::<ActorPidRequest>(&message) {
      let response = self.activate(request);
      if let Some(sender) = sender {
        self.system.send(&sender, Envelope::new(Arc::new(response)));
      }
      return;
    }
    tracing::warn!(type_name = message.type_name(), "activator received unexpected message");
  }

  fn send_system_message(&self, _target: &Pid, _message: SystemMessage) {}
}
