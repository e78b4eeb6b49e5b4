//! Control messages and events flowing through the remoting layer.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::system::{DynMessage, Message, MessageBody, Pid};

/// An outbound delivery handed to an endpoint writer.
#[derive(Clone)]
pub struct RemoteDeliver {
  /// Optional header metadata forwarded with the message.
  pub header:  Option<HashMap<String, String>>,
  /// The payload to serialize.
  pub message: DynMessage,
  /// The remote target process.
  pub target:  Pid,
  /// The local sender, when a reply is expected.
  pub sender:  Option<Pid>,
}

impl fmt::Debug for RemoteDeliver {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RemoteDeliver")
      .field("type_name", &self.message.type_name())
      .field("target", &self.target)
      .field("sender", &self.sender)
      .finish()
  }
}

/// Registers `watcher` as watching the remote `watchee`.
#[derive(Debug, Clone)]
pub struct RemoteWatch {
  /// The local watching process.
  pub watcher: Pid,
  /// The remote watched process.
  pub watchee: Pid,
}

/// Cancels a remote watch registration.
#[derive(Debug, Clone)]
pub struct RemoteUnwatch {
  /// The local watching process.
  pub watcher: Pid,
  /// The remote watched process.
  pub watchee: Pid,
}

/// Reports that a watched remote process terminated.
#[derive(Debug, Clone)]
pub struct RemoteTerminate {
  /// The local watching process.
  pub watcher: Pid,
  /// The remote process that terminated.
  pub watchee: Pid,
}

/// Published when an endpoint establishes its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConnectedEvent {
  /// The remote address that connected.
  pub address: String,
}

/// Published when an endpoint terminates and must be unloaded.
///
/// Also usable as a mailbox payload: a writer that drains one stops after
/// flushing the deliveries queued ahead of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointTerminatedEvent {
  /// The remote address that terminated.
  pub address: String,
}

impl MessageBody for EndpointTerminatedEvent {
  const TYPE_NAME: &'static str = "orbit.EndpointTerminatedEvent";
}

/// Published when a message cannot reach its target.
#[derive(Clone)]
pub struct DeadLetterEvent {
  /// The unreachable target.
  pub target:  Pid,
  /// The undeliverable payload.
  pub message: DynMessage,
  /// The original sender, when known.
  pub sender:  Option<Pid>,
}

impl fmt::Debug for DeadLetterEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeadLetterEvent")
      .field("target", &self.target)
      .field("type_name", &self.message.type_name())
      .field("sender", &self.sender)
      .finish()
  }
}

/// Liveness probe sent to a remote activator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ping;

impl MessageBody for Ping {
  const TYPE_NAME: &'static str = "orbit.Ping";
}

/// Reply to [`Ping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pong;

impl MessageBody for Pong {
  const TYPE_NAME: &'static str = "orbit.Pong";
}

/// Asks a remote activator to spawn a registered kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPidRequest {
  /// The registered kind to spawn.
  pub kind: String,
  /// The requested process name; empty means generate one.
  pub name: String,
}

impl MessageBody for ActorPidRequest {
  const TYPE_NAME: &'static str = "orbit.ActorPidRequest";
}

/// Reply to [`ActorPidRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPidResponse {
  /// The spawned process, present on success.
  pub pid:         Option<Pid>,
  /// A [`crate::ResponseStatusCode`] wire value.
  pub status_code: u32,
}

impl MessageBody for ActorPidResponse {
  const TYPE_NAME: &'static str = "orbit.ActorPidResponse";
}
