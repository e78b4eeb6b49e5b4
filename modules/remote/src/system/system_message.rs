//! System-channel messages exchanged between processes.

use serde::{Deserialize, Serialize};

use crate::system::message::MessageBody;
use crate::system::pid::Pid;

/// Registers `watcher` for termination notification of the receiving process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watch {
  /// The process to notify when the watched process terminates.
  pub watcher: Pid,
}

impl MessageBody for Watch {
  const TYPE_NAME: &'static str = "orbit.Watch";
}

/// Cancels a previously registered watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unwatch {
  /// The process whose watch registration is removed.
  pub watcher: Pid,
}

impl MessageBody for Unwatch {
  const TYPE_NAME: &'static str = "orbit.Unwatch";
}

/// Requests the receiving process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stop;

impl MessageBody for Stop {
  const TYPE_NAME: &'static str = "orbit.Stop";
}

/// Why a watched process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminatedReason {
  /// The process stopped normally.
  Stopped,
  /// The node hosting the process became unreachable.
  AddressTerminated,
  /// The process was never found on its node.
  NotFound,
}

/// Notifies a watcher that a watched process terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminated {
  /// The process that terminated.
  pub who: Pid,
  /// Why it terminated.
  pub why: TerminatedReason,
}

impl MessageBody for Terminated {
  const TYPE_NAME: &'static str = "orbit.Terminated";
}

/// The system-channel message set.
///
/// System messages outrank user messages in every mailbox that carries both.
#[derive(Debug, Clone)]
pub enum SystemMessage {
  /// Watch registration.
  Watch(Watch),
  /// Watch cancellation.
  Unwatch(Unwatch),
  /// Stop request.
  Stop(Stop),
  /// Termination notification.
  Terminated(Terminated),
}
