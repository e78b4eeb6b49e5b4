//! Minimal process contract every deliverable target satisfies.

use crate::system::envelope::Envelope;
use crate::system::pid::Pid;
use crate::system::system_message::{Stop, SystemMessage};

/// A message sink registered in the process registry.
///
/// Delivery is synchronous enqueue: implementations must not block and must
/// tolerate delivery after the process has stopped (such messages become dead
/// letters downstream).
pub trait Process: Send + Sync + 'static {
  /// Delivers a user envelope addressed to `target`.
  fn send_user_message(&self, target: &Pid, envelope: Envelope);

  /// Delivers a system message addressed to `target`.
  fn send_system_message(&self, target: &Pid, message: SystemMessage);

  /// Requests the process to stop.
  fn stop(&self, target: &Pid) {
    self.send_system_message(target, SystemMessage::Stop(Stop));
  }
}
