//! Status codes carried by remote-spawn responses.

use serde::{Deserialize, Serialize};

/// Outcome of a remote activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ResponseStatusCode {
  /// The request succeeded.
  Ok                      = 0,
  /// The remote node is unreachable.
  Unavailable             = 1,
  /// The request timed out.
  Timeout                 = 2,
  /// A process with the requested name already exists on the remote node.
  ProcessNameAlreadyExist = 3,
  /// The remote node failed to satisfy the request.
  Error                   = 4,
  /// The request was dead-lettered on the remote node.
  DeadLetter              = 5,
}

impl ResponseStatusCode {
  /// Returns the numeric wire value.
  #[must_use]
  pub const fn as_u32(self) -> u32 {
    self as u32
  }
}
