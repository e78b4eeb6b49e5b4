//! Process identifier addressing an actor on a local or remote node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address assigned to process ids that are not reachable over the network.
pub const NONHOST: &str = "nonhost";

/// Identifies a process as `(address, id, request_id)`.
///
/// `request_id` is a correlation token for request/response matching. It is
/// cleared before a pid enters a batch-level lookup table and is carried
/// per-envelope instead, so identical logical pids deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pid {
  address:    String,
  id:         String,
  request_id: u32,
}

impl Pid {
  /// Creates a pid with no request id.
  #[must_use]
  pub fn new(address: impl Into<String>, id: impl Into<String>) -> Self {
    Self { address: address.into(), id: id.into(), request_id: 0 }
  }

  /// Returns the node address of this pid.
  #[must_use]
  pub fn address(&self) -> &str {
    &self.address
  }

  /// Returns the process id local to its node.
  #[must_use]
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Returns the request correlation id, `0` when unset.
  #[must_use]
  pub const fn request_id(&self) -> u32 {
    self.request_id
  }

  /// Returns a copy of this pid carrying the provided request id.
  #[must_use]
  pub fn with_request_id(&self, request_id: u32) -> Self {
    Self { address: self.address.clone(), id: self.id.clone(), request_id }
  }

  /// Returns a copy of this pid with the request id cleared.
  #[must_use]
  pub fn without_request_id(&self) -> Self {
    self.with_request_id(0)
  }

  /// Returns the `address/id` key used for batch lookup deduplication.
  #[must_use]
  pub fn lookup_key(&self) -> String {
    format!("{}/{}", self.address, self.id)
  }
}

impl fmt::Display for Pid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.address, self.id)
  }
}
