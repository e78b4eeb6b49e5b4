//! Append-only registry of blocked member system ids.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;


/// Tracks system ids whose connections must be refused.
///
/// The list only grows; unblocking requires a process restart. Cloning shares
/// the underlying set.
#[derive(Clone, Default)]
pub struct BlockList {
  blocked: Arc<RwLock<HashSet<String>>>,
}

impl BlockList {
  /// Creates an empty block list.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds the given system ids to the block list.
  pub fn block(&self, members: impl IntoIterator<Item = String>) {
    let mut guard = self.blocked.write();
    guard.extend(members);
  }

  /// Returns whether `system_id` is blocked.
  #[must_use]
  pub fn is_blocked(&self, system_id: &str) -> bool {
    self.blocked.read().contains(system_id)
  }

  /// Returns a snapshot of the blocked system ids.
  #[must_use]
  pub fn blocked_members(&self) -> HashSet<String> {
    self.blocked.read().clone()
  }

  /// Returns the number of blocked system ids.
  #[must_use]
  pub fn len(&self) -> usize {
    self.blocked.read().len()
  }

  /// Returns whether the block list is empty.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.blocked.read().is_empty()
  }
}
