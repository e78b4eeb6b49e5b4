//! Lazy-connect registry entry.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use crate::endpoint::endpoint_handle::Endpoint;
use crate::endpoint::endpoint_supervisor::EndpointSupervisor;

const ACTIVE: u8 = 0;
const UNLOADING: u8 = 1;
const UNLOADED: u8 = 2;

/// Registry slot spawning its endpoint at most once.
///
/// Concurrent callers race on `get_or_spawn`; exactly one spawns, the rest
/// observe the same endpoint. Unloading is likewise claimed exactly once.
pub struct EndpointLazy {
  address:  String,
  endpoint: OnceLock<Endpoint>,
  unloaded: AtomicU8,
}

impl EndpointLazy {
  pub(crate) fn new(address: impl Into<String>) -> Self {
    Self { address: address.into(), endpoint: OnceLock::new(), unloaded: AtomicU8::new(ACTIVE) }
  }

  /// Returns the remote address of this slot.
  #[must_use]
  pub fn address(&self) -> &str {
    &self.address
  }

  pub(crate) fn get_or_spawn(&self, supervisor: &EndpointSupervisor) -> &Endpoint {
    self.endpoint.get_or_init(|| supervisor.spawn_endpoint(&self.address))
  }

  pub(crate) fn endpoint(&self) -> Option<&Endpoint> {
    self.endpoint.get()
  }

  /// Claims the unload. Only the first caller gets `true`.
  pub(crate) fn begin_unload(&self) -> bool {
    self
      .unloaded
      .compare_exchange(ACTIVE, UNLOADING, Ordering::SeqCst, Ordering::SeqCst)
      .is_ok()
  }

  pub(crate) fn finish_unload(&self) {
    self.unloaded.store(UNLOADED, Ordering::SeqCst);
  }

  /// Returns whether the slot still accepts traffic.
  #[must_use]
  pub fn is_active(&self) -> bool {
    self.unloaded.load(Ordering::SeqCst) == ACTIVE
  }
}
