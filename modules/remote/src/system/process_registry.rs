//! Name-to-process registry with a pluggable remote address resolver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::concurrent_map::ConcurrentMap;
use crate::system::pid::{Pid, NONHOST};
use crate::system::process::Process;

/// Resolves pids whose address is not this node to a process handle.
pub type AddressResolver = Arc<dyn Fn(&Pid) -> Option<Arc<dyn Process>> + Send + Sync>;

/// Registry of local processes keyed by id, plus the node's advertised address.
///
/// Cloning shares the underlying registry.
#[derive(Clone)]
pub struct ProcessRegistry {
  inner: Arc<RegistryInner>,
}

struct RegistryInner {
  address:  RwLock<String>,
  local:    ConcurrentMap<String, Arc<dyn Process>>,
  sequence: AtomicU64,
  resolver: RwLock<Option<AddressResolver>>,
}

impl ProcessRegistry {
  /// Creates an empty registry advertising the non-host address.
  #[must_use]
  pub fn new() -> Self {
    Self {
      inner: Arc::new(RegistryInner {
        address:  RwLock::new(NONHOST.to_string()),
        local:    ConcurrentMap::new(),
        sequence: AtomicU64::new(0),
        resolver: RwLock::new(None),
      }),
    }
  }

  /// Returns the node's advertised address.
  #[must_use]
  pub fn address(&self) -> String {
    self.inner.address.read().clone()
  }

  /// Sets the node's advertised address.
  pub fn set_address(&self, address: impl Into<String>) {
    *self.inner.address.write() = address.into();
  }

  /// Installs the resolver consulted for non-local pids.
  pub fn register_address_resolver(&self, resolver: AddressResolver) {
    *self.inner.resolver.write() = Some(resolver);
  }

  /// Returns a fresh generated process id.
  #[must_use]
  pub fn next_id(&self) -> String {
    let seq = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
    format!("${}", seq + 1)
  }

  /// Registers a process under `id`. Returns `false` when the id is taken.
  #[must_use]
  pub fn add(&self, id: impl Into<String>, process: Arc<dyn Process>) -> bool {
    let (_, loaded) = self.inner.local.get_or_set(id.into(), process);
    !loaded
  }

  /// Removes the process registered under `id`.
  pub fn remove(&self, id: &str) {
    self.inner.local.delete(id);
  }

  /// Looks up a process registered locally under `id`.
  #[must_use]
  pub fn get_local(&self, id: &str) -> Option<Arc<dyn Process>> {
    self.inner.local.get(id)
  }

  /// Resolves `pid` to a process handle, consulting the address resolver for
  /// pids hosted elsewhere.
  #[must_use]
  pub fn get(&self, pid: &Pid) -> Option<Arc<dyn Process>> {
    let local = {
      let address = self.inner.address.read();
      pid.address() == NONHOST || pid.address() == address.as_str()
    };
    if local {
      self.get_local(pid.id())
    } else {
      let resolver = self.inner.resolver.read();
      resolver.as_ref().and_then(|resolve| resolve(pid))
    }
  }
}

impl Default for ProcessRegistry {
  fn default() -> Self {
    Self::new()
  }
}
