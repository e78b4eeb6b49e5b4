//! Process construction recipe and spawn errors.

use std::sync::Arc;

use thiserror::Error;

use crate::system::actor_system::ActorSystem;
use crate::system::process::Process;

/// Error raised when spawning a process fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpawnError {
  /// A process is already registered under the requested name.
  #[error("process name already exists: {0}")]
  NameExists(String),
  /// The producer failed to build the process.
  #[error("spawn failed: {0}")]
  Failed(String),
}

/// A recipe producing process instances on demand.
#[derive(Clone)]
pub struct Props {
  producer: Arc<dyn Fn(&ActorSystem) -> Arc<dyn Process> + Send + Sync>,
}

impl Props {
  /// Creates props from a producer closure.
  #[must_use]
  pub fn from_producer<F>(producer: F) -> Self
  where
    F: Fn(&ActorSystem) -> Arc<dyn Process> + Send + Sync + 'static, {
    Self { producer: Arc::new(producer) }
  }

  pub(crate) fn produce(&self, system: &ActorSystem) -> Arc<dyn Process> {
    (self.producer)(system)
  }
}
