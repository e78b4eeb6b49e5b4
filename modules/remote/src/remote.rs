//! Process-wide remoting facade.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::activator::{Activator, ACTIVATOR_NAME};
use crate::block_list::BlockList;
use crate::config::RemoteConfig;
use crate::endpoint::{Dispatcher, EndpointManager, EndpointReader, EndpointSupervisor};
use crate::messages::{ActorPidRequest, ActorPidResponse, Ping, RemoteDeliver};
use crate::remote_process::RemoteProcess;
use crate::serializer::SerializerManager;
use crate::system::{downcast_message, ActorSystem, DynMessage, FutureError, Pid, Process};
use crate::transport::{default_transport, RemoteTransport, TransportError};

const ACTIVATOR_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Error raised by the remoting facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
  /// The transport binding failed.
  #[error(transparent)]
  Transport(#[from] TransportError),
  /// A remote request timed out or was dead-lettered.
  #[error(transparent)]
  Future(#[from] FutureError),
  /// The reply to an activation request had an unexpected type.
  #[error("unexpected activation response")]
  InvalidResponse,
  /// The facade was started twice.
  #[error("remoting already started")]
  AlreadyStarted,
  /// The local activator did not answer its startup probe.
  #[error("activator unavailable")]
  ActivatorUnavailable,
}

/// Binds the remoting layer to an actor system.
///
/// `start` installs the address resolver, registers the activator, starts
/// the endpoint manager and the listener. Cloning shares the facade.
#[derive(Clone)]
pub struct Remote {
  inner: Arc<RemoteInner>,
}

struct RemoteInner {
  system:             ActorSystem,
  config:             RemoteConfig,
  block_list:         BlockList,
  serializer_manager: SerializerManager,
  manager:            EndpointManager,
  reader:             EndpointReader,
  transport:          Arc<dyn RemoteTransport>,
  listener_task:      Mutex<Option<JoinHandle<()>>>,
  started:            AtomicBool,
}

impl Remote {
  /// Creates a facade with the transport binding the configuration selects.
  pub fn new(system: ActorSystem, config: RemoteConfig) -> Result<Self, RemoteError> {
    let transport = default_transport(&config)?;
    Ok(Self::with_transport(system, config, transport))
  }

  /// Creates a facade over an explicit transport binding.
  #[must_use]
  pub fn with_transport(system: ActorSystem, config: RemoteConfig, transport: Arc<dyn RemoteTransport>) -> Self {
    let block_list = BlockList::new();
    let serializer_manager = SerializerManager::new();
    let manager = EndpointManager::new(system.clone());
    let reader = EndpointReader::new(system.clone(), manager.clone(), serializer_manager.clone(), block_list.clone());
    Self {
      inner: Arc::new(RemoteInner {
        system,
        config,
        block_list,
        serializer_manager,
        manager,
        reader,
        transport,
        listener_task: Mutex::new(None),
        started: AtomicBool::new(false),
      }),
    }
  }

  /// Returns the bound actor system.
  #[must_use]
  pub fn system(&self) -> &ActorSystem {
    &self.inner.system
  }

  /// Returns the configuration.
  #[must_use]
  pub fn config(&self) -> &RemoteConfig {
    &self.inner.config
  }

  /// Returns the block list.
  #[must_use]
  pub fn block_list(&self) -> &BlockList {
    &self.inner.block_list
  }

  /// Returns the serializer manager for custom type registration.
  #[must_use]
  pub fn serializer_manager(&self) -> &SerializerManager {
    &self.inner.serializer_manager
  }

  /// Returns the endpoint manager.
  #[must_use]
  pub fn endpoint_manager(&self) -> &EndpointManager {
    &self.inner.manager
  }

  /// Starts remoting: listener, address resolver, activator and manager.
  pub async fn start(&self) -> Result<(), RemoteError> {
    if self.inner.started.swap(true, Ordering::SeqCst) {
      return Err(RemoteError::AlreadyStarted);
    }
    let mut listener = self.inner.transport.bind(&self.inner.config.address()).await?;

    let registry = self.inner.system.process_registry();
    registry.set_address(self.inner.config.advertised_address());
    let manager = self.inner.manager.clone();
    registry.register_address_resolver(Arc::new(move |_pid| {
      Some(Arc::new(RemoteProcess::new(manager.clone())) as Arc<dyn Process>)
    }));
    let activator = Arc::new(Activator::new(self.inner.system.clone(), self.inner.config.clone()));
    let _ = registry.add(ACTIVATOR_NAME, activator);

    self.inner.manager.start(EndpointSupervisor::new(
      self.inner.system.clone(),
      self.inner.config.clone(),
      self.inner.transport.clone(),
      self.inner.serializer_manager.clone(),
      self.inner.block_list.clone(),
      Dispatcher::new(),
    ));

    let reader = self.inner.reader.clone();
    let accept_loop = tokio::spawn(async move {
      loop {
        match listener.accept().await {
          | Ok(connection) => {
            let reader = reader.clone();
            tokio::spawn(async move {
              reader.handle_connection(connection).await;
            });
          },
          | Err(error) => {
            tracing::debug!(%error, "listener stopped accepting");
            break;
          },
        }
      }
    });
    *self.inner.listener_task.lock() = Some(accept_loop);

    let activator_pid = self.inner.system.local_pid(ACTIVATOR_NAME);
    let probe = self.inner.system.request_future(&activator_pid, Arc::new(Ping));
    probe
      .result(ACTIVATOR_PROBE_TIMEOUT)
      .await
      .map_err(|_| RemoteError::ActivatorUnavailable)?;

    tracing::info!(address = %self.inner.config.advertised_address(), "remoting started");
    Ok(())
  }

  /// Stops remoting. With `graceful`, inbound peers get a disconnect frame
  /// and in-flight batches are skipped rather than racing the teardown.
  pub async fn shutdown(&self, graceful: bool) {
    self.inner.reader.suspend(true);
    self.inner.manager.stop(graceful);
    if let Some(task) = self.inner.listener_task.lock().take() {
      task.abort();
    }
    tracing::info!(graceful, "remoting shut down");
  }

  /// Sends a message to a process on another node.
  pub fn send_message(
    &self,
    target: &Pid,
    message: DynMessage,
    sender: Option<Pid>,
    header: Option<HashMap<String, String>>,
  ) {
    self
      .inner
      .manager
      .deliver(RemoteDeliver { header, message, target: target.clone(), sender });
  }

  /// Spawns a registered kind on `address` under a generated name.
  pub async fn spawn_remote(
    &self,
    address: &str,
    kind: &str,
    timeout: Duration,
  ) -> Result<ActorPidResponse, RemoteError> {
    self.spawn_remote_named(address, "", kind, timeout).await
  }

  /// Spawns a registered kind on `address` under an explicit name.
  pub async fn spawn_remote_named(
    &self,
    address: &str,
    name: &str,
    kind: &str,
    timeout: Duration,
  ) -> Result<ActorPidResponse, RemoteError> {
    let activator = Pid::new(address, ACTIVATOR_NAME);
    let request = ActorPidRequest { kind: kind.to_string(), name: name.to_string() };
    let future = self.inner.system.request_future(&activator, Arc::new(request));
    let reply = future.result(timeout).await?;
    downcast_message::<ActorPidResponse>(&reply)
      .cloned()
      .ok_or(RemoteError::InvalidResponse)
  }
}
