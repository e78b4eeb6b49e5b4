//! Remoting configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::system::Props;

const DEFAULT_BATCH_SIZE: usize = 1000;
const DEFAULT_QUEUE_SIZE: usize = 1_000_000;
const DEFAULT_MAX_RETRY_COUNT: u32 = 5;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for a remoting node.
///
/// Built with `with_*` methods; unspecified options keep their defaults.
#[derive(Clone)]
pub struct RemoteConfig {
  host:                        String,
  port:                        u16,
  advertised_host:             Option<String>,
  ssl:                         bool,
  use_web_socket:              bool,
  endpoint_writer_batch_size:  usize,
  endpoint_writer_queue_size:  usize,
  endpoint_manager_batch_size: usize,
  endpoint_manager_queue_size: usize,
  max_retry_count:             u32,
  retry_interval:              Duration,
  kinds:                       HashMap<String, Props>,
}

impl RemoteConfig {
  /// Creates a configuration listening on `host:port`.
  #[must_use]
  pub fn new(host: impl Into<String>, port: u16) -> Self {
    Self {
      host: host.into(),
      port,
      advertised_host: None,
      ssl: false,
      use_web_socket: false,
      endpoint_writer_batch_size: DEFAULT_BATCH_SIZE,
      endpoint_writer_queue_size: DEFAULT_QUEUE_SIZE,
      endpoint_manager_batch_size: DEFAULT_BATCH_SIZE,
      endpoint_manager_queue_size: DEFAULT_QUEUE_SIZE,
      max_retry_count: DEFAULT_MAX_RETRY_COUNT,
      retry_interval: DEFAULT_RETRY_INTERVAL,
      kinds: HashMap::new(),
    }
  }

  /// Returns the bind host.
  #[must_use]
  pub fn host(&self) -> &str {
    &self.host
  }

  /// Returns the bind port.
  #[must_use]
  pub const fn port(&self) -> u16 {
    self.port
  }

  /// Returns the `host:port` bind address.
  #[must_use]
  pub fn address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }

  /// Returns the address advertised to peers, falling back to the bind
  /// address when no advertised host is set.
  #[must_use]
  pub fn advertised_address(&self) -> String {
    match &self.advertised_host {
      | Some(host) => format!("{}:{}", host, self.port),
      | None => self.address(),
    }
  }

  /// Sets the host advertised to peers.
  #[must_use]
  pub fn with_advertised_host(mut self, host: impl Into<String>) -> Self {
    self.advertised_host = Some(host.into());
    self
  }

  /// Returns whether channel encryption is requested.
  #[must_use]
  pub const fn ssl(&self) -> bool {
    self.ssl
  }

  /// Requests channel encryption from the transport binding.
  #[must_use]
  pub const fn with_ssl(mut self, ssl: bool) -> Self {
    self.ssl = ssl;
    self
  }

  /// Returns whether a websocket transport binding is requested.
  #[must_use]
  pub const fn use_web_socket(&self) -> bool {
    self.use_web_socket
  }

  /// Requests a websocket transport binding.
  #[must_use]
  pub const fn with_use_web_socket(mut self, use_web_socket: bool) -> Self {
    self.use_web_socket = use_web_socket;
    self
  }

  /// Returns the max deliveries per outbound batch.
  #[must_use]
  pub const fn endpoint_writer_batch_size(&self) -> usize {
    self.endpoint_writer_batch_size
  }

  /// Sets the max deliveries per outbound batch.
  #[must_use]
  pub const fn with_endpoint_writer_batch_size(mut self, size: usize) -> Self {
    self.endpoint_writer_batch_size = size;
    self
  }

  /// Returns the writer mailbox user-queue capacity.
  #[must_use]
  pub const fn endpoint_writer_queue_size(&self) -> usize {
    self.endpoint_writer_queue_size
  }

  /// Sets the writer mailbox user-queue capacity.
  #[must_use]
  pub const fn with_endpoint_writer_queue_size(mut self, size: usize) -> Self {
    self.endpoint_writer_queue_size = size;
    self
  }

  /// Returns the manager-side batch size.
  #[must_use]
  pub const fn endpoint_manager_batch_size(&self) -> usize {
    self.endpoint_manager_batch_size
  }

  /// Sets the manager-side batch size.
  #[must_use]
  pub const fn with_endpoint_manager_batch_size(mut self, size: usize) -> Self {
    self.endpoint_manager_batch_size = size;
    self
  }

  /// Returns the manager-side queue capacity.
  #[must_use]
  pub const fn endpoint_manager_queue_size(&self) -> usize {
    self.endpoint_manager_queue_size
  }

  /// Sets the manager-side queue capacity.
  #[must_use]
  pub const fn with_endpoint_manager_queue_size(mut self, size: usize) -> Self {
    self.endpoint_manager_queue_size = size;
    self
  }

  /// Returns the max connection attempts before an endpoint is declared dead.
  #[must_use]
  pub const fn max_retry_count(&self) -> u32 {
    self.max_retry_count
  }

  /// Sets the max connection attempts before an endpoint is declared dead.
  #[must_use]
  pub const fn with_max_retry_count(mut self, count: u32) -> Self {
    self.max_retry_count = count;
    self
  }

  /// Returns the pause between connection attempts.
  #[must_use]
  pub const fn retry_interval(&self) -> Duration {
    self.retry_interval
  }

  /// Sets the pause between connection attempts.
  #[must_use]
  pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
    self.retry_interval = interval;
    self
  }

  /// Registers a named kind available for remote activation.
  #[must_use]
  pub fn with_kind(mut self, kind: impl Into<String>, props: Props) -> Self {
    self.kinds.insert(kind.into(), props);
    self
  }

  /// Returns the props registered under `kind`.
  #[must_use]
  pub fn kind(&self, kind: &str) -> Option<&Props> {
    self.kinds.get(kind)
  }

  /// Returns the registered kind names.
  #[must_use]
  pub fn kind_names(&self) -> Vec<String> {
    self.kinds.keys().cloned().collect()
  }
}
