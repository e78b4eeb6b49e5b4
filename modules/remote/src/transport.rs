//! Wire transport seam and its bindings.

mod loopback_transport;
mod remote_transport;
mod tcp_transport;
mod transport_error;

pub use loopback_transport::{LoopbackNetwork, LoopbackTransport};
pub use remote_transport::{Connection, FrameSink, FrameStream, RemoteTransport, TransportListener};
pub use tcp_transport::TcpTransport;
pub use transport_error::TransportError;

use std::sync::Arc;

use crate::config::RemoteConfig;

/// Builds the transport binding selected by the configuration.
///
/// Only the plain TCP binding ships; the `ssl` and `use_web_socket` flags
/// select alternative bindings a deployment must provide itself.
pub fn default_transport(config: &RemoteConfig) -> Result<Arc<dyn RemoteTransport>, TransportError> {
  if config.ssl() {
    return Err(TransportError::Unsupported("ssl".to_string()));
  }
  if config.use_web_socket() {
    return Err(TransportError::Unsupported("websocket".to_string()));
  }
  Ok(Arc::new(TcpTransport::new()))
}
