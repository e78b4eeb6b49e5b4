//! Transport traits decoupling the remoting layer from the wire.

use async_trait::async_trait;

use crate::transport::transport_error::TransportError;
use crate::wire::RemoteFrame;

/// Outbound half of a connection.
#[async_trait]
pub trait FrameSink: Send {
  /// Sends one frame.
  async fn send(&mut self, frame: RemoteFrame) -> Result<(), TransportError>;

  /// Flushes and closes the outbound half.
  async fn close(&mut self) -> Result<(), TransportError>;
}

/// Inbound half of a connection.
#[async_trait]
pub trait FrameStream: Send {
  /// Receives the next frame. `None` means the peer closed cleanly.
  async fn next(&mut self) -> Option<Result<RemoteFrame, TransportError>>;
}

/// An established bidirectional connection.
pub struct Connection {
  /// Outbound frames.
  pub sink:   Box<dyn FrameSink>,
  /// Inbound frames.
  pub stream: Box<dyn FrameStream>,
  /// The peer address as dialed or observed.
  pub peer:   String,
}

/// A bound listener accepting inbound connections.
#[async_trait]
pub trait TransportListener: Send {
  /// Waits for the next inbound connection.
  async fn accept(&mut self) -> Result<Connection, TransportError>;
}

/// A transport binding able to dial out and accept in.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
  /// Dials `address` and returns the established connection.
  async fn connect(&self, address: &str) -> Result<Connection, TransportError>;

  /// Binds a listener on `address`.
  async fn bind(&self, address: &str) -> Result<Box<dyn TransportListener>, TransportError>;
}
