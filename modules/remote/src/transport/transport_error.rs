//! Transport error taxonomy.

use thiserror::Error;

/// Error raised by a transport binding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
  /// Establishing a connection failed.
  #[error("connect to {address} failed: {reason}")]
  Connect {
    /// The address dialed.
    address: String,
    /// The underlying failure.
    reason:  String,
  },
  /// Binding the listener failed.
  #[error("bind to {address} failed: {reason}")]
  Bind {
    /// The address bound.
    address: String,
    /// The underlying failure.
    reason:  String,
  },
  /// The connection was closed by the peer.
  #[error("connection closed")]
  Closed,
  /// An i/o failure mid-stream.
  #[error("i/o failure: {0}")]
  Io(String),
  /// A frame exceeded the length limit.
  #[error("frame too large: {0} bytes")]
  FrameTooLarge(usize),
  /// Encoding or decoding a frame failed.
  #[error("frame codec failure: {0}")]
  Codec(String),
  /// The configuration selected a binding this build does not provide.
  #[error("unsupported transport binding: {0}")]
  Unsupported(String),
}
