//! Serialization error taxonomy.

use thiserror::Error;

/// Error raised while encoding or decoding a payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializerError {
  /// Encoding the payload failed.
  #[error("encode failed: {0}")]
  Encode(String),
  /// Decoding the payload failed.
  #[error("decode failed: {0}")]
  Decode(String),
  /// No serializer is registered under the envelope's id.
  #[error("unknown serializer id: {0}")]
  UnknownSerializer(u32),
  /// No decoder is registered for the carried type name.
  #[error("unknown message type: {0}")]
  UnknownType(String),
}
