//! Pluggable payload serialization.

mod binary_serializer;
mod json_message;
mod json_serializer;
mod serializer_error;
mod serializer_manager;

#[cfg(test)]
mod tests;

pub use binary_serializer::BinarySerializer;
pub use json_message::JsonMessage;
pub use json_serializer::JsonSerializer;
pub use serializer_error::SerializerError;
pub use serializer_manager::{SerializerManager, SERIALIZER_ID_BINARY, SERIALIZER_ID_JSON};

use crate::system::DynMessage;

/// A codec turning messages into wire bytes and back.
pub trait Serializer: Send + Sync + 'static {
  /// The id carried in message envelopes for payloads this codec produced.
  fn serializer_id(&self) -> u32;

  /// Serializes a message payload.
  fn serialize(&self, message: &DynMessage) -> Result<Vec<u8>, SerializerError>;

  /// Deserializes payload bytes carrying the given canonical type name.
  fn deserialize(&self, type_name: &str, bytes: &[u8]) -> Result<DynMessage, SerializerError>;
}

pub(crate) type DecodeFn = fn(&[u8]) -> Result<DynMessage, SerializerError>;

/// Per-type decoders, one per codec.
#[derive(Clone, Copy)]
pub(crate) struct TypeCodec {
  pub(crate) binary: DecodeFn,
  pub(crate) json:   DecodeFn,
}
