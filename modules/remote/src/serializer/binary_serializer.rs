//! Compact binary codec backed by bincode.

use crate::concurrent_map::ConcurrentMap;
use crate::serializer::serializer_error::SerializerError;
use crate::serializer::serializer_manager::SERIALIZER_ID_BINARY;
use crate::serializer::{Serializer, TypeCodec};
use crate::system::{DynMessage, Message};

/// The default codec: bincode over the payload's serde view.
///
/// Decoding requires the type name to be registered; unknown names fail.
#[derive(Clone)]
pub struct BinarySerializer {
  types: ConcurrentMap<String, TypeCodec>,
}

impl BinarySerializer {
  pub(crate) fn new(types: ConcurrentMap<String, TypeCodec>) -> Self {
    Self { types }
  }
}

impl Serializer for BinarySerializer {
  fn serializer_id(&self) -> u32 {
    SERIALIZER_ID_BINARY
  }

  fn serialize(&self, message: &DynMessage) -> Result<Vec<u8>, SerializerError> {
    bincode::serde::encode_to_vec(message.as_serialize(), bincode::config::standard())
      .map_err(|e| SerializerError::Encode(e.to_string()))
  }

  fn deserialize(&self, type_name: &str, bytes: &[u8]) -> Result<DynMessage, SerializerError> {
    let codec = self
      .types
      .get(type_name)
      .ok_or_else(|| SerializerError::UnknownType(type_name.to_string()))?;
    (codec.binary)(bytes)
  }
}
