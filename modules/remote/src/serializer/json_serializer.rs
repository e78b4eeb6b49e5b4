//! JSON codec with a self-describing fallback.

use std::sync::Arc;

use crate::concurrent_map::ConcurrentMap;
use crate::serializer::json_message::JsonMessage;
use crate::serializer::serializer_error::SerializerError;
use crate::serializer::serializer_manager::SERIALIZER_ID_JSON;
use crate::serializer::{Serializer, TypeCodec};
use crate::system::{downcast_message, DynMessage, Message};

/// JSON codec. Unknown type names decode to [`JsonMessage`] instead of
/// failing, so payloads survive nodes that lack the concrete type.
#[derive(Clone)]
pub struct JsonSerializer {
  types: ConcurrentMap<String, TypeCodec>,
}

impl JsonSerializer {
  pub(crate) fn new(types: ConcurrentMap<String, TypeCodec>) -> Self {
    Self { types }
  }
}

impl Serializer for JsonSerializer {
  fn serializer_id(&self) -> u32 {
    SERIALIZER_ID_JSON
  }

  fn serialize(&self, message: &DynMessage) -> Result<Vec<u8>, SerializerError> {
    if let Some(json) = downcast_message::<JsonMessage>(message) {
      return Ok(json.json().as_bytes().to_vec());
    }
    serde_json::to_vec(message.as_serialize()).map_err(|e| SerializerError::Encode(e.to_string()))
  }

  fn deserialize(&self, type_name: &str, bytes: &[u8]) -> Result<DynMessage, SerializerError> {
    if let Some(codec) = self.types.get(type_name) {
      return (codec.json)(bytes);
    }
    let json = String::from_utf8(bytes.to_vec()).map_err(|e| SerializerError::Decode(e.to_string()))?;
    Ok(Arc::new(JsonMessage::new(type_name, json)))
  }
}
