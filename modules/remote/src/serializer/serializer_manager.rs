//! Codec selection and the shared type registry.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::concurrent_map::ConcurrentMap;
use crate::messages::{ActorPidRequest, ActorPidResponse, Ping, Pong};
use crate::serializer::binary_serializer::BinarySerializer;
use crate::serializer::json_message::JsonMessage;
use crate::serializer::json_serializer::JsonSerializer;
use crate::serializer::serializer_error::SerializerError;
use crate::serializer::{Serializer, TypeCodec};
use crate::system::{downcast_message, DynMessage, MessageBody, Stop, Terminated, Unwatch, Watch};

/// Serializer id of the binary codec.
pub const SERIALIZER_ID_BINARY: u32 = 0;
/// Serializer id of the JSON codec.
pub const SERIALIZER_ID_JSON: u32 = 1;

fn decode_binary<T>(bytes: &[u8]) -> Result<DynMessage, SerializerError>
where
  T: MessageBody + DeserializeOwned, {
  let (value, _) = bincode::serde::decode_from_slice::<T, _>(bytes, bincode::config::standard())
    .map_err(|e| SerializerError::Decode(e.to_string()))?;
  Ok(Arc::new(value))
}

fn decode_json<T>(bytes: &[u8]) -> Result<DynMessage, SerializerError>
where
  T: MessageBody + DeserializeOwned, {
  let value = serde_json::from_slice::<T>(bytes).map_err(|e| SerializerError::Decode(e.to_string()))?;
  Ok(Arc::new(value))
}

/// Routes payloads to the codec matching their serializer id.
///
/// Binary is the default outbound codec; [`JsonMessage`] payloads go out as
/// JSON. Deserializing a registered type name yields the concrete type.
/// Cloning shares the registry.
#[derive(Clone)]
pub struct SerializerManager {
  types:  ConcurrentMap<String, TypeCodec>,
  binary: Arc<BinarySerializer>,
  json:   Arc<JsonSerializer>,
}

impl SerializerManager {
  /// Creates a manager with the remoting control types pre-registered.
  #[must_use]
  pub fn new() -> Self {
    let types: ConcurrentMap<String, TypeCodec> = ConcurrentMap::new();
    let manager = Self {
      binary: Arc::new(BinarySerializer::new(types.clone())),
      json:   Arc::new(JsonSerializer::new(types.clone())),
      types,
    };
    manager.register::<Watch>();
    manager.register::<Unwatch>();
    manager.register::<Stop>();
    manager.register::<Terminated>();
    manager.register::<Ping>();
    manager.register::<Pong>();
    manager.register::<ActorPidRequest>();
    manager.register::<ActorPidResponse>();
    manager
  }

  /// Registers a message type for decoding under its canonical type name.
  pub fn register<T>(&self)
  where
    T: MessageBody + DeserializeOwned, {
    self
      .types
      .set(T::TYPE_NAME.to_string(), TypeCodec { binary: decode_binary::<T>, json: decode_json::<T> });
  }

  /// Serializes a payload, returning the bytes and the serializer id used.
  pub fn serialize(&self, message: &DynMessage) -> Result<(Vec<u8>, u32), SerializerError> {
    if downcast_message::<JsonMessage>(message).is_some() {
      Ok((self.json.serialize(message)?, SERIALIZER_ID_JSON))
    } else {
      Ok((self.binary.serialize(message)?, SERIALIZER_ID_BINARY))
    }
  }

  /// Deserializes payload bytes produced by the identified serializer.
  pub fn deserialize(&self, serializer_id: u32, type_name: &str, bytes: &[u8]) -> Result<DynMessage, SerializerError> {
    match serializer_id {
      | SERIALIZER_ID_BINARY => self.binary.deserialize(type_name, bytes),
      | SERIALIZER_ID_JSON => self.json.deserialize(type_name, bytes),
      | other => Err(SerializerError::UnknownSerializer(other)),
    }
  }
}

impl Default for SerializerManager {
  fn default() -> Self {
    Self::new()
  }
}
