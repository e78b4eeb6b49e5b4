use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::serializer::{JsonMessage, SerializerError, SerializerManager, SERIALIZER_ID_BINARY, SERIALIZER_ID_JSON};
use crate::system::{downcast_message, DynMessage, Message, MessageBody};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Greet {
  who: String,
}

impl MessageBody for Greet {
  const TYPE_NAME: &'static str = "test.Greet";
}

fn manager() -> SerializerManager {
  let manager = SerializerManager::new();
  manager.register::<Greet>();
  manager
}

#[test]
fn binary_round_trip_restores_registered_type() {
  let manager = manager();
  let message: DynMessage = Arc::new(Greet { who: "world".to_string() });

  let (bytes, serializer_id) = manager.serialize(&message).unwrap();
  assert_eq!(serializer_id, SERIALIZER_ID_BINARY);

  let restored = manager.deserialize(serializer_id, "test.Greet", &bytes).unwrap();
  assert_eq!(downcast_message::<Greet>(&restored).unwrap().who, "world");
}

#[test]
fn json_message_serializes_under_json_codec() {
  let manager = manager();
  let message: DynMessage = Arc::new(JsonMessage::new("acme.Custom", r#"{"value":42}"#));

  let (bytes, serializer_id) = manager.serialize(&message).unwrap();
  assert_eq!(serializer_id, SERIALIZER_ID_JSON);
  assert_eq!(bytes, br#"{"value":42}"#);
}

#[test]
fn unknown_type_name_falls_back_to_json_message() {
  let manager = manager();

  let restored = manager
    .deserialize(SERIALIZER_ID_JSON, "acme.Custom", br#"{"value":42}"#)
    .unwrap();
  let json = downcast_message::<JsonMessage>(&restored).unwrap();
  assert_eq!(json.type_name(), "acme.Custom");
  assert_eq!(json.json(), r#"{"value":42}"#);
}

#[test]
fn known_type_name_under_json_decodes_concrete_type() {
  let manager = manager();

  let restored = manager
    .deserialize(SERIALIZER_ID_JSON, "test.Greet", br#"{"who":"world"}"#)
    .unwrap();
  assert_eq!(downcast_message::<Greet>(&restored).unwrap().who, "world");
}

#[test]
fn binary_codec_rejects_unknown_type_name() {
  let manager = manager();

  let result = manager.deserialize(SERIALIZER_ID_BINARY, "acme.Custom", &[1, 2, 3]);
  assert!(matches!(result, Err(SerializerError::UnknownType(name)) if name == "acme.Custom"));
}

#[test]
fn unknown_serializer_id_is_rejected() {
  let manager = manager();

  let result = manager.deserialize(9, "test.Greet", &[]);
  assert!(matches!(result, Err(SerializerError::UnknownSerializer(9))));
}
