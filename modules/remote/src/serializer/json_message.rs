//! Self-describing JSON payload.

use std::any::Any;

use serde::ser::{Serialize, Serializer as SerdeSerializer};

use crate::system::Message;

/// A message whose payload is raw JSON text plus its carried type name.
///
/// Used to send types the local registry does not know, and produced when
/// decoding an unknown type name under the JSON codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonMessage {
  type_name: String,
  json:      String,
}

impl JsonMessage {
  /// Wraps raw JSON text under a carried type name.
  #[must_use]
  pub fn new(type_name: impl Into<String>, json: impl Into<String>) -> Self {
    Self { type_name: type_name.into(), json: json.into() }
  }

  /// Returns the raw JSON text.
  #[must_use]
  pub fn json(&self) -> &str {
    &self.json
  }
}

impl Serialize for JsonMessage {
  fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.json)
  }
}

impl Message for JsonMessage {
  fn type_name(&self) -> &str {
    &self.type_name
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_serialize(&self) -> &dyn erased_serde::Serialize {
    self
  }
}
