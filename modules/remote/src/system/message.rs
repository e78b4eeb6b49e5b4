//! Dynamically typed message payloads exchanged between processes.

use std::any::Any;
use std::sync::Arc;

/// A message that can travel between processes.
///
/// Remote-capable payloads expose an erased serde view plus their canonical
/// wire type name; local inspection goes through [`Any`] downcasting.
pub trait Message: Send + Sync + 'static {
  /// Canonical type name carried in batch lookup tables.
  fn type_name(&self) -> &str;
  /// Borrows the message for downcasting.
  fn as_any(&self) -> &dyn Any;
  /// Borrows the message for erased serialization.
  fn as_serialize(&self) -> &dyn erased_serde::Serialize;
}

/// Marker supplying the canonical type name for a serde-serializable payload.
///
/// Implementing this trait is all a concrete message type needs to become a
/// [`Message`]; the blanket impl wires up downcasting and erased serde.
pub trait MessageBody: serde::Serialize + Send + Sync + 'static {
  /// Canonical wire type name, unique per message type.
  const TYPE_NAME: &'static str;
}

impl<T: MessageBody> Message for T {
  fn type_name(&self) -> &str {
    T::TYPE_NAME
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_serialize(&self) -> &dyn erased_serde::Serialize {
    self
  }
}

/// Shared handle to an erased message payload.
pub type DynMessage = Arc<dyn Message>;

/// Attempts to view the payload as a concrete message type.
#[must_use]
pub fn downcast_message<T: Message>(message: &DynMessage) -> Option<&T> {
  message.as_any().downcast_ref::<T>()
}
