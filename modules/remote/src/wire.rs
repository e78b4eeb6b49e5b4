//! Frames exchanged between remoting nodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::system::Pid;

/// Handshake payload identifying a connecting member node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConnection {
  /// Unique id of the connecting actor system.
  pub system_id: String,
  /// Advertised address of the connecting node.
  pub address:   String,
}

/// First frame sent on a fresh connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectRequest {
  /// A member node connecting with its identity.
  ServerConnection(ServerConnection),
  /// A non-member client connecting anonymously.
  ClientConnection,
}

/// Reply to a [`ConnectRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
  /// System id of the accepting node.
  pub member_id: String,
  /// Whether the connecting node is blocked and must disconnect.
  pub blocked:   bool,
}

/// One serialized message within a batch.
///
/// `target` indexes the batch's target table directly. `sender` is offset by
/// one: `0` means no sender, `n` means index `n - 1` into the sender table.
/// Request ids are carried here so the tables deduplicate on logical pids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
  /// Index into the batch type-name table.
  pub type_id:           u32,
  /// Serialized payload bytes.
  pub message_data:      Vec<u8>,
  /// Index into the batch target table.
  pub target:            u32,
  /// Offset-by-one index into the batch sender table; `0` = no sender.
  pub sender:            u32,
  /// Serializer that produced `message_data`.
  pub serializer_id:     u32,
  /// Request id stamped back onto the target pid.
  pub target_request_id: u32,
  /// Request id stamped back onto the sender pid.
  pub sender_request_id: u32,
  /// Optional header metadata.
  pub message_header:    Option<HashMap<String, String>>,
}

/// A compressed batch of deliveries sharing lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBatch {
  /// Deduplicated message type names.
  pub type_names: Vec<String>,
  /// Deduplicated target pids, request ids cleared.
  pub targets:    Vec<Pid>,
  /// Deduplicated sender pids, request ids cleared.
  pub senders:    Vec<Pid>,
  /// The batched envelopes.
  pub envelopes:  Vec<MessageEnvelope>,
}

/// Top-level frame on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteFrame {
  /// Connection handshake.
  ConnectRequest(ConnectRequest),
  /// Handshake reply.
  ConnectResponse(ConnectResponse),
  /// Batched message deliveries.
  MessageBatch(MessageBatch),
  /// Graceful disconnect notice.
  DisconnectRequest,
}
