//! Outbound writer owning one connection to a remote address.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::block_list::BlockList;
use crate::endpoint::endpoint_writer_mailbox::{EndpointWriterMailbox, MailboxSystemMessage, MessageInvoker};
use crate::messages::{DeadLetterEvent, EndpointConnectedEvent, EndpointTerminatedEvent, RemoteDeliver};
use crate::serializer::SerializerManager;
use crate::system::{downcast_message, ActorSystem, Message, Pid, SystemEvent};
use crate::transport::{FrameSink, RemoteTransport, TransportError};
use crate::wire::{ConnectRequest, MessageBatch, MessageEnvelope, RemoteFrame, ServerConnection};


/// Error raised by the endpoint writer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointWriterError {
  /// The transport failed while connecting or sending.
  #[error(transparent)]
  Transport(#[from] TransportError),
  /// The remote node refused the connection because this node is blocked.
  #[error("remote refused connection: this node is blocked")]
  Blocked,
  /// The handshake did not complete as expected.
  #[error("handshake failed: {0}")]
  Handshake(String),
  /// A batch was drained before a connection existed.
  #[error("no connection established")]
  NotConnected,
}

pub(crate) struct BatchOutcome {
  pub(crate) batch:       MessageBatch,
  pub(crate) represented: Vec<RemoteDeliver>,
  pub(crate) terminated:  bool,
  pub(crate) remainder:   Vec<RemoteDeliver>,
}

fn intern_pid(table: &mut Vec<Pid>, index: &mut HashMap<String, u32>, pid: &Pid) -> u32 {
  let key = pid.lookup_key();
  if let Some(existing) = index.get(&key) {
    return *existing;
  }
  let id = table.len() as u32;
  table.push(pid.without_request_id());
  index.insert(key, id);
  id
}

/// Compresses deliveries into a batch with deduplicated lookup tables.
///
/// Deliveries that fail to serialize are skipped. An embedded
/// [`EndpointTerminatedEvent`] stops batching; everything already collected
/// is represented, everything after it lands in the remainder.
pub(crate) fn build_message_batch(
  serializer_manager: &SerializerManager,
  deliveries: Vec<RemoteDeliver>,
) -> BatchOutcome {
  let mut batch = MessageBatch::default();
  let mut type_index: HashMap<String, u32> = HashMap::new();
  let mut target_index: HashMap<String, u32> = HashMap::new();
  let mut sender_index: HashMap<String, u32> = HashMap::new();
  let mut represented = Vec::new();
  let mut terminated = false;
  let mut remainder = Vec::new();

  let mut iter = deliveries.into_iter();
  while let Some(deliver) = iter.next() {
    if downcast_message::<EndpointTerminatedEvent>(&deliver.message).is_some() {
      terminated = true;
      remainder = iter.collect();
      break;
    }
    let (bytes, serializer_id) = match serializer_manager.serialize(&deliver.message) {
      | Ok(serialized) => serialized,
      | Err(error) => {
        tracing::warn!(type_name = deliver.message.type_name(), %error, "skipping unserializable message");
        continue;
      },
    };
    let type_name = deliver.message.type_name().to_string();
    let type_id = match type_index.get(&type_name) {
      | Some(existing) => *existing,
      | None => {
        let id = batch.type_names.len() as u32;
        batch.type_names.push(type_name.clone());
        type_index.insert(type_name, id);
        id
      },
    };
    let target = intern_pid(&mut batch.targets, &mut target_index, &deliver.target);
    let sender = match &deliver.sender {
      | Some(pid) => intern_pid(&mut batch.senders, &mut sender_index, pid) + 1,
      | None => 0,
    };
    batch.envelopes.push(MessageEnvelope {
      type_id,
      message_data: bytes,
      target,
      sender,
      serializer_id,
      target_request_id: deliver.target.request_id(),
      sender_request_id: deliver.sender.as_ref().map_or(0, Pid::request_id),
      message_header: deliver.header.clone(),
    });
    represented.push(deliver);
  }

  BatchOutcome { batch, represented, terminated, remainder }
}

/// Serializes deliveries into batches and writes them to one connection.
///
/// Driven exclusively by its mailbox, so invocations never overlap. The
/// connection is established on `Started`, with bounded retries; terminal
/// failure publishes [`EndpointTerminatedEvent`] and leaves queued deliveries
/// for the manager to dead-letter at unload.
pub struct EndpointWriter {
  system:             ActorSystem,
  address:            String,
  advertised_address: String,
  max_retry_count:    u32,
  retry_interval:     Duration,
  transport:          Arc<dyn RemoteTransport>,
  serializer_manager: SerializerManager,
  block_list:         BlockList,
  mailbox:            EndpointWriterMailbox,
  sink:               Mutex<Option<Box<dyn FrameSink>>>,
  stopping:           AtomicBool,
}

impl EndpointWriter {
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn new(
    system: ActorSystem,
    address: String,
    advertised_address: String,
    max_retry_count: u32,
    retry_interval: Duration,
    transport: Arc<dyn RemoteTransport>,
    serializer_manager: SerializerManager,
    block_list: BlockList,
    mailbox: EndpointWriterMailbox,
  ) -> Self {
    Self {
      system,
      address,
      advertised_address,
      max_retry_count,
      retry_interval,
      transport,
      serializer_manager,
      block_list,
      mailbox,
      sink: Mutex::new(None),
      stopping: AtomicBool::new(false),
    }
  }

  /// Returns the remote address this writer serves.
  #[must_use]
  pub fn address(&self) -> &str {
    &self.address
  }

  async fn connect(&self) -> Result<(), EndpointWriterError> {
    let mut last = EndpointWriterError::Transport(TransportError::Closed);
    let attempts = self.max_retry_count.max(1);
    for attempt in 0..attempts {
      if attempt > 0 {
        tokio::time::sleep(self.retry_interval).await;
      }
      match self.transport.connect(&self.address).await {
        | Ok(connection) => match self.handshake(connection).await {
          | Ok(()) => return Ok(()),
          // an explicit refusal never resolves on its own, retrying would spam the peer
          | Err(EndpointWriterError::Blocked) => return Err(EndpointWriterError::Blocked),
          | Err(error) => {
            tracing::warn!(address = %self.address, attempt, %error, "endpoint handshake attempt failed");
            last = error;
          },
        },
        | Err(error) => {
          tracing::warn!(address = %self.address, attempt, %error, "endpoint connect attempt failed");
          last = EndpointWriterError::Transport(error);
        },
      }
    }
    Err(last)
  }

  async fn handshake(&self, connection: crate::transport::Connection) -> Result<(), EndpointWriterError> {
    let crate::transport::Connection { mut sink, mut stream, .. } = connection;
    sink
      .send(RemoteFrame::ConnectRequest(ConnectRequest::ServerConnection(ServerConnection {
        system_id: self.system.id().to_string(),
        address:   self.advertised_address.clone(),
      })))
      .await?;
    match stream.next().await {
      | Some(Ok(RemoteFrame::ConnectResponse(response))) => {
        if response.blocked {
          let _ = sink.close().await;
          return Err(EndpointWriterError::Blocked);
        }
        if self.block_list.is_blocked(&response.member_id) {
          let _ = sink.close().await;
          return Err(EndpointWriterError::Handshake(format!("peer {} is blocked", response.member_id)));
        }
        *self.sink.lock().await = Some(sink);
        tracing::info!(address = %self.address, member_id = %response.member_id, "endpoint connected");
        self
          .system
          .event_stream()
          .publish(&SystemEvent::EndpointConnected(EndpointConnectedEvent { address: self.address.clone() }));
        Ok(())
      },
      | Some(Ok(other)) => Err(EndpointWriterError::Handshake(format!("unexpected frame: {other:?}"))),
      | Some(Err(error)) => Err(EndpointWriterError::Transport(error)),
      | None => Err(EndpointWriterError::Handshake("connection closed during handshake".to_string())),
    }
  }

  fn dead_letter(&self, deliver: RemoteDeliver) {
    self.system.event_stream().publish(&SystemEvent::DeadLetter(DeadLetterEvent {
      target:  deliver.target,
      message: deliver.message,
      sender:  deliver.sender,
    }));
  }

  async fn close_sink(&self) {
    if let Some(mut sink) = self.sink.lock().await.take() {
      let _ = sink.close().await;
    }
  }

  async fn terminate(&self) {
    self.stopping.store(true, Ordering::SeqCst);
    self.mailbox.suspend();
    self.close_sink().await;
    self
      .system
      .event_stream()
      .publish(&SystemEvent::EndpointTerminated(EndpointTerminatedEvent { address: self.address.clone() }));
  }
}

#[async_trait]
impl MessageInvoker for EndpointWriter {
  async fn invoke_system_message(&self, message: MailboxSystemMessage) {
    match message {
      | MailboxSystemMessage::Started => {
        if let Err(error) = self.connect().await {
          tracing::error!(address = %self.address, %error, "endpoint connection failed permanently");
          self.terminate().await;
        }
      },
      | MailboxSystemMessage::Stop => {
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(sink) = self.sink.lock().await.as_mut() {
          let _ = sink.send(RemoteFrame::DisconnectRequest).await;
        }
        self.close_sink().await;
      },
    }
  }

  async fn invoke_user_messages(&self, messages: Vec<RemoteDeliver>) -> Result<(), EndpointWriterError> {
    if self.stopping.load(Ordering::SeqCst) {
      for deliver in messages {
        self.dead_letter(deliver);
      }
      return Ok(());
    }

    let outcome = build_message_batch(&self.serializer_manager, messages);
    if !outcome.batch.envelopes.is_empty() {
      let mut guard = self.sink.lock().await;
      let Some(sink) = guard.as_mut() else {
        drop(guard);
        for deliver in outcome.represented {
          self.mailbox.stash(deliver);
        }
        for deliver in outcome.remainder {
          self.mailbox.stash(deliver);
        }
        return Err(EndpointWriterError::NotConnected);
      };
      if let Err(error) = sink.send(RemoteFrame::MessageBatch(outcome.batch)).await {
        drop(guard);
        for deliver in outcome.represented {
          self.mailbox.stash(deliver);
        }
        for deliver in outcome.remainder {
          self.mailbox.stash(deliver);
        }
        return Err(EndpointWriterError::Transport(error));
      }
    }

    if outcome.terminated {
      self.stopping.store(true, Ordering::SeqCst);
      if let Some(sink) = self.sink.lock().await.as_mut() {
        let _ = sink.send(RemoteFrame::DisconnectRequest).await;
      }
      self.close_sink().await;
      for deliver in outcome.remainder {
        self.dead_letter(deliver);
      }
    }
    Ok(())
  }

  async fn escalate_failure(&self, error: EndpointWriterError) {
    tracing::error!(address = %self.address, %error, "endpoint writer failed, terminating endpoint");
    self.terminate().await;
  }
}
