//! Inbound connection handler dispatching batched envelopes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::block_list::BlockList;
use crate::endpoint::endpoint_manager::{DisconnectSignal, EndpointManager};
use crate::messages::RemoteTerminate;
use crate::serializer::{SerializerError, SerializerManager};
use crate::system::{
  downcast_message, ActorSystem, DynMessage, Envelope, Pid, Stop, SystemMessage, Terminated, Unwatch, Watch,
};
use crate::transport::{Connection, TransportError};
use crate::wire::{ConnectRequest, ConnectResponse, MessageBatch, RemoteFrame};

#[cfg(test)]
mod tests;

/// Error raised while serving an inbound connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointReaderError {
  /// The transport failed mid-stream.
  #[error(transparent)]
  Transport(#[from] TransportError),
  /// A payload failed to decode; the whole batch is aborted.
  #[error(transparent)]
  Serializer(#[from] SerializerError),
  /// A batch envelope referenced a missing lookup-table entry.
  #[error("malformed batch: {0}")]
  MalformedBatch(String),
  /// The connection violated the handshake protocol.
  #[error("handshake failed: {0}")]
  Handshake(String),
}

/// Serves inbound connections: handshake, batch dispatch, disconnect.
///
/// Cloning shares the reader; one clone serves each accepted connection.
#[derive(Clone)]
pub struct EndpointReader {
  inner: Arc<ReaderInner>,
}

struct ReaderInner {
  system:             ActorSystem,
  manager:            EndpointManager,
  serializer_manager: SerializerManager,
  block_list:         BlockList,
  suspended:          AtomicBool,
}

impl EndpointReader {
  /// Creates a reader dispatching into `system` via `manager`.
  #[must_use]
  pub fn new(
    system: ActorSystem,
    manager: EndpointManager,
    serializer_manager: SerializerManager,
    block_list: BlockList,
  ) -> Self {
    Self {
      inner: Arc::new(ReaderInner {
        system,
        manager,
        serializer_manager,
        block_list,
        suspended: AtomicBool::new(false),
      }),
    }
  }

  /// Suspends or resumes batch dispatch. Suspended connections stay open but
  /// skip incoming batches; used during graceful shutdown.
  pub fn suspend(&self, suspended: bool) {
    self.inner.suspended.store(suspended, Ordering::SeqCst);
  }

  /// Returns whether batch dispatch is suspended.
  #[must_use]
  pub fn is_suspended(&self) -> bool {
    self.inner.suspended.load(Ordering::SeqCst)
  }

  /// Serves one accepted connection to completion.
  pub async fn handle_connection(&self, connection: Connection) {
    let peer = connection.peer.clone();
    if let Err(error) = self.serve(connection).await {
      tracing::warn!(peer = %peer, %error, "inbound connection ended with error");
    }
  }

  async fn serve(&self, connection: Connection) -> Result<(), EndpointReaderError> {
    let Connection { mut sink, mut stream, peer } = connection;

    let first = match stream.next().await {
      | Some(frame) => frame?,
      | None => return Err(EndpointReaderError::Handshake("closed before handshake".to_string())),
    };
    let RemoteFrame::ConnectRequest(request) = first else {
      return Err(EndpointReaderError::Handshake("expected connect request".to_string()));
    };
    match request {
      | ConnectRequest::ServerConnection(server) => {
        let blocked = self.inner.block_list.is_blocked(&server.system_id);
        sink
          .send(RemoteFrame::ConnectResponse(ConnectResponse {
            member_id: self.inner.system.id().to_string(),
            blocked,
          }))
          .await?;
        if blocked {
          tracing::warn!(peer = %peer, system_id = %server.system_id, "refused connection from blocked member");
          let _ = sink.close().await;
          return Ok(());
        }
        tracing::info!(peer = %peer, address = %server.address, "accepted member connection");
      },
      | ConnectRequest::ClientConnection => {
        sink
          .send(RemoteFrame::ConnectResponse(ConnectResponse {
            member_id: self.inner.system.id().to_string(),
            blocked:   false,
          }))
          .await?;
        tracing::info!(peer = %peer, "accepted client connection");
      },
    }

    let connection_id = Uuid::new_v4().to_string();
    let (disconnect_tx, mut disconnect_rx) = oneshot::channel::<bool>();
    self
      .inner
      .manager
      .register_reader_connection(&connection_id, DisconnectSignal::new(disconnect_tx));

    let result = loop {
      tokio::select! {
        graceful = &mut disconnect_rx => {
          if graceful.unwrap_or(false) {
            let _ = sink.send(RemoteFrame::DisconnectRequest).await;
          }
          let _ = sink.close().await;
          break Ok(());
        },
        frame = stream.next() => match frame {
          | None => break Ok(()),
          | Some(Err(error)) => break Err(error.into()),
          | Some(Ok(RemoteFrame::MessageBatch(batch))) => {
            if self.is_suspended() {
              continue;
            }
            if let Err(error) = self.on_message_batch(&batch) {
              break Err(error);
            }
          },
          | Some(Ok(RemoteFrame::DisconnectRequest)) => break Ok(()),
          | Some(Ok(other)) => {
            tracing::warn!(peer = %peer, frame = ?other, "unexpected frame after handshake");
          },
        },
      }
    };
    self.inner.manager.deregister_reader_connection(&connection_id);
    result
  }

  /// Resolves and dispatches every envelope of a batch in order.
  ///
  /// The first malformed or undecodable envelope aborts the rest.
  pub(crate) fn on_message_batch(&self, batch: &MessageBatch) -> Result<(), EndpointReaderError> {
    for envelope in &batch.envelopes {
      let type_name = batch
        .type_names
        .get(envelope.type_id as usize)
        .ok_or_else(|| EndpointReaderError::MalformedBatch(format!("type index {}", envelope.type_id)))?;
      let target_base = batch
        .targets
        .get(envelope.target as usize)
        .ok_or_else(|| EndpointReaderError::MalformedBatch(format!("target index {}", envelope.target)))?;
      let target = if envelope.target_request_id == 0 {
        target_base.clone()
      } else {
        target_base.with_request_id(envelope.target_request_id)
      };
      let sender = match envelope.sender {
        | 0 => None,
        | index => {
          let base = batch
            .senders
            .get(index as usize - 1)
            .ok_or_else(|| EndpointReaderError::MalformedBatch(format!("sender index {index}")))?;
          if envelope.sender_request_id == 0 {
            Some(base.clone())
          } else {
            Some(base.with_request_id(envelope.sender_request_id))
          }
        },
      };
      let message = self
        .inner
        .serializer_manager
        .deserialize(envelope.serializer_id, type_name, &envelope.message_data)?;
      self.dispatch(target, sender, envelope.message_header.clone(), message);
    }
    Ok(())
  }

  fn dispatch(
    &self,
    target: Pid,
    sender: Option<Pid>,
    header: Option<std::collections::HashMap<String, String>>,
    message: DynMessage,
  ) {
    if let Some(terminated) = downcast_message::<Terminated>(&message) {
      self.inner.manager.remote_terminate(RemoteTerminate { watcher: target, watchee: terminated.who.clone() });
      return;
    }
    if let Some(watch) = downcast_message::<Watch>(&message) {
      self.inner.system.send_system(&target, SystemMessage::Watch(watch.clone()));
      return;
    }
    if let Some(unwatch) = downcast_message::<Unwatch>(&message) {
      self.inner.system.send_system(&target, SystemMessage::Unwatch(unwatch.clone()));
      return;
    }
    if downcast_message::<Stop>(&message).is_some() {
      self.inner.system.send_system(&target, SystemMessage::Stop(Stop));
      return;
    }
    let mut envelope = Envelope::new(message);
    if let Some(sender) = sender {
      envelope = envelope.with_sender(sender);
    }
    if let Some(header) = header {
      envelope = envelope.with_header(header);
    }
    self.inner.system.send(&target, envelope);
  }
}
