//! Spawns the writer/watcher pair serving one remote address.

use std::sync::Arc;

use crate::block_list::BlockList;
use crate::config::RemoteConfig;
use crate::endpoint::endpoint_handle::Endpoint;
use crate::endpoint::endpoint_watcher::{DeliverFn, EndpointWatcher, WatcherBehavior};
use crate::endpoint::endpoint_writer::EndpointWriter;
use crate::endpoint::endpoint_writer_mailbox::{Dispatcher, EndpointWriterMailbox, MailboxSystemMessage, QueueFull};
use crate::messages::DeadLetterEvent;
use crate::serializer::SerializerManager;
use crate::system::{ActorSystem, SystemEvent};
use crate::transport::RemoteTransport;

/// Builds endpoints on demand for the manager's lazy registry.
///
/// Spawning is synchronous and cheap: it wires the mailbox, writer and
/// watcher and queues the writer's `Started` message. The network connect
/// happens afterwards on the writer's own run loop.
pub struct EndpointSupervisor {
  system:             ActorSystem,
  config:             RemoteConfig,
  transport:          Arc<dyn RemoteTransport>,
  serializer_manager: SerializerManager,
  block_list:         BlockList,
  dispatcher:         Dispatcher,
}

impl EndpointSupervisor {
  pub(crate) fn new(
    system: ActorSystem,
    config: RemoteConfig,
    transport: Arc<dyn RemoteTransport>,
    serializer_manager: SerializerManager,
    block_list: BlockList,
    dispatcher: Dispatcher,
  ) -> Self {
    Self { system, config, transport, serializer_manager, block_list, dispatcher }
  }

  pub(crate) fn spawn_endpoint(&self, address: &str) -> Endpoint {
    let mailbox = EndpointWriterMailbox::new(
      self.config.endpoint_writer_batch_size(),
      self.config.endpoint_writer_queue_size(),
      self.dispatcher.clone(),
    );
    let writer = Arc::new(EndpointWriter::new(
      self.system.clone(),
      address.to_string(),
      self.config.advertised_address(),
      self.config.max_retry_count(),
      self.config.retry_interval(),
      self.transport.clone(),
      self.serializer_manager.clone(),
      self.block_list.clone(),
      mailbox.clone(),
    ));
    mailbox.set_invoker(writer);
    mailbox.post_system_message(MailboxSystemMessage::Started);

    let outbound = mailbox.clone();
    let system = self.system.clone();
    let deliver: DeliverFn = Arc::new(move |deliver| {
      if let Err(QueueFull(rejected)) = outbound.post_user_message(deliver) {
        system.event_stream().publish(&SystemEvent::DeadLetter(DeadLetterEvent {
          target:  rejected.target,
          message: rejected.message,
          sender:  rejected.sender,
        }));
      }
    });
    let behavior = WatcherBehavior::new(self.system.clone(), address.to_string(), deliver);
    let watcher = EndpointWatcher::spawn(&self.dispatcher, behavior);

    tracing::debug!(address, "endpoint spawned");
    Endpoint::new(address.to_string(), mailbox, watcher)
  }
}
