//! Handle pairing the writer mailbox and watcher for one remote address.

use crate::endpoint::endpoint_watcher::EndpointWatcher;
use crate::endpoint::endpoint_writer_mailbox::EndpointWriterMailbox;

/// A live endpoint: the outbound mailbox plus the watch bookkeeper.
#[derive(Clone)]
pub struct Endpoint {
  address:        String,
  writer_mailbox: EndpointWriterMailbox,
  watcher:        EndpointWatcher,
}

impl Endpoint {
  pub(crate) fn new(address: String, writer_mailbox: EndpointWriterMailbox, watcher: EndpointWatcher) -> Self {
    Self { address, writer_mailbox, watcher }
  }

  /// Returns the remote address this endpoint serves.
  #[must_use]
  pub fn address(&self) -> &str {
    &self.address
  }

  /// Returns the writer mailbox.
  #[must_use]
  pub fn writer_mailbox(&self) -> &EndpointWriterMailbox {
    &self.writer_mailbox
  }

  /// Returns the watcher handle.
  #[must_use]
  pub fn watcher(&self) -> &EndpointWatcher {
    &self.watcher
  }
}
