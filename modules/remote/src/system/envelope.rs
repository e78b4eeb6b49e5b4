//! User-message envelope pairing a payload with routing metadata.

use std::collections::HashMap;

use crate::system::message::DynMessage;
use crate::system::pid::Pid;

/// A user message plus optional header metadata and sender.
#[derive(Clone)]
pub struct Envelope {
  header:  Option<HashMap<String, String>>,
  message: DynMessage,
  sender:  Option<Pid>,
}

impl Envelope {
  /// Wraps a bare payload with no header and no sender.
  #[must_use]
  pub fn new(message: DynMessage) -> Self {
    Self { header: None, message, sender: None }
  }

  /// Attaches a sender pid used for replies.
  #[must_use]
  pub fn with_sender(mut self, sender: Pid) -> Self {
    self.sender = Some(sender);
    self
  }

  /// Attaches string-keyed header metadata.
  #[must_use]
  pub fn with_header(mut self, header: HashMap<String, String>) -> Self {
    self.header = Some(header);
    self
  }

  /// Returns the header metadata when present.
  #[must_use]
  pub fn header(&self) -> Option<&HashMap<String, String>> {
    self.header.as_ref()
  }

  /// Returns the payload.
  #[must_use]
  pub fn message(&self) -> &DynMessage {
    &self.message
  }

  /// Returns the sender pid when present.
  #[must_use]
  pub fn sender(&self) -> Option<&Pid> {
    self.sender.as_ref()
  }

  /// Splits the envelope into its parts.
  #[must_use]
  pub fn into_parts(self) -> (Option<HashMap<String, String>>, DynMessage, Option<Pid>) {
    (self.header, self.message, self.sender)
  }
}
