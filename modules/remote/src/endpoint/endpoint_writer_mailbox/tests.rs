use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::endpoint::endpoint_writer::EndpointWriterError;
use crate::endpoint::endpoint_writer_mailbox::{
  Dispatcher, EndpointWriterMailbox, MailboxSystemMessage, MessageInvoker,
};
use crate::messages::{Ping, RemoteDeliver};
use crate::system::Pid;

struct RecordingInvoker {
  events:    Mutex<Vec<String>>,
  batches:   Mutex<Vec<Vec<String>>>,
  escalated: Mutex<Vec<EndpointWriterError>>,
  fail:      Mutex<bool>,
}

impl RecordingInvoker {
  fn new() -> Arc<Self> {
    Arc::new(Self {
      events:    Mutex::new(Vec::new()),
      batches:   Mutex::new(Vec::new()),
      escalated: Mutex::new(Vec::new()),
      fail:      Mutex::new(false),
    })
  }
}

#[async_trait]
impl MessageInvoker for RecordingInvoker {
  async fn invoke_system_message(&self, message: MailboxSystemMessage) {
    self.events.lock().push(format!("system:{message:?}"));
  }

  async fn invoke_user_messages(&self, messages: Vec<RemoteDeliver>) -> Result<(), EndpointWriterError> {
    self.events.lock().push(format!("batch:{}", messages.len()));
    self
      .batches
      .lock()
      .push(messages.iter().map(|m| m.target.id().to_string()).collect());
    if *self.fail.lock() {
      return Err(EndpointWriterError::NotConnected);
    }
    Ok(())
  }

  async fn escalate_failure(&self, error: EndpointWriterError) {
    self.escalated.lock().push(error);
  }
}

fn deliver(id: &str) -> RemoteDeliver {
  RemoteDeliver {
    header:  None,
    message: Arc::new(Ping),
    target:  Pid::new("127.0.0.1:9000", id),
    sender:  None,
  }
}

fn mailbox(batch_size: usize, queue_size: usize, invoker: Arc<RecordingInvoker>) -> EndpointWriterMailbox {
  let mailbox = EndpointWriterMailbox::new(batch_size, queue_size, Dispatcher::new());
  mailbox.set_invoker(invoker);
  mailbox
}

async fn settle() {
  for _ in 0..16 {
    tokio::task::yield_now().await;
  }
}

#[tokio::test]
async fn deliveries_within_batch_size_drain_in_one_invocation() {
  let invoker = RecordingInvoker::new();
  let mailbox = mailbox(10, 100, invoker.clone());

  for i in 0..5 {
    mailbox.post_user_message(deliver(&format!("p{i}"))).ok().unwrap();
  }
  settle().await;

  let batches = invoker.batches.lock();
  assert_eq!(batches.len(), 1);
  assert_eq!(batches[0].len(), 5);
  assert_eq!(batches[0], vec!["p0", "p1", "p2", "p3", "p4"]);
}

#[tokio::test]
async fn deliveries_beyond_batch_size_split_in_order() {
  let invoker = RecordingInvoker::new();
  let mailbox = mailbox(4, 100, invoker.clone());

  for i in 0..5 {
    mailbox.post_user_message(deliver(&format!("p{i}"))).ok().unwrap();
  }
  settle().await;

  let batches = invoker.batches.lock();
  assert_eq!(batches.len(), 2);
  assert_eq!(batches[0].len(), 4);
  assert_eq!(batches[1], vec!["p4"]);
}

#[tokio::test]
async fn system_messages_outrank_user_deliveries() {
  let invoker = RecordingInvoker::new();
  let mailbox = mailbox(10, 100, invoker.clone());

  mailbox.post_user_message(deliver("p0")).ok().unwrap();
  mailbox.post_user_message(deliver("p1")).ok().unwrap();
  mailbox.post_system_message(MailboxSystemMessage::Started);
  settle().await;

  let events = invoker.events.lock();
  assert_eq!(*events, vec!["system:Started".to_string(), "batch:2".to_string()]);
}

#[tokio::test]
async fn full_user_queue_rejects_the_post() {
  let mailbox = EndpointWriterMailbox::new(10, 2, Dispatcher::new());
  // no invoker installed, nothing drains

  assert!(mailbox.post_user_message(deliver("p0")).is_ok());
  assert!(mailbox.post_user_message(deliver("p1")).is_ok());
  let rejected = mailbox.post_user_message(deliver("p2"));
  assert!(rejected.is_err());
  assert_eq!(rejected.err().unwrap().0.target.id(), "p2");
  assert_eq!(mailbox.user_message_count(), 2);
}

#[tokio::test]
async fn suspended_mailbox_holds_user_messages_until_resume() {
  let invoker = RecordingInvoker::new();
  let mailbox = mailbox(10, 100, invoker.clone());

  mailbox.suspend();
  mailbox.post_user_message(deliver("p0")).ok().unwrap();
  settle().await;
  assert!(invoker.batches.lock().is_empty());
  assert_eq!(mailbox.user_message_count(), 1);

  mailbox.resume();
  settle().await;
  assert_eq!(invoker.batches.lock().len(), 1);
}

#[tokio::test]
async fn suspended_mailbox_still_processes_system_messages() {
  let invoker = RecordingInvoker::new();
  let mailbox = mailbox(10, 100, invoker.clone());

  mailbox.suspend();
  mailbox.post_user_message(deliver("p0")).ok().unwrap();
  mailbox.post_system_message(MailboxSystemMessage::Stop);
  settle().await;

  let events = invoker.events.lock();
  assert_eq!(*events, vec!["system:Stop".to_string()]);
}

#[tokio::test]
async fn stashed_deliveries_drain_before_queued_ones() {
  let invoker = RecordingInvoker::new();
  let mailbox = mailbox(10, 100, invoker.clone());

  mailbox.suspend();
  mailbox.post_user_message(deliver("queued")).ok().unwrap();
  mailbox.stash(deliver("stashed"));
  mailbox.resume();
  settle().await;

  let batches = invoker.batches.lock();
  assert_eq!(batches.len(), 1);
  assert_eq!(batches[0], vec!["stashed", "queued"]);
}

#[tokio::test]
async fn invoker_failure_is_escalated() {
  let invoker = RecordingInvoker::new();
  *invoker.fail.lock() = true;
  let mailbox = mailbox(10, 100, invoker.clone());

  mailbox.post_user_message(deliver("p0")).ok().unwrap();
  settle().await;

  let escalated = invoker.escalated.lock();
  assert_eq!(*escalated, vec![EndpointWriterError::NotConnected]);
}

#[tokio::test]
async fn drain_returns_stash_first_then_queue() {
  let mailbox = EndpointWriterMailbox::new(10, 100, Dispatcher::new());
  mailbox.suspend();
  mailbox.post_user_message(deliver("queued")).ok().unwrap();
  mailbox.stash(deliver("stashed"));

  let drained = mailbox.drain();
  let ids: Vec<&str> = drained.iter().map(|d| d.target.id()).collect();
  assert_eq!(ids, vec!["stashed", "queued"]);
  assert_eq!(mailbox.user_message_count(), 0);
}
