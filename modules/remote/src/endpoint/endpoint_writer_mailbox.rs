//! Specialized mailbox driving an endpoint writer.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::endpoint::endpoint_writer::EndpointWriterError;
use crate::messages::RemoteDeliver;

#[cfg(test)]
mod tests;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;

/// Lifecycle messages carried on the mailbox system queue.
///
/// System messages outrank user deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxSystemMessage {
  /// The endpoint was spawned; the writer must establish its connection.
  Started,
  /// The endpoint is being unloaded; the writer must close its connection.
  Stop,
}

/// Consumer callback invoked by the mailbox run loop.
#[async_trait]
pub trait MessageInvoker: Send + Sync + 'static {
  /// Handles one lifecycle message.
  async fn invoke_system_message(&self, message: MailboxSystemMessage);

  /// Handles a batch of user deliveries drained in submission order.
  async fn invoke_user_messages(&self, messages: Vec<RemoteDeliver>) -> Result<(), EndpointWriterError>;

  /// Handles a failure returned by [`MessageInvoker::invoke_user_messages`].
  async fn escalate_failure(&self, error: EndpointWriterError);
}

/// Error returned when the user queue is at capacity; carries the rejected
/// delivery back to the caller for dead-lettering.
pub struct QueueFull(
  /// The delivery that did not fit.
  pub RemoteDeliver,
);

/// Schedules mailbox run loops onto a tokio runtime.
#[derive(Clone)]
pub struct Dispatcher {
  handle: tokio::runtime::Handle,
}

impl Dispatcher {
  /// Captures the current runtime handle. Panics outside a runtime.
  #[must_use]
  pub fn new() -> Self {
    Self { handle: tokio::runtime::Handle::current() }
  }

  pub(crate) fn schedule<F>(&self, future: F)
  where
    F: Future<Output = ()> + Send + 'static, {
    self.handle.spawn(future);
  }
}

/// Two-queue mailbox with batch draining and a stash lane.
///
/// System messages always win over user deliveries. User deliveries drain in
/// batches of at most `batch_size`, stash first, then the bounded user queue.
/// At most one run loop executes at a time; posting from any thread schedules
/// the loop when it is idle. Cloning shares the mailbox.
#[derive(Clone)]
pub struct EndpointWriterMailbox {
  inner: Arc<MailboxInner>,
}

struct MailboxInner {
  user_queue:     Mutex<VecDeque<RemoteDeliver>>,
  stash:          Mutex<VecDeque<RemoteDeliver>>,
  system_queue:   Mutex<VecDeque<MailboxSystemMessage>>,
  batch_size:     usize,
  queue_size:     usize,
  schedule_state: AtomicU8,
  suspended:      AtomicBool,
  invoker:        OnceLock<Arc<dyn MessageInvoker>>,
  dispatcher:     Dispatcher,
}

impl EndpointWriterMailbox {
  /// Creates a mailbox draining at most `batch_size` deliveries per
  /// invocation and rejecting user posts beyond `queue_size`.
  #[must_use]
  pub fn new(batch_size: usize, queue_size: usize, dispatcher: Dispatcher) -> Self {
    Self {
      inner: Arc::new(MailboxInner {
        user_queue: Mutex::new(VecDeque::new()),
        stash: Mutex::new(VecDeque::new()),
        system_queue: Mutex::new(VecDeque::new()),
        batch_size: batch_size.max(1),
        queue_size,
        schedule_state: AtomicU8::new(IDLE),
        suspended: AtomicBool::new(false),
        invoker: OnceLock::new(),
        dispatcher,
      }),
    }
  }

  /// Installs the consumer. Must be called exactly once before posting.
  pub fn set_invoker(&self, invoker: Arc<dyn MessageInvoker>) {
    let _ = self.inner.invoker.set(invoker);
  }

  /// Enqueues a user delivery, rejecting it when the queue is full.
  pub fn post_user_message(&self, message: RemoteDeliver) -> Result<(), QueueFull> {
    {
      let mut queue = self.inner.user_queue.lock();
      if queue.len() >= self.inner.queue_size {
        return Err(QueueFull(message));
      }
      queue.push_back(message);
    }
    self.schedule();
    Ok(())
  }

  /// Enqueues a lifecycle message. Never rejects.
  pub fn post_system_message(&self, message: MailboxSystemMessage) {
    self.inner.system_queue.lock().push_back(message);
    self.schedule();
  }

  /// Returns a delivery to the front lane for redelivery before queued ones.
  pub fn stash(&self, message: RemoteDeliver) {
    self.inner.stash.lock().push_back(message);
  }

  /// Stops draining user deliveries until [`EndpointWriterMailbox::resume`].
  pub fn suspend(&self) {
    self.inner.suspended.store(true, Ordering::SeqCst);
  }

  /// Resumes draining user deliveries.
  pub fn resume(&self) {
    self.inner.suspended.store(false, Ordering::SeqCst);
    self.schedule();
  }

  /// Returns whether user draining is suspended.
  #[must_use]
  pub fn is_suspended(&self) -> bool {
    self.inner.suspended.load(Ordering::SeqCst)
  }

  /// Removes and returns everything still queued, stash lane first.
  #[must_use]
  pub fn drain(&self) -> Vec<RemoteDeliver> {
    let mut drained: Vec<RemoteDeliver> = self.inner.stash.lock().drain(..).collect();
    drained.extend(self.inner.user_queue.lock().drain(..));
    drained
  }

  /// Returns the number of queued user deliveries, stash included.
  #[must_use]
  pub fn user_message_count(&self) -> usize {
    self.inner.stash.lock().len() + self.inner.user_queue.lock().len()
  }

  fn schedule(&self) {
    if self
      .inner
      .schedule_state
      .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
      .is_ok()
    {
      let mailbox = self.clone();
      self.inner.dispatcher.schedule(async move {
        mailbox.run().await;
      });
    }
  }

  async fn run(self) {
    loop {
      self.process().await;
      self.inner.schedule_state.store(IDLE, Ordering::SeqCst);
      let reschedule = self.has_pending()
        && self
          .inner
          .schedule_state
          .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
          .is_ok();
      if !reschedule {
        break;
      }
    }
  }

  async fn process(&self) {
    let Some(invoker) = self.inner.invoker.get().cloned() else {
      return;
    };
    loop {
      let system = self.inner.system_queue.lock().pop_front();
      if let Some(message) = system {
        invoker.invoke_system_message(message).await;
        continue;
      }
      if self.is_suspended() {
        break;
      }
      let batch = self.take_batch();
      if batch.is_empty() {
        break;
      }
      if let Err(error) = invoker.invoke_user_messages(batch).await {
        invoker.escalate_failure(error).await;
      }
    }
  }

  fn take_batch(&self) -> Vec<RemoteDeliver> {
    let mut batch = Vec::new();
    {
      let mut stash = self.inner.stash.lock();
      while batch.len() < self.inner.batch_size {
        match stash.pop_front() {
          | Some(message) => batch.push(message),
          | None => break,
        }
      }
    }
    if batch.len() < self.inner.batch_size {
      let mut queue = self.inner.user_queue.lock();
      while batch.len() < self.inner.batch_size {
        match queue.pop_front() {
          | Some(message) => batch.push(message),
          | None => break,
        }
      }
    }
    batch
  }

  fn has_pending(&self) -> bool {
    if !self.inner.system_queue.lock().is_empty() {
      return true;
    }
    if self.is_suspended() {
      return false;
    }
    !self.inner.stash.lock().is_empty() || !self.inner.user_queue.lock().is_empty()
  }
}
