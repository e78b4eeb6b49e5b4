//! Per-address endpoint machinery: writer, watcher, supervisor, manager,
//! reader and the lazy-connect registry entry.

mod endpoint_handle;
mod endpoint_lazy;
mod endpoint_manager;
mod endpoint_reader;
mod endpoint_supervisor;
mod endpoint_watcher;
mod endpoint_writer;
mod endpoint_writer_mailbox;

pub use endpoint_handle::Endpoint;
pub use endpoint_lazy::EndpointLazy;
pub use endpoint_manager::{DisconnectSignal, EndpointManager};
pub use endpoint_reader::{EndpointReader, EndpointReaderError};
pub use endpoint_supervisor::EndpointSupervisor;
pub use endpoint_watcher::{EndpointWatcher, WatcherMessage};
pub use endpoint_writer::{EndpointWriter, EndpointWriterError};
pub use endpoint_writer_mailbox::{Dispatcher, EndpointWriterMailbox, MailboxSystemMessage, MessageInvoker, QueueFull};
