//! Local-runtime collaborator boundary consumed by the remoting layer.

mod actor_future;
mod actor_system;
mod envelope;
mod event_stream;
mod message;
mod pid;
mod process;
mod process_registry;
mod props;
mod system_message;

pub use actor_future::{ActorFuture, FutureError};
pub use actor_system::ActorSystem;
pub use envelope::Envelope;
pub use event_stream::{EventStream, Subscription, SystemEvent};
pub use message::{downcast_message, DynMessage, Message, MessageBody};
pub use pid::{Pid, NONHOST};
pub use process::Process;
pub use process_registry::{AddressResolver, ProcessRegistry};
pub use props::{Props, SpawnError};
pub use system_message::{Stop, SystemMessage, Terminated, TerminatedReason, Unwatch, Watch};
