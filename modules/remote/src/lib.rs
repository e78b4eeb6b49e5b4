//! Remoting layer for the orbit actor runtime.
//!
//! Gives location transparency to process ids: sends to a pid on another
//! node are serialized, batched and written over a per-address connection
//! that is established lazily on first use. The layer also carries remote
//! watch registrations, a remote-activation protocol and an append-only
//! block list refusing connections from unwanted nodes.
//!
//! The main entry point is [`Remote`]: bind it to an [`system::ActorSystem`]
//! with a [`RemoteConfig`], call `start`, and every pid addressed to another
//! node resolves to a forwarding process automatically.

#![deny(missing_docs)]

pub mod activator;
pub mod block_list;
pub mod concurrent_map;
pub mod config;
pub mod endpoint;
pub mod messages;
pub mod remote;
pub mod remote_process;
pub mod response_status_code;
pub mod serializer;
pub mod system;
pub mod transport;
pub mod wire;

pub use block_list::BlockList;
pub use concurrent_map::ConcurrentMap;
pub use config::RemoteConfig;
pub use remote::{Remote, RemoteError};
pub use response_status_code::ResponseStatusCode;
