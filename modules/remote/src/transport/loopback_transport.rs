//! In-memory binding for tests and single-process demos.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::concurrent_map::ConcurrentMap;
use crate::transport::remote_transport::{Connection, FrameSink, FrameStream, RemoteTransport, TransportListener};
use crate::transport::transport_error::TransportError;
use crate::wire::RemoteFrame;

/// Shared in-memory fabric connecting [`LoopbackTransport`] instances.
///
/// Cloning shares the fabric; every transport built on the same network can
/// reach every listener bound on it.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
  listeners: ConcurrentMap<String, mpsc::UnboundedSender<Connection>>,
}

impl LoopbackNetwork {
  /// Creates an empty network.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }
}

/// Transport binding routing frames over in-process channels.
#[derive(Clone)]
pub struct LoopbackTransport {
  network: LoopbackNetwork,
}

impl LoopbackTransport {
  /// Creates a transport attached to `network`.
  #[must_use]
  pub fn new(network: LoopbackNetwork) -> Self {
    Self { network }
  }
}

fn channel_pair(local: String, peer: String) -> (Connection, Connection) {
  let (out_tx, out_rx) = mpsc::unbounded_channel();
  let (in_tx, in_rx) = mpsc::unbounded_channel();
  let dialer = Connection {
    sink:   Box::new(ChannelSink { sender: Some(out_tx) }),
    stream: Box::new(ChannelStream { receiver: in_rx }),
    peer,
  };
  let accepted = Connection {
    sink:   Box::new(ChannelSink { sender: Some(in_tx) }),
    stream: Box::new(ChannelStream { receiver: out_rx }),
    peer:   local,
  };
  (dialer, accepted)
}

#[async_trait]
impl RemoteTransport for LoopbackTransport {
  async fn connect(&self, address: &str) -> Result<Connection, TransportError> {
    let listener = self.network.listeners.get(address).ok_or_else(|| TransportError::Connect {
      address: address.to_string(),
      reason:  "no listener".to_string(),
    })?;
    let (dialer, accepted) = channel_pair("loopback".to_string(), address.to_string());
    listener.send(accepted).map_err(|_| TransportError::Connect {
      address: address.to_string(),
      reason:  "listener stopped".to_string(),
    })?;
    Ok(dialer)
  }

  async fn bind(&self, address: &str) -> Result<Box<dyn TransportListener>, TransportError> {
    if self.network.listeners.has(address) {
      return Err(TransportError::Bind { address: address.to_string(), reason: "address in use".to_string() });
    }
    let (tx, rx) = mpsc::unbounded_channel();
    self.network.listeners.set(address.to_string(), tx);
    Ok(Box::new(LoopbackListener { receiver: rx }))
  }
}

struct LoopbackListener {
  receiver: mpsc::UnboundedReceiver<Connection>,
}

#[async_trait]
impl TransportListener for LoopbackListener {
  async fn accept(&mut self) -> Result<Connection, TransportError> {
    self.receiver.recv().await.ok_or(TransportError::Closed)
  }
}

struct ChannelSink {
  sender: Option<mpsc::UnboundedSender<RemoteFrame>>,
}

#[async_trait]
impl FrameSink for ChannelSink {
  async fn send(&mut self, frame: RemoteFrame) -> Result<(), TransportError> {
    match &self.sender {
      | Some(sender) => sender.send(frame).map_err(|_| TransportError::Closed),
      | None => Err(TransportError::Closed),
    }
  }

  async fn close(&mut self) -> Result<(), TransportError> {
    self.sender = None;
    Ok(())
  }
}

struct ChannelStream {
  receiver: mpsc::UnboundedReceiver<RemoteFrame>,
}

#[async_trait]
impl FrameStream for ChannelStream {
  async fn next(&mut self) -> Option<Result<RemoteFrame, TransportError>> {
    self.receiver.recv().await.map(Ok)
  }
}
