//! Length-prefixed TCP binding.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::transport::remote_transport::{Connection, FrameSink, FrameStream, RemoteTransport, TransportListener};
use crate::transport::transport_error::TransportError;
use crate::wire::RemoteFrame;

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// TCP binding framing bincode-encoded [`RemoteFrame`]s behind a big-endian
/// `u32` length prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
  /// Creates the TCP binding.
  #[must_use]
  pub fn new() -> Self {
    Self
  }

  fn split(stream: TcpStream, peer: String) -> Connection {
    let (read, write) = stream.into_split();
    Connection {
      sink: Box::new(TcpFrameSink { write }),
      stream: Box::new(TcpFrameStream { read }),
      peer,
    }
  }
}

#[async_trait]
impl RemoteTransport for TcpTransport {
  async fn connect(&self, address: &str) -> Result<Connection, TransportError> {
    let stream = TcpStream::connect(address)
      .await
      .map_err(|e| TransportError::Connect { address: address.to_string(), reason: e.to_string() })?;
    let _ = stream.set_nodelay(true);
    Ok(Self::split(stream, address.to_string()))
  }

  async fn bind(&self, address: &str) -> Result<Box<dyn TransportListener>, TransportError> {
    let listener = TcpListener::bind(address)
      .await
      .map_err(|e| TransportError::Bind { address: address.to_string(), reason: e.to_string() })?;
    Ok(Box::new(TcpTransportListener { listener }))
  }
}

struct TcpTransportListener {
  listener: TcpListener,
}

#[async_trait]
impl TransportListener for TcpTransportListener {
  async fn accept(&mut self) -> Result<Connection, TransportError> {
    let (stream, peer) = self.listener.accept().await.map_err(|e| TransportError::Io(e.to_string()))?;
    let _ = stream.set_nodelay(true);
    Ok(TcpTransport::split(stream, peer.to_string()))
  }
}

struct TcpFrameSink {
  write: OwnedWriteHalf,
}

#[async_trait]
impl FrameSink for TcpFrameSink {
  async fn send(&mut self, frame: RemoteFrame) -> Result<(), TransportError> {
    let bytes = bincode::serde::encode_to_vec(&frame, bincode::config::standard())
      .map_err(|e| TransportError::Codec(e.to_string()))?;
    if bytes.len() > MAX_FRAME_LEN {
      return Err(TransportError::FrameTooLarge(bytes.len()));
    }
    let len = bytes.len() as u32;
    self
      .write
      .write_all(&len.to_be_bytes())
      .await
      .map_err(|e| TransportError::Io(e.to_string()))?;
    self.write.write_all(&bytes).await.map_err(|e| TransportError::Io(e.to_string()))?;
    self.write.flush().await.map_err(|e| TransportError::Io(e.to_string()))
  }

  async fn close(&mut self) -> Result<(), TransportError> {
    self.write.shutdown().await.map_err(|e| TransportError::Io(e.to_string()))
  }
}

struct TcpFrameStream {
  read: OwnedReadHalf,
}

#[async_trait]
impl FrameStream for TcpFrameStream {
  async fn next(&mut self) -> Option<Result<RemoteFrame, TransportError>> {
    let mut len_buf = [0u8; 4];
    match self.read.read_exact(&mut len_buf).await {
      | Ok(_) => {},
      | Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return None,
      | Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
      return Some(Err(TransportError::FrameTooLarge(len)));
    }
    let mut buf = vec![0u8; len];
    if let Err(e) = self.read.read_exact(&mut buf).await {
      return Some(Err(TransportError::Io(e.to_string())));
    }
    match bincode::serde::decode_from_slice::<RemoteFrame, _>(&buf, bincode::config::standard()) {
      | Ok((frame, _)) => Some(Ok(frame)),
      | Err(e) => Some(Err(TransportError::Codec(e.to_string()))),
    }
  }
}
