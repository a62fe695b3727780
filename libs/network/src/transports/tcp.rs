//! TCP Transport Implementation
//!
//! Frames each message with a 4-byte big-endian length prefix. The client
//! connects lazily on first send and reconnects on the next send after a
//! write failure.

use super::Transport;
use crate::{Result, TransportError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const LENGTH_PREFIX_BYTES: usize = 4;

/// TCP transport configuration
#[derive(Debug, Clone)]
pub struct TcpTransportConfig {
    pub remote_address: SocketAddr,
    pub connect_timeout: Duration,
    /// Maximum message size
    pub max_frame_size: usize,
}

impl TcpTransportConfig {
    pub fn new(remote_address: SocketAddr) -> Self {
        Self {
            remote_address,
            connect_timeout: Duration::from_secs(5),
            max_frame_size: crate::DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Length-prefixed TCP client
pub struct TcpTransport {
    config: TcpTransportConfig,
    connection: Mutex<Option<TcpStream>>,
    bytes_sent: AtomicU64,
}

impl TcpTransport {
    pub fn new(config: TcpTransportConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
            bytes_sent: AtomicU64::new(0),
        }
    }

    pub fn new_client(remote_address: SocketAddr) -> Self {
        Self::new(TcpTransportConfig::new(remote_address))
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    async fn connect(&self) -> Result<TcpStream> {
        let addr = self.config.remote_address;
        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::timeout("connect", self.config.connect_timeout.as_millis() as u64))?
            .map_err(|e| TransportError::connection_with_source("Failed to connect", Some(addr), e))?;

        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::io("Failed to set TCP_NODELAY", e))?;
        info!(peer = %addr, "TCP transport connected");
        Ok(stream)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, message: &[u8]) -> Result<()> {
        if message.len() > self.config.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: message.len(),
                max: self.config.max_frame_size,
            });
        }

        let mut guard = self.connection.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        let Some(stream) = guard.as_mut() else {
            return Err(TransportError::network("Connection unavailable"));
        };

        if let Err(e) = write_frame(stream, message).await {
            warn!(peer = %self.config.remote_address, error = %e, "Dropping TCP connection after write failure");
            *guard = None;
            return Err(e);
        }

        let written = (LENGTH_PREFIX_BYTES + message.len()) as u64;
        let total = self.bytes_sent.fetch_add(written, Ordering::Relaxed) + written;
        debug!(
            peer = %self.config.remote_address,
            bytes = message.len(),
            total_sent = total,
            "Sent message over TCP"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "tcp"
    }
}

/// Write one length-prefixed frame and flush
pub async fn write_frame<W>(writer: &mut W, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(data.len()).map_err(|_| TransportError::FrameTooLarge {
        size: data.len(),
        max: u32::MAX as usize,
    })?;

    let mut buffer = BytesMut::with_capacity(LENGTH_PREFIX_BYTES + data.len());
    buffer.extend_from_slice(&len.to_be_bytes());
    buffer.extend_from_slice(data);

    // Single write call for the whole frame
    writer
        .write_all(&buffer)
        .await
        .map_err(|e| TransportError::network_with_source("Failed to write message", e))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::network_with_source("Failed to flush TCP stream", e))?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// Returns `Ok(None)` when the peer closes the stream on a frame boundary.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> Result<Option<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; LENGTH_PREFIX_BYTES];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(TransportError::network_with_source("Failed to read message length", e)),
    }

    let message_len = u32::from_be_bytes(len_bytes) as usize;
    if message_len > max_size {
        return Err(TransportError::FrameTooLarge {
            size: message_len,
            max: max_size,
        });
    }

    let mut buffer = BytesMut::zeroed(message_len);
    reader
        .read_exact(&mut buffer)
        .await
        .map_err(|e| TransportError::network_with_source("Failed to read message data", e))?;
    Ok(Some(buffer.freeze()))
}
