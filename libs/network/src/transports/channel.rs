//! In-process transport backed by a tokio channel

use super::Transport;
use crate::{Result, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Delivers each sent message to an `mpsc` receiver.
///
/// Used to connect the engine to an embedding process, and in tests to
/// observe exactly what the engine put on the wire.
#[derive(Debug)]
pub struct ChannelTransport {
    name: String,
    tx: mpsc::UnboundedSender<Bytes>,
    sent: AtomicU64,
}

impl ChannelTransport {
    pub fn new(name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            name: name.into(),
            tx,
            sent: AtomicU64::new(0),
        };
        (transport, rx)
    }

    /// Messages accepted so far
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, message: &[u8]) -> Result<()> {
        self.tx
            .send(Bytes::copy_from_slice(message))
            .map_err(|_| TransportError::closed(&self.name))?;
        let total = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(transport = %self.name, bytes = message.len(), total_sent = total, "Sent message over channel");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delivers_in_order() {
        let (transport, mut rx) = ChannelTransport::new("loopback");
        transport.send(b"first").await.unwrap();
        transport.send(b"second").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"first"));
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"second"));
        assert_eq!(transport.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_closed_receiver() {
        let (transport, rx) = ChannelTransport::new("loopback");
        drop(rx);
        let err = transport.send(b"lost").await.unwrap_err();
        assert!(matches!(err, TransportError::Closed { .. }));
        assert_eq!(transport.sent_count(), 0);
    }
}
