//! Transport Layer
//!
//! The session engine hands finished messages (including resend requests)
//! to a [`Transport`]. Inbound bytes arrive through whatever listener the
//! host runs; the engine never reads from the transport itself.

use crate::{Result, TransportError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub mod channel;
pub mod tcp;

pub use channel::ChannelTransport;
pub use tcp::{read_frame, write_frame, TcpTransport, TcpTransportConfig};

/// Outbound side of a session connection
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one framed message
    async fn send(&self, message: &[u8]) -> Result<()>;

    /// Send message with timeout
    async fn send_timeout(&self, message: &[u8], timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.send(message))
            .await
            .map_err(|_| TransportError::timeout("send", timeout.as_millis() as u64))?
    }

    /// Short name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, message: &[u8]) -> Result<()> {
        (**self).send(message).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
