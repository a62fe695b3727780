//! Network Infrastructure
//!
//! Transport collaborators for the session engine: the [`Transport`] trait,
//! an in-process channel transport and a length-prefixed TCP client.

pub mod error;
pub mod transports;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use transports::{read_frame, write_frame, ChannelTransport, TcpTransport, TcpTransportConfig, Transport};

/// Default maximum inbound frame size for listeners
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024; // 4MB
