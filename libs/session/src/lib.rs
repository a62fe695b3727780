//! # SWIFT Session Resilience Engine
//!
//! Keeps a SWIFT session consistent across gaps, replays and crashes:
//!
//! - [`SequenceReconciler`]: durable counter checkpoint, gap detection,
//!   resend requests
//! - [`DuplicateStore`]: persistent idempotency guard on business references
//! - [`AckCorrelator`]: pending acknowledgments with deadlines, rehydrated
//!   after a restart with their remaining budget
//! - [`HealthTracker`]: cumulative per-session failure metrics
//! - [`SwiftSession`]: the inbound and outbound pipelines over all of them
//!
//! Integrity trailers and reject-code classification live in `codec`;
//! durable storage in `state`; transports in `network`.
//!
//! ```rust,no_run
//! use session::{clock::SystemClock, open_store, SwiftSession};
//! use network::ChannelTransport;
//! use session_config::EngineConfig;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = EngineConfig::load(Path::new("config/engine.toml"), None)?;
//! session::logging::init(&config.logging)?;
//!
//! let store = open_store(&config.storage).await?;
//! let (transport, _outbound) = ChannelTransport::new("swift");
//! let session = SwiftSession::new(&config, store, Arc::new(transport), Arc::new(SystemClock)).await?;
//! session.start().await?;
//!
//! let handle = session.send("MUR0001", "{1:F01BANKBEBBAXXX0001000001}{4:\r\n:20:REF1\r\n-}").await?;
//! let outcome = handle.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod correlator;
pub mod duplicate;
pub mod error;
pub mod health;
pub mod logging;
pub mod maintenance;
pub mod reconciliation;
pub mod session;

pub use clock::{Clock, SharedClock, SystemClock};
pub use correlator::{AckCorrelator, AckHandle, HydrationReport, ResolveDisposition};
pub use duplicate::DuplicateStore;
pub use error::{SessionError, SessionResult};
pub use health::HealthTracker;
pub use maintenance::{run_sweep, spawn_maintenance, MaintenanceHandle, SweepReport};
pub use reconciliation::SequenceReconciler;
pub use session::{open_store, InboundDisposition, StartupReport, SwiftSession};
