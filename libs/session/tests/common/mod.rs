//! Shared fixtures for session integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use network::{ChannelTransport, Transport, TransportError};
use session::clock::ManualClock;
use session::SwiftSession;
use session_config::EngineConfig;
use state::{DurableStore, MemoryStore, StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const CONFIG: &str = r#"
[session]
session_id = "S1"
sender_id = "BANKBEBB"
target_id = "BANKDEFF"

[security]
bilateral_key = "bilateral-test-key"

[acknowledgments]
timeout_secs = 30
"#;

pub fn config() -> EngineConfig {
    EngineConfig::from_toml_str(CONFIG).unwrap()
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Customer transfer with the given header sequence and business reference
pub fn mt103(sequence: u64, reference: &str) -> String {
    outgoing(sequence, &format!("MUR{:04}", sequence), reference)
}

/// Customer transfer carrying an explicit user reference (tag 108)
pub fn outgoing(sequence: u64, mur: &str, reference: &str) -> String {
    format!(
        "{{1:F01BANKBEBBAXXX0001{:06}}}{{3:{{108:{}}}}}{{4:\r\n:20:{}\r\n:32A:240301EUR1000,00\r\n-}}",
        sequence, mur, reference
    )
}

/// Positive acknowledgment of `mur`
pub fn ack(sequence: u64, mur: &str) -> String {
    format!(
        "{{1:F21BANKBEBBAXXX0001{:06}}}{{4:{{177:2403010930}}{{451:0}}{{108:{}}}}}",
        sequence, mur
    )
}

/// Negative acknowledgment of `mur`
pub fn nak(sequence: u64, mur: &str, code: &str, text: &str) -> String {
    format!(
        "{{1:F21BANKBEBBAXXX0001{:06}}}{{4:{{177:2403010930}}{{451:1}}{{405:{}}}{{432:{}}}{{108:{}}}}}",
        sequence, code, text, mur
    )
}

pub struct Harness {
    pub session: SwiftSession,
    pub outbound: mpsc::UnboundedReceiver<Bytes>,
    pub store: Arc<dyn DurableStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub async fn new() -> Self {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        Self::with_store(store, Arc::new(ManualClock::new(t0()))).await
    }

    pub async fn with_store(store: Arc<dyn DurableStore>, clock: Arc<ManualClock>) -> Self {
        let (transport, outbound) = ChannelTransport::new("test");
        let session = SwiftSession::new(&config(), store.clone(), Arc::new(transport), clock.clone())
            .await
            .unwrap();
        Self {
            session,
            outbound,
            store,
            clock,
        }
    }

    /// Frame an inbound message with a valid trailer
    pub fn framed(&self, body: &str) -> String {
        self.session.trailer().append_trailer(body).unwrap()
    }
}

/// Transport whose every send fails
#[derive(Debug, Default)]
pub struct BrokenTransport;

#[async_trait]
impl Transport for BrokenTransport {
    async fn send(&self, _message: &[u8]) -> network::Result<()> {
        Err(TransportError::closed("broken"))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Memory store whose writes can be switched off
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn store(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.check(key)?;
        self.inner.store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.retrieve(key).await
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        self.check(key)?;
        self.inner.remove(key).await
    }

    async fn all_keys(&self) -> StoreResult<Vec<String>> {
        self.inner.all_keys().await
    }
}
