//! # SWIFT Session Engine Configuration
//!
//! Loads and validates the settings the session engine consumes: session
//! identity, the bilateral key, acknowledgment timeouts, duplicate
//! retention, the reject-code dictionary location, storage backend and
//! logging.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use session_config::EngineConfig;
//! use std::path::Path;
//!
//! let config = EngineConfig::load(Path::new("config/engine.toml"), Some("staging"))?;
//! let timeout = config.acknowledgments.timeout();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod engine_config;

pub use engine_config::{
    load_config, AcknowledgmentSettings, DuplicateSettings, EngineConfig, KeyEncoding, LoggingSettings,
    MaintenanceSettings, RejectCodeSettings, SecretKey, SecuritySettings, SessionSettings, StorageBackend,
    StorageSettings,
};
