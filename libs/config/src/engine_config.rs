//! Engine Configuration Module
//!
//! Loads the session engine settings from a TOML file, an optional
//! environment-specific overlay, and `SWIFT_`-prefixed environment
//! variables (`SWIFT_ACKNOWLEDGMENTS__TIMEOUT_SECS=120`).

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SWIFT";

/// Main engine configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub session: SessionSettings,
    pub security: SecuritySettings,
    pub acknowledgments: AcknowledgmentSettings,
    pub duplicates: DuplicateSettings,
    pub maintenance: MaintenanceSettings,
    pub reject_codes: RejectCodeSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Session identity
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionSettings {
    /// Namespaces the persisted counters and health record
    pub session_id: String,
    /// Sender identifier placed in resend requests (tag 49)
    pub sender_id: String,
    /// Target identifier placed in resend requests (tag 56)
    pub target_id: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_id: "default".to_string(),
            sender_id: String::new(),
            target_id: String::new(),
        }
    }
}

/// How the configured key string maps to key bytes
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// UTF-8 bytes of the string
    #[default]
    Plain,
    /// Hex-encoded bytes
    Hex,
}

/// Secret value that never appears in `Debug` output
#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn decode(&self, encoding: KeyEncoding) -> Result<Vec<u8>> {
        match encoding {
            KeyEncoding::Plain => Ok(self.0.as_bytes().to_vec()),
            KeyEncoding::Hex => hex::decode(self.0.trim()).context("Bilateral key is not valid hex"),
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SecuritySettings {
    pub bilateral_key: SecretKey,
    pub key_encoding: KeyEncoding,
}

impl SecuritySettings {
    pub fn key_bytes(&self) -> Result<Vec<u8>> {
        let bytes = self.bilateral_key.decode(self.key_encoding)?;
        if bytes.is_empty() {
            bail!("Bilateral key is empty");
        }
        Ok(bytes)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AcknowledgmentSettings {
    /// Per-message acknowledgment deadline
    pub timeout_secs: u64,
    /// How long resolved outcomes stay queryable through `status`
    pub outcome_retention_secs: u64,
}

impl Default for AcknowledgmentSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            outcome_retention_secs: 3600,
        }
    }
}

impl AcknowledgmentSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn outcome_retention(&self) -> Duration {
        Duration::from_secs(self.outcome_retention_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DuplicateSettings {
    pub retention_hours: u64,
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self { retention_hours: 72 }
    }
}

impl DuplicateSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(3600))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MaintenanceSettings {
    pub sweep_interval_secs: u64,
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
        }
    }
}

impl MaintenanceSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct RejectCodeSettings {
    /// TOML dictionary; the built-in table is used when unset
    pub dictionary_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Required for the file backend
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: &Path, environment: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from(base_path).required(true));

        // Overlay lives next to the base file: environments/<name>.toml
        if let Some(env) = environment {
            let env_file = base_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(env_source());

        let config = builder.build().context("Failed to build configuration")?;
        let mut engine: Self = config.try_deserialize().context("Failed to deserialize configuration")?;
        engine.expand_env_vars()?;
        engine.validate()?;
        Ok(engine)
    }

    /// Parse inline TOML; environment variables still apply
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .add_source(env_source())
            .build()
            .context("Failed to build configuration")?;
        let mut engine: Self = config.try_deserialize().context("Failed to deserialize configuration")?;
        engine.expand_env_vars()?;
        engine.validate()?;
        Ok(engine)
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(path) = &self.reject_codes.dictionary_path {
            self.reject_codes.dictionary_path = Some(expand_path(path).context("Failed to expand dictionary path")?);
        }
        if let Some(dir) = &self.storage.directory {
            self.storage.directory = Some(expand_path(dir).context("Failed to expand storage directory")?);
        }
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.session.session_id.trim().is_empty() {
            bail!("session.session_id must not be empty");
        }
        if self.security.bilateral_key.is_empty() {
            bail!("security.bilateral_key must be set");
        }
        self.security.key_bytes().context("security.bilateral_key is unusable")?;
        if self.acknowledgments.timeout_secs == 0 {
            bail!("acknowledgments.timeout_secs must be greater than zero");
        }
        if self.duplicates.retention_hours == 0 {
            bail!("duplicates.retention_hours must be greater than zero");
        }
        if self.maintenance.sweep_interval_secs == 0 {
            bail!("maintenance.sweep_interval_secs must be greater than zero");
        }
        if self.storage.backend == StorageBackend::File && self.storage.directory.is_none() {
            bail!("storage.directory is required for the file backend");
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::env(&raw)?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Convenience function to load configuration from a file
pub fn load_config(path: &Path, environment: Option<&str>) -> Result<EngineConfig> {
    EngineConfig::load(path, environment)
}
