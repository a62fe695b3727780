//! Tracing subscriber setup

use crate::error::{SessionError, SessionResult};
use session_config::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a subscriber was already installed.
pub fn init(settings: &LoggingSettings) -> SessionResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| {
            SessionError::configuration(format!("invalid log level '{}': {}", settings.level, e))
        })?,
    };

    let installed = if settings.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    Ok(installed.is_ok())
}
