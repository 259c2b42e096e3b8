//! Logging initialization.
//!
//! The queue itself only emits `tracing` events; nothing is printed until
//! the application installs a subscriber. `init_telemetry` sets up a
//! tracing-subscriber fmt layer for binaries and tests that want to see
//! them.

pub mod queue;

use crate::error::{Error, Result};

/// Configuration for telemetry initialization.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Fallback filter directive (e.g. "debug", "uniq_queue=trace") used
    /// when `RUST_LOG` is not set. `None` means "info".
    pub log_level: Option<String>,
}

/// Install a global fmt subscriber with an env filter.
///
/// # Errors
///
/// Returns an error if the filter directive does not parse or a global
/// subscriber was already set.
pub fn init_telemetry(config: TelemetryConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = config.log_level.as_deref().unwrap_or("info");
            EnvFilter::try_new(level)
                .map_err(|e| Error::Config(format!("bad log filter {level:?}: {e}")))?
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
        .map_err(|e| Error::Other(format!("failed to init tracing subscriber: {e}")))
}
