//! Tracing subscriber setup for hosts that embed the engine

use crate::config::TelemetryConfig;
use crate::error::{OtpSecurityError, OtpSecurityResult};
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this twice in one
/// process returns a `Configuration` error rather than replacing the
/// subscriber that is already installed.
///
/// # Errors
///
/// Returns `OtpSecurityError::Configuration` if the filter directive is
/// malformed or a global subscriber is already set
pub fn init_tracing(config: &TelemetryConfig) -> OtpSecurityResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| OtpSecurityError::configuration("telemetry.level", e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| OtpSecurityError::configuration("telemetry", e.to_string()))
}
