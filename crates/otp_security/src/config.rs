//! Configuration management for the OTP security engine

use crate::error::{OtpSecurityError, OtpSecurityResult};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shortest expiry that does not draw a warning, in seconds
pub const MIN_EXPIRY_SECS: u32 = 300;
/// Recommended upper bound for expiry, in seconds
pub const RECOMMENDED_EXPIRY_SECS: u32 = 600;
/// Hard maximum expiry, in seconds
pub const MAX_EXPIRY_SECS: u32 = 3600;
/// Identity provider session timeout above which a recommendation is raised (12h)
pub const SESSION_TIMEOUT_WARNING_SECS: u64 = 43_200;
/// Default event log capacity
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1000;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "OTP_SECURITY";

/// Root configuration for the OTP security engine.
///
/// # Configuration Hierarchy
///
/// ```text
/// EngineConfig
/// ├── policy: PolicyConfig (validator and report thresholds)
/// ├── event_log: EventLogConfig (retention and report window)
/// ├── compliance: ComplianceConfig (identity provider check)
/// ├── alerts: AlertConfig (critical event notification)
/// ├── attempts: AttemptTrackingConfig (per-user failure tracking)
/// └── telemetry: TelemetryConfig (tracing subscriber)
/// ```
///
/// # Loading Configuration
///
/// [`EngineConfig::load`] layers built-in defaults, a TOML or JSON file and
/// `OTP_SECURITY__SECTION__KEY` environment variables, then validates the
/// result. Programmatic construction starts from `EngineConfig::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy thresholds
    #[garde(dive)]
    pub policy: PolicyConfig,
    /// Event log settings
    #[garde(dive)]
    pub event_log: EventLogConfig,
    /// Compliance check settings
    #[garde(dive)]
    pub compliance: ComplianceConfig,
    /// Alert settings
    #[garde(skip)]
    pub alerts: AlertConfig,
    /// Per-user attempt tracking
    #[garde(dive)]
    pub attempts: AttemptTrackingConfig,
    /// Tracing subscriber settings
    #[garde(dive)]
    pub telemetry: TelemetryConfig,
}

/// Thresholds used by the validator, the report generator and the
/// compliance checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PolicyConfig {
    /// Expiry below this draws a "very short" warning
    #[garde(range(min = 1))]
    pub min_expiry_secs: u32,
    /// Expiry above this draws an "above recommendation" warning
    #[garde(range(min = 1))]
    pub recommended_expiry_secs: u32,
    /// Expiry above this is a hard error
    #[garde(range(min = 1, max = 86_400))]
    pub max_expiry_secs: u32,
    /// Attempt counts above this draw a warning
    #[garde(range(min = 1, max = 100))]
    pub max_attempts_warning: u32,
    /// Attempt counts below this draw a warning
    #[garde(range(min = 1, max = 100))]
    pub min_attempts_warning: u32,
    /// Resend delays below this draw a warning
    #[garde(range(max = 3600))]
    pub min_resend_delay_secs: u32,
    /// Identity provider session timeouts above this draw a recommendation
    #[garde(range(min = 60))]
    pub session_timeout_warning_secs: u64,
    /// Expiration rate (percent) above which the report raises a warning
    #[garde(range(min = 0.0, max = 100.0))]
    pub report_expiration_rate_threshold: f64,
    /// Score below which the report turns critical
    #[garde(range(max = 100))]
    pub report_min_score: u8,
    /// Average usage time (seconds) above which the report suggests a shorter expiry
    #[garde(range(min = 0.0))]
    pub report_slow_usage_secs: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_expiry_secs: MIN_EXPIRY_SECS,
            recommended_expiry_secs: RECOMMENDED_EXPIRY_SECS,
            max_expiry_secs: MAX_EXPIRY_SECS,
            max_attempts_warning: 5,
            min_attempts_warning: 3,
            min_resend_delay_secs: 60,
            session_timeout_warning_secs: SESSION_TIMEOUT_WARNING_SECS,
            report_expiration_rate_threshold: 20.0,
            report_min_score: 70,
            report_slow_usage_secs: 480.0,
        }
    }
}

/// Event log retention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EventLogConfig {
    /// Maximum retained events; oldest are evicted first
    #[garde(range(min = 1, max = 1_000_000))]
    pub capacity: usize,
    /// Window used for scoring and reports, in hours
    #[garde(range(min = 1, max = 720))]
    pub report_window_hours: u32,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_LOG_CAPACITY,
            report_window_hours: 24,
        }
    }
}

/// Identity provider compliance check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Retrieval timeout in milliseconds
    #[garde(range(min = 1, max = 60_000))]
    pub timeout_ms: u64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// Critical event alerting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Dispatch critical events to the alert channel
    pub enabled: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Per-user failed attempt tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AttemptTrackingConfig {
    /// Consecutive failures that produce a `multiple_attempts` event
    #[garde(range(min = 1, max = 1000))]
    pub threshold: u32,
}

impl Default for AttemptTrackingConfig {
    fn default() -> Self {
        Self { threshold: 5 }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[garde(length(min = 1, max = 256))]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[garde(skip)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults, a file and the environment
    ///
    /// # Errors
    ///
    /// Returns `OtpSecurityError::Configuration` if:
    /// - The file cannot be read or parsed
    /// - An environment override has the wrong type
    /// - Validation fails
    pub fn load(path: impl Into<PathBuf>) -> OtpSecurityResult<Self> {
        let path = path.into();
        let defaults = ::config::Config::try_from(&Self::default())?;

        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::from(path.as_path()))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the environment only
    ///
    /// # Errors
    ///
    /// Returns `OtpSecurityError::Configuration` on bad overrides or failed validation
    pub fn from_env() -> OtpSecurityResult<Self> {
        let defaults = ::config::Config::try_from(&Self::default())?;

        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns `OtpSecurityError::Configuration` on parse or validation failure
    pub fn from_toml_str(content: &str) -> OtpSecurityResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file without environment overrides
    ///
    /// # Errors
    ///
    /// Returns `OtpSecurityError::Configuration` if the file cannot be read or is invalid
    pub fn from_toml_file(path: &Path) -> OtpSecurityResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OtpSecurityError::configuration(
                "config_file",
                format!("Failed to read config file {}: {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `OtpSecurityError::Configuration` if any value is out of range
    /// or the expiry thresholds are not strictly increasing
    pub fn validate(&self) -> OtpSecurityResult<()> {
        garde::Validate::validate(self, &())
            .map_err(|e| OtpSecurityError::configuration("validation", e.to_string()))?;

        let policy = &self.policy;
        if policy.min_expiry_secs >= policy.recommended_expiry_secs
            || policy.recommended_expiry_secs >= policy.max_expiry_secs
        {
            return Err(OtpSecurityError::configuration(
                "policy",
                format!(
                    "Expiry thresholds must increase: min {} < recommended {} < max {}",
                    policy.min_expiry_secs,
                    policy.recommended_expiry_secs,
                    policy.max_expiry_secs
                ),
            ));
        }

        if policy.min_attempts_warning > policy.max_attempts_warning {
            return Err(OtpSecurityError::configuration(
                "policy",
                "min_attempts_warning cannot exceed max_attempts_warning",
            ));
        }

        Ok(())
    }

    /// Compliance retrieval timeout
    #[must_use]
    pub const fn compliance_timeout(&self) -> Duration {
        Duration::from_millis(self.compliance.timeout_ms)
    }
}
