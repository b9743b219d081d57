//! Error types for OTP security engine operations

use thiserror::Error;

/// Result type for OTP security engine operations
pub type OtpSecurityResult<T> = Result<T, OtpSecurityError>;

/// Main error type for OTP security engine operations
///
/// Policy violations found by the validator are not errors: they are reported
/// inside [`crate::types::ValidationResult`]. This type covers the failures a
/// caller can actually act on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpSecurityError {
    /// Requested preset does not exist
    #[error("Invalid preset: '{name}'")]
    InvalidPreset {
        /// Preset name that was requested
        name: String,
    },

    /// Configuration errors
    #[error("Configuration error: {field} - {reason}")]
    Configuration {
        /// Configuration field that failed
        field: String,
        /// Error description
        reason: String,
    },

    /// External identity provider could not be read
    #[error("Compliance source error: {reason}")]
    ComplianceSource {
        /// Error description
        reason: String,
    },

    /// Timeout errors
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// Operation cancelled by the caller
    #[error("Operation cancelled: {operation}")]
    Cancelled {
        /// Operation that was cancelled
        operation: String,
    },

    /// Alert channel rejected a notification
    #[error("Alert dispatch failed: {reason}")]
    AlertDispatch {
        /// Error description
        reason: String,
    },

    /// Serialization errors
    #[error("Serialization error: {reason}")]
    Serialization {
        /// Error description
        reason: String,
    },

    /// Gateway received an operation it does not know
    #[error("Unknown operation: {operation}")]
    UnknownOperation {
        /// Operation name
        operation: String,
    },
}

impl OtpSecurityError {
    /// Create a configuration error
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the external source could not be consulted
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::ComplianceSource { .. } | Self::Timeout { .. } | Self::Cancelled { .. }
        )
    }
}

impl From<serde_json::Error> for OtpSecurityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

impl From<::config::ConfigError> for OtpSecurityError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Configuration {
            field: "config_source".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for OtpSecurityError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration {
            field: "toml_parsing".to_string(),
            reason: err.to_string(),
        }
    }
}
