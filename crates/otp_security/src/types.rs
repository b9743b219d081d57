//! Core types for OTP security operations

use crate::error::{OtpSecurityError, OtpSecurityResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Security score assigned after an administrative reset
pub const DEFAULT_SECURITY_SCORE: u8 = 85;

/// Delivery channel for a one-time passcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpChannel {
    /// Email delivery
    Email,
    /// SMS delivery
    Sms,
    /// Voice call delivery
    Phone,
}

/// OTP delivery configuration proposed by a caller or produced by a preset.
///
/// Values are plain seconds/counts. A configuration is never mutated after it
/// is created; the validator only reads it.
///
/// # Examples
///
/// ```rust
/// use otp_security::types::{OtpChannel, OtpConfig};
///
/// let config = OtpConfig::new(600, 5, 60, OtpChannel::Email)?;
/// assert_eq!(config.expiry_seconds, 600);
/// # Ok::<(), otp_security::error::OtpSecurityError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpConfig {
    /// Code validity in seconds
    pub expiry_seconds: u32,
    /// Verification attempts allowed per code
    pub max_attempts: u32,
    /// Minimum delay before a new code may be requested
    pub resend_delay_seconds: u32,
    /// Delivery channel
    pub channel: OtpChannel,
}

impl OtpConfig {
    /// Create a configuration, enforcing the structural invariants
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `expiry_seconds` is zero or `max_attempts` is zero
    pub fn new(
        expiry_seconds: u32,
        max_attempts: u32,
        resend_delay_seconds: u32,
        channel: OtpChannel,
    ) -> OtpSecurityResult<Self> {
        let config = Self {
            expiry_seconds,
            max_attempts,
            resend_delay_seconds,
            channel,
        };
        config.check_invariants()?;
        Ok(config)
    }

    /// Check the structural invariants of a configuration built field by field
    ///
    /// # Errors
    ///
    /// Returns `Configuration` naming the offending field
    pub fn check_invariants(&self) -> OtpSecurityResult<()> {
        if self.expiry_seconds == 0 {
            return Err(OtpSecurityError::configuration(
                "expiry_seconds",
                "Expiry must be greater than zero",
            ));
        }
        if self.max_attempts == 0 {
            return Err(OtpSecurityError::configuration(
                "max_attempts",
                "At least one attempt must be allowed",
            ));
        }
        Ok(())
    }
}

/// Named preset configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetName {
    /// General purpose login codes
    Standard,
    /// Mobile money transaction confirmation
    MobileMoney,
    /// Sensitive administrative operations
    HighSecurity,
}

impl PresetName {
    /// Wire name of the preset
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::MobileMoney => "mobile_money",
            Self::HighSecurity => "high_security",
        }
    }
}

impl FromStr for PresetName {
    type Err = OtpSecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "mobile_money" => Ok(Self::MobileMoney),
            "high_security" => Ok(Self::HighSecurity),
            other => Err(OtpSecurityError::InvalidPreset {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating an [`OtpConfig`] against policy thresholds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when no hard threshold was violated
    pub is_valid: bool,
    /// Advisory findings; never affect `is_valid`
    pub warnings: Vec<String>,
    /// Hard threshold violations
    pub errors: Vec<String>,
}

/// Kind of a recorded security event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A code expired without being used
    OtpExpired,
    /// A code was presented more than once
    OtpReused,
    /// Repeated failed verification attempts
    MultipleAttempts,
    /// Anything else worth auditing, including compliance checks
    SuspiciousActivity,
}

impl EventKind {
    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OtpExpired => "otp_expired",
            Self::OtpReused => "otp_reused",
            Self::MultipleAttempts => "multiple_attempts",
            Self::SuspiciousActivity => "suspicious_activity",
        }
    }
}

/// Event severity. Ordering is `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational
    Low,
    /// Worth a look
    Medium,
    /// Lowers the security score
    High,
    /// Lowers the score and triggers an alert
    Critical,
}

impl Severity {
    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Immutable audit record owned by the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    /// Unique identifier
    pub id: String,
    /// Event kind
    pub kind: EventKind,
    /// User the event relates to, if any
    pub user_id: Option<String>,
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Free-form context
    pub details: HashMap<String, serde_json::Value>,
    /// Severity
    pub severity: Severity,
}

/// Cumulative OTP lifecycle counters and derived figures.
///
/// `expiration_rate_percent` is always `100 * total_expired / total_generated`
/// (zero when nothing was generated) and `security_score` is always the
/// scorer's output for the current counters; both are recomputed by the
/// metrics store on every update and are never set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMetrics {
    /// Codes issued
    pub total_generated: u64,
    /// Codes that expired unused
    pub total_expired: u64,
    /// Successful verifications
    pub total_success: u64,
    /// Failed verifications
    pub total_failed: u64,
    /// Mean seconds between issue and successful use
    pub average_usage_time_seconds: f64,
    /// Share of generated codes that expired, in percent
    pub expiration_rate_percent: f64,
    /// Derived 0-100 posture score
    pub security_score: u8,
}

impl Default for SecurityMetrics {
    fn default() -> Self {
        Self {
            total_generated: 0,
            total_expired: 0,
            total_success: 0,
            total_failed: 0,
            average_usage_time_seconds: 0.0,
            expiration_rate_percent: 0.0,
            security_score: DEFAULT_SECURITY_SCORE,
        }
    }
}

impl SecurityMetrics {
    /// Failed verifications as a percentage of generated codes
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn failure_rate_percent(&self) -> f64 {
        if self.total_generated == 0 {
            0.0
        } else {
            100.0 * self.total_failed as f64 / self.total_generated as f64
        }
    }
}

/// Partial update merged into the stored metrics.
///
/// Only input fields can be supplied; derived fields are recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsUpdate {
    /// New value for `total_generated`
    pub total_generated: Option<u64>,
    /// New value for `total_expired`
    pub total_expired: Option<u64>,
    /// New value for `total_success`
    pub total_success: Option<u64>,
    /// New value for `total_failed`
    pub total_failed: Option<u64>,
    /// New value for `average_usage_time_seconds`
    pub average_usage_time_seconds: Option<f64>,
}

/// Overall report status. Ordering is `Secure < Warning < Critical`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// No findings
    #[default]
    Secure,
    /// Findings that need review
    Warning,
    /// Findings that need action
    Critical,
}

impl ReportStatus {
    /// Raise the status to `other` if it is more severe; never lowers it
    pub fn escalate(&mut self, other: Self) {
        if other > *self {
            *self = other;
        }
    }
}

/// Point-in-time security report for administrative surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    /// Metrics snapshot the report was built from
    pub summary: SecurityMetrics,
    /// Events inside the report window, oldest first
    pub recent_events: Vec<SecurityEvent>,
    /// Recommendations in rule order
    pub recommendations: Vec<String>,
    /// Most severe status raised by any rule
    pub status: ReportStatus,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
}

/// Result of comparing the identity provider's live settings to policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    /// True when no issue was found
    pub is_compliant: bool,
    /// Policy violations
    pub issues: Vec<String>,
    /// Remediations and advisories
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_config_invariants() {
        assert!(OtpConfig::new(600, 5, 60, OtpChannel::Email).is_ok());
        assert!(matches!(
            OtpConfig::new(0, 5, 60, OtpChannel::Email),
            Err(OtpSecurityError::Configuration { .. })
        ));
        assert!(matches!(
            OtpConfig::new(600, 0, 60, OtpChannel::Sms),
            Err(OtpSecurityError::Configuration { .. })
        ));
    }

    #[test]
    fn test_preset_name_parsing() {
        assert_eq!("mobile_money".parse::<PresetName>(), Ok(PresetName::MobileMoney));
        assert_eq!(
            "premium".parse::<PresetName>(),
            Err(OtpSecurityError::InvalidPreset {
                name: "premium".to_string()
            })
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_report_status_never_lowers() {
        let mut status = ReportStatus::Secure;
        status.escalate(ReportStatus::Critical);
        status.escalate(ReportStatus::Warning);
        assert_eq!(status, ReportStatus::Critical);
    }

    #[test]
    fn test_default_metrics() {
        let metrics = SecurityMetrics::default();
        assert_eq!(metrics.security_score, DEFAULT_SECURITY_SCORE);
        assert_eq!(metrics.total_generated, 0);
        assert!(metrics.failure_rate_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_serializes_camel_case() -> Result<(), serde_json::Error> {
        let config = OtpConfig {
            expiry_seconds: 300,
            max_attempts: 3,
            resend_delay_seconds: 90,
            channel: OtpChannel::Sms,
        };
        let json = serde_json::to_value(config)?;
        assert_eq!(json["expirySeconds"], 300);
        assert_eq!(json["channel"], "sms");
        Ok(())
    }
}
