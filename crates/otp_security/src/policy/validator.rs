//! # OTP Configuration Validator
//!
//! Checks a proposed [`OtpConfig`] against layered policy thresholds.
//! Every rule is evaluated independently; only the hard expiry maximum
//! makes a configuration invalid, everything else is advisory.

use crate::config::PolicyConfig;
use crate::types::{OtpConfig, ValidationResult};
use tracing::debug;

/// Policy validator for OTP configurations
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator {
    policy: PolicyConfig,
}

impl ConfigValidator {
    /// Create a validator with the given thresholds
    #[must_use]
    pub const fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// Validate a configuration
    #[must_use]
    pub fn validate(&self, config: &OtpConfig) -> ValidationResult {
        let policy = &self.policy;
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let expiry = config.expiry_seconds;
        if expiry > policy.max_expiry_secs {
            errors.push(format!(
                "Expiry of {expiry}s exceeds maximum of {}s",
                policy.max_expiry_secs
            ));
        } else if expiry > policy.recommended_expiry_secs {
            warnings.push(format!(
                "Expiry of {expiry}s is above recommendation of {}s",
                policy.recommended_expiry_secs
            ));
        }

        if expiry < policy.min_expiry_secs {
            warnings.push(format!(
                "Expiry of {expiry}s is very short; users may not receive the code in time (minimum {}s)",
                policy.min_expiry_secs
            ));
        }

        let attempts = config.max_attempts;
        if attempts > policy.max_attempts_warning {
            warnings.push(format!(
                "Elevated attempt count: {attempts} attempts exceeds {} and eases brute forcing",
                policy.max_attempts_warning
            ));
        }
        if attempts < policy.min_attempts_warning {
            warnings.push(format!(
                "Attempt count of {attempts} is overly restrictive (below {})",
                policy.min_attempts_warning
            ));
        }

        if config.resend_delay_seconds < policy.min_resend_delay_secs {
            warnings.push(format!(
                "Short resend delay of {}s (below {}s) allows code flooding",
                config.resend_delay_seconds, policy.min_resend_delay_secs
            ));
        }

        debug!(
            warnings = warnings.len(),
            errors = errors.len(),
            "Validated OTP configuration"
        );

        ValidationResult {
            is_valid: errors.is_empty(),
            warnings,
            errors,
        }
    }
}

/// Validate against the default policy thresholds
#[must_use]
pub fn validate_config(config: &OtpConfig) -> ValidationResult {
    ConfigValidator::default().validate(config)
}
