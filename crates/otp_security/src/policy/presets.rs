//! Named OTP configuration presets

use crate::error::OtpSecurityResult;
use crate::types::{OtpChannel, OtpConfig, PresetName};

/// Look up a preset configuration
#[must_use]
pub const fn preset(name: PresetName) -> OtpConfig {
    match name {
        PresetName::Standard => OtpConfig {
            expiry_seconds: 600,
            max_attempts: 5,
            resend_delay_seconds: 60,
            channel: OtpChannel::Email,
        },
        // Short-lived SMS codes for transaction confirmation
        PresetName::MobileMoney => OtpConfig {
            expiry_seconds: 300,
            max_attempts: 3,
            resend_delay_seconds: 90,
            channel: OtpChannel::Sms,
        },
        PresetName::HighSecurity => OtpConfig {
            expiry_seconds: 300,
            max_attempts: 3,
            resend_delay_seconds: 120,
            channel: OtpChannel::Phone,
        },
    }
}

/// Look up a preset by its wire name
///
/// # Errors
///
/// Returns `InvalidPreset` for an unknown name
pub fn preset_by_name(name: &str) -> OtpSecurityResult<OtpConfig> {
    Ok(preset(name.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OtpSecurityError;
    use crate::policy::validate_config;

    #[test]
    fn test_mobile_money_preset() {
        assert_eq!(
            preset(PresetName::MobileMoney),
            OtpConfig {
                expiry_seconds: 300,
                max_attempts: 3,
                resend_delay_seconds: 90,
                channel: OtpChannel::Sms,
            }
        );
    }

    #[test]
    fn test_preset_by_name() -> OtpSecurityResult<()> {
        assert_eq!(preset_by_name("standard")?.channel, OtpChannel::Email);
        assert_eq!(preset_by_name("high_security")?.resend_delay_seconds, 120);
        assert!(matches!(
            preset_by_name("legacy"),
            Err(OtpSecurityError::InvalidPreset { name }) if name == "legacy"
        ));
        Ok(())
    }

    #[test]
    fn test_presets_pass_policy() {
        for name in [
            PresetName::Standard,
            PresetName::MobileMoney,
            PresetName::HighSecurity,
        ] {
            let result = validate_config(&preset(name));
            assert!(result.is_valid, "{name} should be valid");
            assert!(result.errors.is_empty());
        }
    }
}
