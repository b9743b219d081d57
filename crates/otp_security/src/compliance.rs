//! # Identity Provider Compliance
//!
//! Compares the live OTP settings of the external identity provider with the
//! engine's policy. The provider is an abstract collaborator: the engine only
//! needs something that can answer [`IdentityProvider::fetch_settings`].
//!
//! Every check records exactly one `suspicious_activity` audit event. A
//! provider that fails, times out or is cancelled yields a non-compliant
//! result instead of an error.

use crate::config::PolicyConfig;
use crate::error::{OtpSecurityError, OtpSecurityResult};
use crate::events::EventLog;
use crate::types::{ComplianceResult, EventKind, Severity};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Sole issue reported when the provider cannot be consulted
pub const UNVERIFIED_ISSUE: &str = "Unable to verify configuration";

const OPERATION: &str = "compliance_check";

/// OTP-related settings reported by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalOtpSettings {
    /// OTP validity in seconds
    pub otp_expiry_seconds: u64,
    /// Authenticated session lifetime in seconds
    pub session_timeout_seconds: u64,
}

/// Source of the identity provider's live configuration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Retrieve the current settings
    async fn fetch_settings(&self) -> OtpSecurityResult<ExternalOtpSettings>;
}

/// In-process provider returning configured settings.
///
/// Stands in for the real identity provider in tests, demos and hosts that
/// mirror the provider configuration locally. Latency and outages can be
/// simulated.
#[derive(Debug)]
pub struct StaticIdentityProvider {
    settings: RwLock<ExternalOtpSettings>,
    latency: Duration,
    unreachable: AtomicBool,
}

impl StaticIdentityProvider {
    /// Provider that answers immediately with `settings`
    #[must_use]
    pub fn new(settings: ExternalOtpSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            latency: Duration::ZERO,
            unreachable: AtomicBool::new(false),
        }
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replace the reported settings
    pub fn set_settings(&self, settings: ExternalOtpSettings) {
        *self.settings.write() = settings;
    }

    /// Simulate an outage
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }
}

impl Default for StaticIdentityProvider {
    fn default() -> Self {
        Self::new(ExternalOtpSettings {
            otp_expiry_seconds: 600,
            session_timeout_seconds: 3600,
        })
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn fetch_settings(&self) -> OtpSecurityResult<ExternalOtpSettings> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(OtpSecurityError::ComplianceSource {
                reason: "identity provider unreachable".to_string(),
            });
        }
        Ok(*self.settings.read())
    }
}

/// Checks identity provider settings against policy
pub struct ComplianceChecker {
    provider: Arc<dyn IdentityProvider>,
    policy: PolicyConfig,
    timeout: Duration,
}

impl std::fmt::Debug for ComplianceChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceChecker")
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ComplianceChecker {
    /// Create a checker
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, policy: PolicyConfig, timeout: Duration) -> Self {
        Self {
            provider,
            policy,
            timeout,
        }
    }

    /// Run a check and record its audit event in `events`
    pub async fn check(&self, events: &EventLog) -> ComplianceResult {
        self.check_with_cancel(events, std::future::pending::<()>())
            .await
    }

    /// Run a check that is abandoned as soon as `cancel` completes
    pub async fn check_with_cancel<C>(&self, events: &EventLog, cancel: C) -> ComplianceResult
    where
        C: Future<Output = ()> + Send,
    {
        let mut details = HashMap::new();
        let (result, outcome) = match self.fetch(cancel).await {
            Ok(settings) => {
                details.insert(
                    "otpExpirySeconds".to_string(),
                    serde_json::Value::from(settings.otp_expiry_seconds),
                );
                details.insert(
                    "sessionTimeoutSeconds".to_string(),
                    serde_json::Value::from(settings.session_timeout_seconds),
                );
                let result = self.evaluate(&settings);
                let outcome = if result.is_compliant {
                    "compliant"
                } else {
                    "non_compliant"
                };
                (result, outcome)
            }
            Err(e) => {
                warn!(error = %e, "Identity provider compliance check could not complete");
                details.insert("error".to_string(), serde_json::Value::from(e.to_string()));
                let outcome = if e.is_unreachable() {
                    "unreachable"
                } else {
                    "source_error"
                };
                (unverified(), outcome)
            }
        };

        let severity = if result.issues.is_empty() {
            Severity::Low
        } else {
            Severity::High
        };
        details.insert("check".to_string(), serde_json::Value::from("compliance"));
        details.insert(
            "isCompliant".to_string(),
            serde_json::Value::from(result.is_compliant),
        );
        details.insert(
            "issues".to_string(),
            serde_json::Value::from(result.issues.clone()),
        );
        events.append(EventKind::SuspiciousActivity, severity, None, details);

        ::metrics::counter!("otp_security_compliance_checks_total", "outcome" => outcome)
            .increment(1);
        if result.is_compliant {
            info!("Identity provider configuration is compliant");
        } else {
            warn!(
                issues = result.issues.len(),
                outcome, "Identity provider configuration is not compliant"
            );
        }
        result
    }

    async fn fetch<C>(&self, cancel: C) -> OtpSecurityResult<ExternalOtpSettings>
    where
        C: Future<Output = ()> + Send,
    {
        tokio::select! {
            fetched = tokio::time::timeout(self.timeout, self.provider.fetch_settings()) => {
                fetched.unwrap_or_else(|_| {
                    Err(OtpSecurityError::Timeout {
                        operation: OPERATION.to_string(),
                        duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    })
                })
            }
            () = cancel => Err(OtpSecurityError::Cancelled {
                operation: OPERATION.to_string(),
            }),
        }
    }

    /// Compare settings with policy without side effects
    #[must_use]
    pub fn evaluate(&self, settings: &ExternalOtpSettings) -> ComplianceResult {
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let max_expiry = u64::from(self.policy.max_expiry_secs);

        if settings.otp_expiry_seconds > max_expiry {
            issues.push(format!(
                "Identity provider OTP expiry of {}s exceeds maximum of {max_expiry}s",
                settings.otp_expiry_seconds
            ));
            recommendations.push(format!(
                "Reduce the identity provider OTP expiry to at most {max_expiry}s"
            ));
        }

        if settings.session_timeout_seconds > self.policy.session_timeout_warning_secs {
            recommendations.push(format!(
                "Session timeout of {}s is longer than {}s; consider shortening it",
                settings.session_timeout_seconds, self.policy.session_timeout_warning_secs
            ));
        }

        ComplianceResult {
            is_compliant: issues.is_empty(),
            issues,
            recommendations,
        }
    }
}

fn unverified() -> ComplianceResult {
    ComplianceResult {
        is_compliant: false,
        issues: vec![UNVERIFIED_ISSUE.to_string()],
        recommendations: vec![
            "Check connectivity to the identity provider and retry the compliance check"
                .to_string(),
        ],
    }
}
