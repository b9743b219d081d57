//! # OTP Security Engine
//!
//! Facade that wires the policy validator, event log, metrics store, report
//! generator and compliance checker into one explicitly constructed value.
//! Hosts build one engine per process and share it through an `Arc`.
//!
//! ## Flow
//!
//! ```text
//! auth flow ──report_*──▶ MetricsStore ──▶ ScoringEngine
//!     │                         ▲
//!     └──log_event──▶ EventLog ─┘──critical──▶ AlertDispatcher (spawned)
//!
//! admin ──get_report──▶ ReportGenerator
//!       ──check_compliance──▶ ComplianceChecker ──▶ IdentityProvider
//! ```

use crate::compliance::{ComplianceChecker, IdentityProvider, StaticIdentityProvider};
use crate::config::EngineConfig;
use crate::error::OtpSecurityResult;
use crate::events::{AlertChannel, AlertDispatcher, AlertStats, EventLog, EventLogStats};
use crate::policy::{preset_by_name, ConfigValidator};
use crate::report::ReportGenerator;
use crate::store::{AttemptTracker, MetricsStore};
use crate::types::{
    ComplianceResult, EventKind, MetricsUpdate, OtpConfig, SecurityMetrics, SecurityReport,
    Severity, ValidationResult,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Longest usage time counted toward the running average
pub const MAX_USAGE_SECS: f64 = 86_400.0;

/// OTP security policy, audit and metrics engine
#[derive(Debug)]
pub struct OtpSecurityEngine {
    config: EngineConfig,
    validator: ConfigValidator,
    events: Arc<EventLog>,
    metrics: MetricsStore,
    attempts: AttemptTracker,
    reports: ReportGenerator,
    compliance: ComplianceChecker,
    dispatcher: Arc<AlertDispatcher>,
}

impl OtpSecurityEngine {
    /// Create an engine from validated configuration and its collaborators
    ///
    /// # Errors
    ///
    /// Returns `OtpSecurityError::Configuration` if `config` fails validation
    pub fn new(
        config: EngineConfig,
        alert_channel: Arc<dyn AlertChannel>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> OtpSecurityResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, alert_channel, identity_provider))
    }

    /// Engine with default configuration, log-only alerts and a static
    /// identity provider
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::assemble(
            EngineConfig::default(),
            Arc::new(crate::events::LogAlertChannel),
            Arc::new(StaticIdentityProvider::default()),
        )
    }

    fn assemble(
        config: EngineConfig,
        alert_channel: Arc<dyn AlertChannel>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let dispatcher = Arc::new(AlertDispatcher::new(alert_channel, config.alerts.enabled));
        let events = Arc::new(EventLog::with_dispatcher(
            config.event_log.capacity,
            Arc::clone(&dispatcher),
        ));
        let metrics = MetricsStore::new(Arc::clone(&events), config.event_log.report_window_hours);
        let compliance = ComplianceChecker::new(
            identity_provider,
            config.policy.clone(),
            config.compliance_timeout(),
        );

        info!(
            event_log_capacity = config.event_log.capacity,
            alerts_enabled = config.alerts.enabled,
            attempt_threshold = config.attempts.threshold,
            "OTP security engine initialized"
        );

        Self {
            validator: ConfigValidator::new(config.policy.clone()),
            attempts: AttemptTracker::new(config.attempts.threshold),
            reports: ReportGenerator::new(config.policy.clone()),
            config,
            events,
            metrics,
            compliance,
            dispatcher,
        }
    }

    /// A code was issued
    pub fn report_otp_generated(&self) -> SecurityMetrics {
        ::metrics::counter!("otp_security_otp_generated_total").increment(1);
        self.metrics.modify(|m| MetricsUpdate {
            total_generated: Some(m.total_generated.saturating_add(1)),
            ..MetricsUpdate::default()
        })
    }

    /// A code expired unused. Also records a low severity `otp_expired` event.
    pub fn report_otp_expired(&self) -> SecurityMetrics {
        ::metrics::counter!("otp_security_otp_expired_total").increment(1);
        let snapshot = self.metrics.modify(|m| MetricsUpdate {
            total_expired: Some(m.total_expired.saturating_add(1)),
            ..MetricsUpdate::default()
        });
        self.events
            .append(EventKind::OtpExpired, Severity::Low, None, HashMap::new());
        snapshot
    }

    /// A code was verified `usage_seconds` after it was issued.
    ///
    /// Negative or non-finite durations count as zero in the running average
    /// and durations above one day count as one day.
    pub fn report_otp_succeeded(&self, usage_seconds: f64) -> SecurityMetrics {
        ::metrics::counter!("otp_security_otp_succeeded_total").increment(1);
        let usage = if usage_seconds.is_finite() {
            usage_seconds.clamp(0.0, MAX_USAGE_SECS)
        } else {
            0.0
        };

        self.metrics.modify(|m| {
            #[allow(clippy::cast_precision_loss)]
            let prior = m.total_success as f64;
            MetricsUpdate {
                total_success: Some(m.total_success.saturating_add(1)),
                average_usage_time_seconds: Some(
                    m.average_usage_time_seconds.mul_add(prior, usage) / (prior + 1.0),
                ),
                ..MetricsUpdate::default()
            }
        })
    }

    /// A verification failed
    pub fn report_otp_failed(&self) -> SecurityMetrics {
        ::metrics::counter!("otp_security_otp_failed_total").increment(1);
        self.metrics.modify(|m| MetricsUpdate {
            total_failed: Some(m.total_failed.saturating_add(1)),
            ..MetricsUpdate::default()
        })
    }

    /// A verification failed for `user_id`.
    ///
    /// Reaching the configured number of consecutive failures records a high
    /// severity `multiple_attempts` event before the counters are updated, so
    /// the returned score already reflects it.
    pub fn report_otp_failed_for(&self, user_id: &str) -> SecurityMetrics {
        if let Some(attempts) = self.attempts.record_failure(user_id) {
            let mut details = HashMap::new();
            details.insert("attempts".to_string(), serde_json::Value::from(attempts));
            self.events.append(
                EventKind::MultipleAttempts,
                Severity::High,
                Some(user_id.to_string()),
                details,
            );
        }
        self.report_otp_failed()
    }

    /// A verification succeeded for `user_id`; clears their failure streak
    pub fn report_otp_succeeded_for(&self, user_id: &str, usage_seconds: f64) -> SecurityMetrics {
        self.attempts.record_success(user_id);
        self.report_otp_succeeded(usage_seconds)
    }

    /// Record a security event and return its id. Never fails on capacity.
    pub fn log_event(
        &self,
        kind: EventKind,
        severity: Severity,
        user_id: Option<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> String {
        self.events.append(kind, severity, user_id, details)
    }

    /// Look up a preset by name
    ///
    /// # Errors
    ///
    /// Returns `InvalidPreset` for an unknown name
    pub fn get_preset(&self, name: &str) -> OtpSecurityResult<OtpConfig> {
        preset_by_name(name)
    }

    /// Validate a proposed configuration against policy
    #[must_use]
    pub fn validate_config(&self, config: &OtpConfig) -> ValidationResult {
        self.validator.validate(config)
    }

    /// Report built from the current metrics and the report window's events
    #[must_use]
    pub fn get_report(&self) -> SecurityReport {
        let recent = self.events.recent(self.config.event_log.report_window_hours);
        self.reports.generate(self.metrics.snapshot(), recent)
    }

    /// Independent copy of the current metrics
    #[must_use]
    pub fn get_metrics_snapshot(&self) -> SecurityMetrics {
        self.metrics.snapshot()
    }

    /// Clear the event log, the attempt streaks and the metrics
    pub fn reset_metrics(&self) {
        self.events.clear();
        self.attempts.clear();
        self.metrics.reset();
        info!("OTP security state reset");
    }

    /// Compare the identity provider's settings with policy
    pub async fn check_compliance(&self) -> ComplianceResult {
        debug!("Starting identity provider compliance check");
        self.compliance.check(&self.events).await
    }

    /// Compliance check abandoned when `cancel` completes
    pub async fn check_compliance_with_cancel<C>(&self, cancel: C) -> ComplianceResult
    where
        C: Future<Output = ()> + Send,
    {
        debug!("Starting cancellable identity provider compliance check");
        self.compliance.check_with_cancel(&self.events, cancel).await
    }

    /// Shared event log
    #[must_use]
    pub const fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    /// Event log counters
    #[must_use]
    pub fn event_log_stats(&self) -> EventLogStats {
        self.events.stats()
    }

    /// Alert delivery counters
    #[must_use]
    pub fn alert_stats(&self) -> AlertStats {
        self.dispatcher.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_SECURITY_SCORE;

    #[test]
    fn test_counters_increment() {
        let engine = OtpSecurityEngine::with_defaults();
        engine.report_otp_generated();
        engine.report_otp_generated();
        engine.report_otp_failed();
        let metrics = engine.report_otp_expired();
        assert_eq!(metrics.total_generated, 2);
        assert_eq!(metrics.total_failed, 1);
        assert_eq!(metrics.total_expired, 1);
        assert!((metrics.expiration_rate_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expired_records_low_event() {
        let engine = OtpSecurityEngine::with_defaults();
        engine.report_otp_expired();
        let events = engine.events().all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::OtpExpired);
        assert_eq!(events[0].severity, Severity::Low);
    }

    #[test]
    fn test_running_average_usage() {
        let engine = OtpSecurityEngine::with_defaults();
        engine.report_otp_succeeded(100.0);
        engine.report_otp_succeeded(200.0);
        let metrics = engine.report_otp_succeeded(300.0);
        assert_eq!(metrics.total_success, 3);
        assert!((metrics.average_usage_time_seconds - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_usage_counts_as_zero() {
        let engine = OtpSecurityEngine::with_defaults();
        engine.report_otp_succeeded(f64::NAN);
        let metrics = engine.report_otp_succeeded(-50.0);
        assert_eq!(metrics.total_success, 2);
        assert!(metrics.average_usage_time_seconds.abs() < f64::EPSILON);
    }

    #[test]
    fn test_oversized_usage_keeps_average_finite() {
        let engine = OtpSecurityEngine::with_defaults();
        engine.report_otp_succeeded(1e308);
        let metrics = engine.report_otp_succeeded(f64::MAX);
        assert!(metrics.average_usage_time_seconds.is_finite());
        assert!((metrics.average_usage_time_seconds - MAX_USAGE_SECS).abs() < 1e-6);

        let metrics = engine.report_otp_succeeded(0.0);
        assert!((metrics.average_usage_time_seconds - MAX_USAGE_SECS * 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_failure_streak_records_event() {
        let engine = OtpSecurityEngine::with_defaults();
        for _ in 0..4 {
            engine.report_otp_failed_for("rider-9");
        }
        assert!(engine.events().by_user("rider-9").is_empty());

        engine.report_otp_failed_for("rider-9");
        let events = engine.events().by_user("rider-9");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MultipleAttempts);
        assert_eq!(events[0].severity, Severity::High);
        assert_eq!(events[0].details["attempts"], 5);
        assert_eq!(engine.get_metrics_snapshot().total_failed, 5);
    }

    #[test]
    fn test_success_breaks_failure_streak() {
        let engine = OtpSecurityEngine::with_defaults();
        for _ in 0..4 {
            engine.report_otp_failed_for("driver-1");
        }
        engine.report_otp_succeeded_for("driver-1", 30.0);
        engine.report_otp_failed_for("driver-1");
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let engine = OtpSecurityEngine::with_defaults();
        engine.report_otp_generated();
        engine.log_event(
            EventKind::OtpReused,
            Severity::High,
            Some("u".to_string()),
            HashMap::new(),
        );
        engine.reset_metrics();
        let metrics = engine.get_metrics_snapshot();
        assert_eq!(metrics.security_score, DEFAULT_SECURITY_SCORE);
        assert_eq!(metrics.total_generated, 0);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.event_log.capacity = 0;
        let result = OtpSecurityEngine::new(
            config,
            Arc::new(crate::events::LogAlertChannel),
            Arc::new(StaticIdentityProvider::default()),
        );
        assert!(result.is_err());
    }
}
