//! Security report generation

use crate::config::PolicyConfig;
use crate::events::SeverityCounts;
use crate::types::{ReportStatus, SecurityEvent, SecurityMetrics, SecurityReport};
use chrono::Utc;
use tracing::debug;

/// Recommendation used when no rule fires
pub const OPTIMAL_RECOMMENDATION: &str = "Security configuration is optimal";

/// Composes metrics and recent events into a [`SecurityReport`].
///
/// Rules are evaluated in a fixed order and each may add one recommendation.
/// The status is the most severe status raised by any rule.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    policy: PolicyConfig,
}

impl ReportGenerator {
    /// Create a generator using the given thresholds
    #[must_use]
    pub const fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// Build a report from a metrics snapshot and the events in the report window
    #[must_use]
    pub fn generate(
        &self,
        summary: SecurityMetrics,
        recent_events: Vec<SecurityEvent>,
    ) -> SecurityReport {
        let mut recommendations = Vec::new();
        let mut status = ReportStatus::Secure;

        if summary.expiration_rate_percent > self.policy.report_expiration_rate_threshold {
            recommendations.push(format!(
                "Expiration rate of {:.1}% is high; review the OTP validity period",
                summary.expiration_rate_percent
            ));
            status.escalate(ReportStatus::Warning);
        }

        if summary.security_score < self.policy.report_min_score {
            recommendations.push(format!(
                "Security score of {} is below {}; revise the authentication configuration",
                summary.security_score, self.policy.report_min_score
            ));
            status.escalate(ReportStatus::Critical);
        }

        let critical = SeverityCounts::of(&recent_events).critical;
        if critical > 0 {
            recommendations.push(format!(
                "Investigate {critical} critical security event(s) from the report window"
            ));
            status.escalate(ReportStatus::Critical);
        }

        if summary.average_usage_time_seconds > self.policy.report_slow_usage_secs {
            recommendations.push(format!(
                "Average usage time of {:.0}s is long; consider reducing the OTP expiry",
                summary.average_usage_time_seconds
            ));
        }

        if recommendations.is_empty() {
            recommendations.push(OPTIMAL_RECOMMENDATION.to_string());
        }

        debug!(
            status = ?status,
            recommendations = recommendations.len(),
            events = recent_events.len(),
            "Security report generated"
        );

        SecurityReport {
            summary,
            recent_events,
            recommendations,
            status,
            generated_at: Utc::now(),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}
