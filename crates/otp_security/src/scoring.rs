//! Security score computation

use crate::events::SeverityCounts;
use crate::types::{SecurityEvent, SecurityMetrics};
use serde::{Deserialize, Serialize};

const BASE_SCORE: i64 = 100;
const CRITICAL_EVENT_PENALTY: i64 = 10;
const HIGH_EVENT_PENALTY: i64 = 5;
const FAST_USAGE_SECS: f64 = 120.0;

/// Individual terms of a score. Terms are additive; only the final clamp is
/// non-linear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Deduction for the expiration rate (0, 10 or 20)
    pub expiration_penalty: i64,
    /// Deduction for the failure rate (0, 5 or 15)
    pub failure_penalty: i64,
    /// Bonus for fast code usage (0 or 5)
    pub usage_bonus: i64,
    /// Deduction for recent critical and high severity events
    pub event_penalty: i64,
    /// Clamped result
    pub score: u8,
}

/// Stateless scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Score the given metrics against events from the scoring window
    #[must_use]
    pub fn compute(metrics: &SecurityMetrics, recent_events: &[SecurityEvent]) -> u8 {
        Self::breakdown(metrics, recent_events).score
    }

    /// Score with every term exposed
    #[must_use]
    pub fn breakdown(metrics: &SecurityMetrics, recent_events: &[SecurityEvent]) -> ScoreBreakdown {
        let expiration_penalty = if metrics.expiration_rate_percent > 20.0 {
            20
        } else if metrics.expiration_rate_percent > 15.0 {
            10
        } else {
            0
        };

        let failure_rate = metrics.failure_rate_percent();
        let failure_penalty = if failure_rate > 10.0 {
            15
        } else if failure_rate > 5.0 {
            5
        } else {
            0
        };

        let usage_bonus = if metrics.average_usage_time_seconds < FAST_USAGE_SECS {
            5
        } else {
            0
        };

        let counts = SeverityCounts::of(recent_events);
        let critical = i64::try_from(counts.critical).unwrap_or(i64::MAX);
        let high = i64::try_from(counts.high).unwrap_or(i64::MAX);
        let event_penalty = critical
            .saturating_mul(CRITICAL_EVENT_PENALTY)
            .saturating_add(high.saturating_mul(HIGH_EVENT_PENALTY));

        let raw = BASE_SCORE - expiration_penalty - failure_penalty + usage_bonus;
        let clamped = raw.saturating_sub(event_penalty).clamp(0, 100);

        ScoreBreakdown {
            expiration_penalty,
            failure_penalty,
            usage_bonus,
            event_penalty,
            score: u8::try_from(clamped).unwrap_or(0),
        }
    }
}
