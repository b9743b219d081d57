//! # OTP Lifecycle Metrics Store
//!
//! Holds the single live [`SecurityMetrics`] instance of an engine. Every
//! mutation merges a [`MetricsUpdate`] and recomputes the derived figures
//! (expiration rate and security score) under one write lock, so readers never
//! observe counters and score out of step.

pub mod attempts;

use crate::events::EventLog;
use crate::scoring::ScoringEngine;
use crate::types::{MetricsUpdate, SecurityMetrics};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

pub use attempts::AttemptTracker;

/// Cumulative OTP counters with derived rate and score
#[derive(Debug)]
pub struct MetricsStore {
    metrics: RwLock<SecurityMetrics>,
    events: Arc<EventLog>,
    window_hours: u32,
}

impl MetricsStore {
    /// Create a store that scores against events from the last `window_hours`
    #[must_use]
    pub fn new(events: Arc<EventLog>, window_hours: u32) -> Self {
        info!(window_hours, "Metrics store initialized");
        Self {
            metrics: RwLock::new(SecurityMetrics::default()),
            events,
            window_hours,
        }
    }

    /// Merge `update` and recompute derived fields; returns the new snapshot
    pub fn update(&self, update: MetricsUpdate) -> SecurityMetrics {
        self.modify(|_| update)
    }

    /// Build an update from the current values and apply it atomically.
    ///
    /// `f` runs under the write lock, so increments computed from the current
    /// counters are never lost to a concurrent writer.
    pub fn modify<F>(&self, f: F) -> SecurityMetrics
    where
        F: FnOnce(&SecurityMetrics) -> MetricsUpdate,
    {
        let snapshot = {
            let mut metrics = self.metrics.write();
            let update = f(&metrics);
            merge(&mut metrics, update);
            // Lock order is metrics then events; the event log never reaches back here
            let recent = self.events.recent(self.window_hours);
            metrics.expiration_rate_percent = expiration_rate(&metrics);
            metrics.security_score = ScoringEngine::compute(&metrics, &recent);
            metrics.clone()
        };

        ::metrics::gauge!("otp_security_score").set(f64::from(snapshot.security_score));
        debug!(
            total_generated = snapshot.total_generated,
            expiration_rate = snapshot.expiration_rate_percent,
            score = snapshot.security_score,
            "Metrics updated"
        );
        snapshot
    }

    /// Independent copy of the current metrics
    #[must_use]
    pub fn snapshot(&self) -> SecurityMetrics {
        self.metrics.read().clone()
    }

    /// Restore the fixed defaults
    pub fn reset(&self) {
        *self.metrics.write() = SecurityMetrics::default();
        ::metrics::gauge!("otp_security_score")
            .set(f64::from(crate::types::DEFAULT_SECURITY_SCORE));
        info!("Metrics reset to defaults");
    }
}

fn merge(metrics: &mut SecurityMetrics, update: MetricsUpdate) {
    if let Some(v) = update.total_generated {
        metrics.total_generated = v;
    }
    if let Some(v) = update.total_expired {
        metrics.total_expired = v;
    }
    if let Some(v) = update.total_success {
        metrics.total_success = v;
    }
    if let Some(v) = update.total_failed {
        metrics.total_failed = v;
    }
    if let Some(v) = update.average_usage_time_seconds {
        metrics.average_usage_time_seconds = v;
    }
}

/// Capped at 100 when callers report more expirations than generations
#[allow(clippy::cast_precision_loss)]
fn expiration_rate(metrics: &SecurityMetrics) -> f64 {
    if metrics.total_generated == 0 {
        0.0
    } else {
        (100.0 * metrics.total_expired as f64 / metrics.total_generated as f64).min(100.0)
    }
}
