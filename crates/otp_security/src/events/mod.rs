//! # Security Event Log
//!
//! Bounded, append-only audit log of OTP security events.
//!
//! ## Properties
//!
//! - **Insertion order**: events are kept oldest first
//! - **Bounded retention**: once capacity is exceeded the oldest events are
//!   evicted (FIFO); appends never fail because of capacity
//! - **Unique ids**: assigned from a monotonic sequence under the write lock,
//!   so id order always matches insertion order
//! - **Alerting**: critical events are handed to the [`AlertDispatcher`] after
//!   the write lock is released

pub mod alerts;

use crate::types::{EventKind, SecurityEvent, Severity};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub use alerts::{AlertChannel, AlertDispatcher, AlertStats, LogAlertChannel};

/// Event log counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogStats {
    /// Events appended since construction
    pub appended: u64,
    /// Events evicted by the capacity bound
    pub evicted: u64,
    /// Events currently retained
    pub retained: usize,
}

/// Per-severity event counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Low severity events
    pub low: usize,
    /// Medium severity events
    pub medium: usize,
    /// High severity events
    pub high: usize,
    /// Critical severity events
    pub critical: usize,
}

impl SeverityCounts {
    /// Count events by severity
    #[must_use]
    pub fn of(events: &[SecurityEvent]) -> Self {
        events.iter().fold(Self::default(), |mut counts, event| {
            match event.severity {
                Severity::Low => counts.low += 1,
                Severity::Medium => counts.medium += 1,
                Severity::High => counts.high += 1,
                Severity::Critical => counts.critical += 1,
            }
            counts
        })
    }
}

/// Bounded security event log
#[derive(Debug)]
pub struct EventLog {
    events: RwLock<VecDeque<SecurityEvent>>,
    capacity: usize,
    next_id: AtomicU64,
    appended: AtomicU64,
    evicted: AtomicU64,
    dispatcher: Option<Arc<AlertDispatcher>>,
}

impl EventLog {
    /// Create an event log without alerting
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None)
    }

    /// Create an event log that alerts on critical events
    #[must_use]
    pub fn with_dispatcher(capacity: usize, dispatcher: Arc<AlertDispatcher>) -> Self {
        Self::build(capacity, Some(dispatcher))
    }

    fn build(capacity: usize, dispatcher: Option<Arc<AlertDispatcher>>) -> Self {
        let capacity = capacity.max(1);
        info!(capacity, "Security event log initialized");
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_id: AtomicU64::new(1),
            appended: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            dispatcher,
        }
    }

    /// Append an event and return its id
    pub fn append(
        &self,
        kind: EventKind,
        severity: Severity,
        user_id: Option<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> String {
        self.record(kind, severity, user_id, details, None)
    }

    #[cfg(test)]
    pub(crate) fn append_at(
        &self,
        kind: EventKind,
        severity: Severity,
        user_id: Option<String>,
        details: HashMap<String, serde_json::Value>,
        timestamp: DateTime<Utc>,
    ) -> String {
        self.record(kind, severity, user_id, details, Some(timestamp))
    }

    fn record(
        &self,
        kind: EventKind,
        severity: Severity,
        user_id: Option<String>,
        details: HashMap<String, serde_json::Value>,
        timestamp: Option<DateTime<Utc>>,
    ) -> String {
        let (event, evicted) = {
            let mut events = self.events.write();
            let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
            let event = SecurityEvent {
                id: format!("evt-{seq:010}"),
                kind,
                user_id,
                timestamp: timestamp.unwrap_or_else(Utc::now),
                details,
                severity,
            };
            events.push_back(event.clone());

            let mut evicted = 0_u64;
            while events.len() > self.capacity {
                events.pop_front();
                evicted += 1;
            }
            (event, evicted)
        };

        self.appended.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(
            "otp_security_events_total",
            "kind" => kind.as_str(),
            "severity" => severity.as_str()
        )
        .increment(1);
        if evicted > 0 {
            self.evicted.fetch_add(evicted, Ordering::Relaxed);
            ::metrics::counter!("otp_security_events_evicted_total").increment(evicted);
        }

        debug!(
            event_id = %event.id,
            kind = kind.as_str(),
            severity = severity.as_str(),
            "Security event recorded"
        );

        let id = event.id.clone();
        if severity == Severity::Critical {
            if let Some(dispatcher) = &self.dispatcher {
                // Delivery task is intentionally detached
                drop(dispatcher.dispatch(event));
            }
        }
        id
    }

    /// Events recorded within the last `hours_back` hours, oldest first
    #[must_use]
    pub fn recent(&self, hours_back: u32) -> Vec<SecurityEvent> {
        let cutoff = Utc::now()
            .checked_sub_signed(ChronoDuration::hours(i64::from(hours_back)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.events
            .read()
            .iter()
            .filter(|event| event.timestamp > cutoff)
            .cloned()
            .collect()
    }

    /// All retained events, oldest first
    #[must_use]
    pub fn all(&self) -> Vec<SecurityEvent> {
        self.events.read().iter().cloned().collect()
    }

    /// Retained events for one user, oldest first
    #[must_use]
    pub fn by_user(&self, user_id: &str) -> Vec<SecurityEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect()
    }

    /// Number of retained events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Drop every retained event. The id sequence keeps counting.
    pub fn clear(&self) {
        let removed = {
            let mut events = self.events.write();
            let removed = events.len();
            events.clear();
            removed
        };
        info!(removed, "Security event log cleared");
    }

    /// Counters
    #[must_use]
    pub fn stats(&self) -> EventLogStats {
        EventLogStats {
            appended: self.appended.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            retained: self.len(),
        }
    }
}
