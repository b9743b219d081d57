//! # Critical Event Alerting
//!
//! Best-effort, fire-and-forget notification of critical security events.
//! Delivery runs on a spawned task so the caller that recorded the event is
//! never blocked, and channel failures are logged and counted, never returned.

use crate::error::OtpSecurityResult;
use crate::types::{SecurityEvent, Severity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// External notification channel (pager, chat, email relay)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Deliver one alert
    async fn notify(&self, event: &SecurityEvent) -> OtpSecurityResult<()>;
}

/// Channel that writes alerts to the tracing log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertChannel;

#[async_trait]
impl AlertChannel for LogAlertChannel {
    async fn notify(&self, event: &SecurityEvent) -> OtpSecurityResult<()> {
        error!(
            event_id = %event.id,
            kind = event.kind.as_str(),
            user_id = event.user_id.as_deref().unwrap_or("-"),
            "Critical security event"
        );
        Ok(())
    }
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStats {
    /// Alerts the channel accepted
    pub dispatched: u64,
    /// Alerts the channel rejected
    pub failed: u64,
    /// Alerts dropped because no async runtime was available
    pub dropped: u64,
}

/// Dispatches critical events to an [`AlertChannel`]
pub struct AlertDispatcher {
    channel: Arc<dyn AlertChannel>,
    enabled: bool,
    dispatched: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("enabled", &self.enabled)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl AlertDispatcher {
    /// Create a dispatcher over `channel`
    #[must_use]
    pub fn new(channel: Arc<dyn AlertChannel>, enabled: bool) -> Self {
        Self {
            channel,
            enabled,
            dispatched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Dispatcher that only logs
    #[must_use]
    pub fn logging() -> Self {
        Self::new(Arc::new(LogAlertChannel), true)
    }

    /// Schedule delivery of a critical event.
    ///
    /// Returns the delivery task handle so callers that care (tests, shutdown
    /// hooks) can await it; the event log ignores it. Non-critical events and
    /// a disabled dispatcher yield `None`.
    pub fn dispatch(self: &Arc<Self>, event: SecurityEvent) -> Option<JoinHandle<()>> {
        if !self.enabled || event.severity != Severity::Critical {
            return None;
        }

        let Ok(handle) = Handle::try_current() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                event_id = %event.id,
                "No async runtime available, critical alert dropped"
            );
            return None;
        };

        let dispatcher = Arc::clone(self);
        Some(handle.spawn(async move {
            dispatcher.deliver(&event).await;
        }))
    }

    async fn deliver(&self, event: &SecurityEvent) {
        match self.channel.notify(event).await {
            Ok(()) => {
                self.dispatched.fetch_add(1, Ordering::Relaxed);
                ::metrics::counter!("otp_security_alerts_dispatched_total").increment(1);
                debug!(event_id = %event.id, "Critical alert delivered");
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                ::metrics::counter!("otp_security_alerts_failed_total").increment(1);
                error!(event_id = %event.id, error = %e, "Critical alert delivery failed");
            }
        }
    }

    /// Current delivery counters
    #[must_use]
    pub fn stats(&self) -> AlertStats {
        AlertStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
