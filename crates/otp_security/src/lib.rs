//! # OTP Security Engine
//!
//! Security policy and metrics engine for one-time-passcode authentication
//! in the dispatch platform.
//!
//! ## Features
//!
//! - **Policy validation** of proposed OTP configurations against layered thresholds
//! - **Named presets** for standard, mobile money and high security flows
//! - **Bounded audit log** of security events with time-window queries
//! - **Derived security score** from lifecycle counters and recent event severity
//! - **Reports and compliance checks** for administrative surfaces
//! - **Fire-and-forget alerting** on critical events
//!
//! ## Quick Start
//!
//! ```rust
//! use otp_security::OtpSecurityEngine;
//! use std::sync::Arc;
//!
//! let engine = Arc::new(OtpSecurityEngine::with_defaults());
//! engine.report_otp_generated();
//! engine.report_otp_succeeded(45.0);
//!
//! let report = engine.get_report();
//! assert_eq!(report.summary.total_success, 1);
//!
//! let preset = engine.get_preset("mobile_money")?;
//! assert!(engine.validate_config(&preset).is_valid);
//! # Ok::<(), otp_security::OtpSecurityError>(())
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    bad_style,
    dead_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true
)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_sign_loss)]
#![deny(clippy::let_underscore_future)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// Core modules
pub mod config;
pub mod error;
pub mod types;

// Policy and scoring
pub mod policy;
pub mod scoring;

// State
pub mod events;
pub mod store;

// Administrative surfaces
pub mod compliance;
pub mod engine;
pub mod gateway;
pub mod report;
pub mod telemetry;

pub use compliance::{ComplianceChecker, ExternalOtpSettings, IdentityProvider, StaticIdentityProvider};
pub use config::EngineConfig;
pub use engine::OtpSecurityEngine;
pub use error::{OtpSecurityError, OtpSecurityResult};
pub use events::{AlertChannel, AlertDispatcher, EventLog, LogAlertChannel};
pub use gateway::{ApiResponse, Gateway, GatewayRequest};
pub use types::{
    ComplianceResult, EventKind, OtpChannel, OtpConfig, PresetName, ReportStatus, SecurityEvent,
    SecurityMetrics, SecurityReport, Severity, ValidationResult,
};
