//! Walk through a short authentication session against the engine.
//!
//! ```text
//! cargo run --example engine_demo -- [config.toml]
//! ```

use anyhow::Context;
use otp_security::telemetry::init_tracing;
use otp_security::{
    EngineConfig, EventKind, ExternalOtpSettings, Gateway, LogAlertChannel, OtpSecurityEngine,
    Severity, StaticIdentityProvider,
};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => EngineConfig::from_env().context("loading configuration from environment")?,
    };
    init_tracing(&config.telemetry)?;

    let provider = Arc::new(StaticIdentityProvider::new(ExternalOtpSettings {
        otp_expiry_seconds: 3900,
        session_timeout_seconds: 86_400,
    }));
    let engine = Arc::new(OtpSecurityEngine::new(
        config,
        Arc::new(LogAlertChannel),
        provider,
    )?);

    for _ in 0..20 {
        engine.report_otp_generated();
    }
    for usage in [35.0, 80.0, 140.0] {
        engine.report_otp_succeeded_for("rider-12", usage);
    }
    for _ in 0..5 {
        engine.report_otp_failed_for("driver-4");
    }
    for _ in 0..6 {
        engine.report_otp_expired();
    }

    let mut details = HashMap::new();
    details.insert("ip".to_string(), serde_json::json!("203.0.113.9"));
    engine.log_event(
        EventKind::OtpReused,
        Severity::Critical,
        Some("driver-4".to_string()),
        details,
    );

    let compliance = engine.check_compliance().await;
    println!("{}", serde_json::to_string_pretty(&compliance)?);

    let gateway = Gateway::new(Arc::clone(&engine));
    let report = gateway.handle_json(r#"{"operation":"getReport"}"#).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    // Give the alert task a moment before the runtime shuts down
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    println!("alerts: {:?}", engine.alert_stats());
    Ok(())
}
