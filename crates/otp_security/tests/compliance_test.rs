//! Compliance Check Integration Tests

use otp_security::compliance::UNVERIFIED_ISSUE;
use otp_security::{
    EngineConfig, EventKind, ExternalOtpSettings, LogAlertChannel, OtpSecurityEngine,
    OtpSecurityResult, Severity, StaticIdentityProvider,
};
use std::sync::Arc;
use std::time::Duration;

fn engine_with(
    provider: Arc<StaticIdentityProvider>,
    timeout_ms: u64,
) -> OtpSecurityResult<OtpSecurityEngine> {
    let mut config = EngineConfig::default();
    config.compliance.timeout_ms = timeout_ms;
    OtpSecurityEngine::new(config, Arc::new(LogAlertChannel), provider)
}

fn suspicious_events(engine: &OtpSecurityEngine) -> Vec<Severity> {
    engine
        .events()
        .all()
        .into_iter()
        .filter(|e| e.kind == EventKind::SuspiciousActivity)
        .map(|e| e.severity)
        .collect()
}

#[tokio::test]
async fn test_long_external_expiry_is_non_compliant() -> OtpSecurityResult<()> {
    let provider = Arc::new(StaticIdentityProvider::new(ExternalOtpSettings {
        otp_expiry_seconds: 3900,
        session_timeout_seconds: 3600,
    }));
    let engine = engine_with(provider, 1000)?;

    let result = engine.check_compliance().await;
    assert!(!result.is_compliant);
    assert!(!result.issues.is_empty());
    assert_eq!(suspicious_events(&engine), vec![Severity::High]);
    Ok(())
}

#[tokio::test]
async fn test_compliant_provider_logs_low_event() -> OtpSecurityResult<()> {
    let engine = engine_with(Arc::new(StaticIdentityProvider::default()), 1000)?;
    let result = engine.check_compliance().await;
    assert!(result.is_compliant);
    assert!(result.issues.is_empty());
    assert_eq!(suspicious_events(&engine), vec![Severity::Low]);
    Ok(())
}

#[tokio::test]
async fn test_outage_degrades_to_unverified() -> OtpSecurityResult<()> {
    let provider = Arc::new(StaticIdentityProvider::default());
    provider.set_unreachable(true);
    let engine = engine_with(provider, 1000)?;

    let result = engine.check_compliance().await;
    assert!(!result.is_compliant);
    assert_eq!(result.issues, vec![UNVERIFIED_ISSUE.to_string()]);
    assert_eq!(suspicious_events(&engine).len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timeout_degrades_to_unverified() -> OtpSecurityResult<()> {
    let provider =
        Arc::new(StaticIdentityProvider::default().with_latency(Duration::from_secs(10)));
    let engine = engine_with(provider, 50)?;

    let result = engine.check_compliance().await;
    assert!(!result.is_compliant);
    assert_eq!(result.issues, vec![UNVERIFIED_ISSUE.to_string()]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_degrades_to_unverified() -> OtpSecurityResult<()> {
    let provider =
        Arc::new(StaticIdentityProvider::default().with_latency(Duration::from_secs(10)));
    let engine = engine_with(provider, 30_000)?;

    let result = engine
        .check_compliance_with_cancel(tokio::time::sleep(Duration::from_millis(20)))
        .await;
    assert!(!result.is_compliant);
    assert_eq!(result.issues, vec![UNVERIFIED_ISSUE.to_string()]);
    assert_eq!(suspicious_events(&engine), vec![Severity::High]);
    Ok(())
}

#[tokio::test]
async fn test_each_check_logs_one_event() -> OtpSecurityResult<()> {
    let engine = engine_with(Arc::new(StaticIdentityProvider::default()), 1000)?;
    for _ in 0..3 {
        engine.check_compliance().await;
    }
    assert_eq!(engine.events().len(), 3);
    assert_eq!(engine.event_log_stats().appended, 3);
    Ok(())
}
