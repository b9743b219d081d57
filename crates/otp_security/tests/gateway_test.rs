//! Gateway Integration Tests

#![allow(clippy::unwrap_used)]

use otp_security::{Gateway, GatewayRequest, OtpSecurityEngine};
use serde_json::json;
use std::sync::Arc;

fn gateway() -> Gateway {
    Gateway::new(Arc::new(OtpSecurityEngine::with_defaults()))
}

#[tokio::test]
async fn test_lifecycle_over_json() {
    let gateway = gateway();

    let response = gateway
        .handle_json(r#"{"operation":"reportOtpGenerated"}"#)
        .await;
    assert!(response.success);
    assert_eq!(response.data.unwrap()["totalGenerated"], 1);

    let response = gateway
        .handle_json(r#"{"operation":"reportOtpSucceeded","usageSeconds":30.0}"#)
        .await;
    assert!(response.success);
    assert_eq!(response.data.unwrap()["totalSuccess"], 1);

    let response = gateway
        .handle_json(r#"{"operation":"getMetricsSnapshot"}"#)
        .await;
    let data = response.data.unwrap();
    assert_eq!(data["totalGenerated"], 1);
    assert_eq!(data["averageUsageTimeSeconds"], 30.0);
}

#[tokio::test]
async fn test_log_event_returns_id() {
    let gateway = gateway();
    let response = gateway
        .handle(GatewayRequest::LogEvent {
            kind: otp_security::EventKind::OtpReused,
            severity: otp_security::Severity::Medium,
            user_id: Some("rider-5".to_string()),
            details: std::collections::HashMap::new(),
        })
        .await;
    assert!(response.success);
    assert!(response.data.unwrap()["id"].as_str().is_some());

    let report = gateway.handle(GatewayRequest::GetReport).await;
    assert_eq!(report.data.unwrap()["recentEvents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_preset_and_validation() {
    let gateway = gateway();
    let response = gateway
        .handle_json(r#"{"operation":"getPreset","name":"high_security"}"#)
        .await;
    assert_eq!(
        response.data.unwrap(),
        json!({"expirySeconds": 300, "maxAttempts": 3, "resendDelaySeconds": 120, "channel": "phone"})
    );

    let response = gateway
        .handle_json(
            r#"{"operation":"validateConfig","config":{"expirySeconds":4000,"maxAttempts":5,"resendDelaySeconds":60,"channel":"email"}}"#,
        )
        .await;
    assert!(response.success);
    let data = response.data.unwrap();
    assert_eq!(data["isValid"], false);
    assert_eq!(data["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failures_become_error_envelopes() {
    let gateway = gateway();

    let response = gateway
        .handle_json(r#"{"operation":"getPreset","name":"legacy"}"#)
        .await;
    assert!(!response.success);
    assert!(response.data.is_none());
    assert!(response.error.unwrap().contains("legacy"));

    let response = gateway.handle_json(r#"{"operation":"shutdown"}"#).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("shutdown"));

    let response = gateway.handle_json("{").await;
    assert!(!response.success);
}

#[tokio::test]
async fn test_reset_and_compliance() {
    let gateway = gateway();
    gateway.handle(GatewayRequest::ReportOtpExpired).await;

    let response = gateway.handle(GatewayRequest::ResetMetrics).await;
    assert!(response.success);

    let response = gateway.handle(GatewayRequest::CheckCompliance).await;
    assert!(response.success);
    assert_eq!(response.data.unwrap()["isCompliant"], true);

    let snapshot = gateway.handle(GatewayRequest::GetMetricsSnapshot).await;
    let data = snapshot.data.unwrap();
    assert_eq!(data["totalExpired"], 0);
    assert_eq!(data["securityScore"], 85);
}
