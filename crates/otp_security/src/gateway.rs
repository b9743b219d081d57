//! # Gateway Envelope
//!
//! Transport-neutral request/response mapping for hosts that expose the
//! engine over a network boundary. Each engine operation corresponds to one
//! [`GatewayRequest`] variant and every answer is wrapped in an
//! [`ApiResponse`]. No server is included; the host's HTTP layer deserializes
//! the body, calls [`Gateway::handle_json`] or [`Gateway::handle`] and writes
//! the envelope back.
//!
//! ```json
//! {"operation": "reportOtpSucceeded", "usageSeconds": 42.0, "userId": "rider-7"}
//! ```

use crate::engine::OtpSecurityEngine;
use crate::error::{OtpSecurityError, OtpSecurityResult};
use crate::types::{EventKind, OtpConfig, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Operation names accepted by the gateway
pub const OPERATIONS: [&str; 11] = [
    "reportOtpGenerated",
    "reportOtpExpired",
    "reportOtpSucceeded",
    "reportOtpFailed",
    "logEvent",
    "getPreset",
    "validateConfig",
    "getReport",
    "getMetricsSnapshot",
    "resetMetrics",
    "checkCompliance",
];

/// Response envelope: `{success, data?, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded
    pub success: bool,
    /// Operation output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response carrying `error`
    pub fn err(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

impl<T> From<OtpSecurityResult<T>> for ApiResponse<T> {
    fn from(result: OtpSecurityResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}

/// One engine operation with its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GatewayRequest {
    /// A code was issued
    ReportOtpGenerated,
    /// A code expired unused
    ReportOtpExpired,
    /// A code was verified
    ReportOtpSucceeded {
        /// Seconds between issue and use
        usage_seconds: f64,
        /// User whose failure streak is cleared
        #[serde(default)]
        user_id: Option<String>,
    },
    /// A verification failed
    ReportOtpFailed {
        /// User whose failure streak is extended
        #[serde(default)]
        user_id: Option<String>,
    },
    /// Record a security event
    LogEvent {
        /// Event kind
        kind: EventKind,
        /// Event severity
        severity: Severity,
        /// Related user
        #[serde(default)]
        user_id: Option<String>,
        /// Free-form context
        #[serde(default)]
        details: HashMap<String, Value>,
    },
    /// Look up a preset
    GetPreset {
        /// Preset name
        name: String,
    },
    /// Validate a proposed configuration
    ValidateConfig {
        /// Configuration to validate
        config: OtpConfig,
    },
    /// Build a security report
    GetReport,
    /// Read the current metrics
    GetMetricsSnapshot,
    /// Clear metrics and the event log
    ResetMetrics,
    /// Check the identity provider
    CheckCompliance,
}

impl GatewayRequest {
    /// Wire name of the operation
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::ReportOtpGenerated => OPERATIONS[0],
            Self::ReportOtpExpired => OPERATIONS[1],
            Self::ReportOtpSucceeded { .. } => OPERATIONS[2],
            Self::ReportOtpFailed { .. } => OPERATIONS[3],
            Self::LogEvent { .. } => OPERATIONS[4],
            Self::GetPreset { .. } => OPERATIONS[5],
            Self::ValidateConfig { .. } => OPERATIONS[6],
            Self::GetReport => OPERATIONS[7],
            Self::GetMetricsSnapshot => OPERATIONS[8],
            Self::ResetMetrics => OPERATIONS[9],
            Self::CheckCompliance => OPERATIONS[10],
        }
    }
}

/// Maps gateway requests onto a shared engine
#[derive(Debug, Clone)]
pub struct Gateway {
    engine: Arc<OtpSecurityEngine>,
}

impl Gateway {
    /// Create a gateway over `engine`
    #[must_use]
    pub const fn new(engine: Arc<OtpSecurityEngine>) -> Self {
        Self { engine }
    }

    /// Execute one request
    pub async fn handle(&self, request: GatewayRequest) -> ApiResponse<Value> {
        let operation = request.operation();
        debug!(operation, "Gateway request");

        let response: ApiResponse<Value> = self.execute(request).await.into();
        if let Some(error) = &response.error {
            warn!(operation, error = %error, "Gateway request failed");
        }
        response
    }

    /// Parse a JSON body and execute it
    pub async fn handle_json(&self, body: &str) -> ApiResponse<Value> {
        match parse_request(body) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "Rejected gateway payload");
                ApiResponse::err(e)
            }
        }
    }

    async fn execute(&self, request: GatewayRequest) -> OtpSecurityResult<Value> {
        let engine = &self.engine;
        let value = match request {
            GatewayRequest::ReportOtpGenerated => to_value(&engine.report_otp_generated())?,
            GatewayRequest::ReportOtpExpired => to_value(&engine.report_otp_expired())?,
            GatewayRequest::ReportOtpSucceeded {
                usage_seconds,
                user_id,
            } => {
                let metrics = match user_id {
                    Some(user_id) => engine.report_otp_succeeded_for(&user_id, usage_seconds),
                    None => engine.report_otp_succeeded(usage_seconds),
                };
                to_value(&metrics)?
            }
            GatewayRequest::ReportOtpFailed { user_id } => {
                let metrics = match user_id {
                    Some(user_id) => engine.report_otp_failed_for(&user_id),
                    None => engine.report_otp_failed(),
                };
                to_value(&metrics)?
            }
            GatewayRequest::LogEvent {
                kind,
                severity,
                user_id,
                details,
            } => {
                let id = engine.log_event(kind, severity, user_id, details);
                serde_json::json!({ "id": id })
            }
            GatewayRequest::GetPreset { name } => to_value(&engine.get_preset(&name)?)?,
            GatewayRequest::ValidateConfig { config } => {
                to_value(&engine.validate_config(&config))?
            }
            GatewayRequest::GetReport => to_value(&engine.get_report())?,
            GatewayRequest::GetMetricsSnapshot => to_value(&engine.get_metrics_snapshot())?,
            GatewayRequest::ResetMetrics => {
                engine.reset_metrics();
                Value::Null
            }
            GatewayRequest::CheckCompliance => to_value(&engine.check_compliance().await)?,
        };
        Ok(value)
    }
}

fn to_value<T: Serialize>(value: &T) -> OtpSecurityResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Parse a request body, telling unknown operations apart from bad arguments
///
/// # Errors
///
/// Returns `UnknownOperation` when the `operation` field is missing or not
/// recognized, and `Serialization` when the body is not valid JSON or the
/// arguments do not match the operation
pub fn parse_request(body: &str) -> OtpSecurityResult<GatewayRequest> {
    let value: Value = serde_json::from_str(body)?;
    let operation = value
        .get("operation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if !OPERATIONS.contains(&operation.as_str()) {
        return Err(OtpSecurityError::UnknownOperation { operation });
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() -> OtpSecurityResult<()> {
        let request = parse_request(
            r#"{"operation":"reportOtpSucceeded","usageSeconds":42.5,"userId":"rider-7"}"#,
        )?;
        assert_eq!(
            request,
            GatewayRequest::ReportOtpSucceeded {
                usage_seconds: 42.5,
                user_id: Some("rider-7".to_string()),
            }
        );
        assert_eq!(request.operation(), "reportOtpSucceeded");

        let request = parse_request(r#"{"operation":"reportOtpFailed"}"#)?;
        assert_eq!(request, GatewayRequest::ReportOtpFailed { user_id: None });
        Ok(())
    }

    #[test]
    fn test_unknown_operation() {
        assert!(matches!(
            parse_request(r#"{"operation":"dropTables"}"#),
            Err(OtpSecurityError::UnknownOperation { operation }) if operation == "dropTables"
        ));
        assert!(matches!(
            parse_request(r#"{"name":"standard"}"#),
            Err(OtpSecurityError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(matches!(
            parse_request(r#"{"operation":"getPreset"}"#),
            Err(OtpSecurityError::Serialization { .. })
        ));
        assert!(matches!(
            parse_request("not json"),
            Err(OtpSecurityError::Serialization { .. })
        ));
    }

    #[test]
    fn test_envelope_omits_empty_fields() -> Result<(), serde_json::Error> {
        let ok = serde_json::to_value(ApiResponse::ok(1))?;
        assert_eq!(ok, serde_json::json!({"success": true, "data": 1}));

        let err = serde_json::to_value(ApiResponse::<u8>::err("boom"))?;
        assert_eq!(err, serde_json::json!({"success": false, "error": "boom"}));
        Ok(())
    }

    #[test]
    fn test_operation_names_round_trip() -> Result<(), serde_json::Error> {
        let requests = [
            GatewayRequest::ReportOtpGenerated,
            GatewayRequest::GetReport,
            GatewayRequest::ResetMetrics,
            GatewayRequest::CheckCompliance,
        ];
        for request in requests {
            let json = serde_json::to_value(&request)?;
            assert_eq!(json["operation"], request.operation());
        }
        Ok(())
    }
}
