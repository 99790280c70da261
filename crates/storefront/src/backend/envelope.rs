//! Response envelope handling.
//!
//! The backend wraps most payloads as `{status, data, error}`:
//!
//! ```json
//! { "status": "SUCCESS", "data": { "items": [] }, "error": null }
//! { "status": "FAILED", "data": null, "error": { "message": "Out of stock" } }
//! ```
//!
//! Some older endpoints use `{success: bool, data, message}` instead, and a
//! few return bare JSON. All three are accepted.

use serde::Deserialize;
use serde_json::Value;

use super::BackendError;

/// The `{status, data, error}` wrapper.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Envelope {
    /// Whether the status denotes success (`SUCCESS`, `success`, `ok`).
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "success" | "ok" | "succeeded"
        )
    }
}

/// Strip the envelope off a decoded response body.
///
/// `http_status` is only used to label a rejection.
///
/// # Errors
///
/// Returns [`BackendError::Rejected`] when the envelope reports failure.
pub fn unwrap(body: Value, http_status: u16) -> Result<Value, BackendError> {
    let Value::Object(map) = &body else {
        return Ok(body);
    };

    let has_payload_key = map.contains_key("data") || map.contains_key("error");

    if map.get("status").is_some_and(Value::is_string) && has_payload_key {
        let message = error_message(&body);
        let envelope: Envelope = serde_json::from_value(body)?;
        if envelope.is_success() {
            return Ok(envelope.data);
        }
        return Err(BackendError::Rejected {
            status: http_status,
            message: message.unwrap_or(envelope.status),
        });
    }

    if let Some(success) = map.get("success").and_then(Value::as_bool) {
        if !success {
            return Err(BackendError::Rejected {
                status: http_status,
                message: error_message(&body).unwrap_or_else(|| "request failed".to_owned()),
            });
        }
        if let Some(data) = map.get("data") {
            return Ok(data.clone());
        }
    }

    Ok(body)
}

/// Dig a human-readable error message out of a response body.
#[must_use]
pub fn error_message(body: &Value) -> Option<String> {
    const MESSAGE_PATHS: [&str; 6] = [
        "/error/message",
        "/error",
        "/message",
        "/msg",
        "/errors/0/message",
        "/errors/0",
    ];

    MESSAGE_PATHS
        .iter()
        .filter_map(|path| body.pointer(path))
        .find_map(|value| value.as_str().map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_envelope_returns_data() {
        let body = json!({"status": "SUCCESS", "data": {"items": [1, 2]}, "error": null});
        assert_eq!(unwrap(body, 200).unwrap(), json!({"items": [1, 2]}));
    }

    #[test]
    fn test_failed_envelope_returns_error_message() {
        let body = json!({"status": "FAILED", "data": null, "error": {"message": "Out of stock"}});
        let err = unwrap(body, 200).unwrap_err();
        assert!(matches!(
            err,
            BackendError::Rejected { status: 200, ref message } if message == "Out of stock"
        ));
    }

    #[test]
    fn test_failed_envelope_without_message_uses_status() {
        let body = json!({"status": "ERROR", "error": {}});
        let err = unwrap(body, 200).unwrap_err();
        assert!(matches!(err, BackendError::Rejected { ref message, .. } if message == "ERROR"));
    }

    #[test]
    fn test_success_flag_shape() {
        let ok = json!({"success": true, "data": [1]});
        assert_eq!(unwrap(ok, 200).unwrap(), json!([1]));

        let failed = json!({"success": false, "message": "Invalid credentials"});
        let err = unwrap(failed, 200).unwrap_err();
        assert_eq!(err.to_string(), "backend rejected request (200): Invalid credentials");
    }

    #[test]
    fn test_bare_json_passes_through() {
        let body = json!({"status": "shipped", "id": "o1"});
        assert_eq!(unwrap(body.clone(), 200).unwrap(), body);
        assert_eq!(unwrap(json!([1, 2]), 200).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_error_message_probe_order() {
        assert_eq!(
            error_message(&json!({"errors": [{"message": "name required"}]})).as_deref(),
            Some("name required")
        );
        assert_eq!(error_message(&json!({"error": "  "})), None);
        assert_eq!(
            error_message(&json!({"error": "Bad token", "message": "ignored"})).as_deref(),
            Some("Bad token")
        );
    }
}
