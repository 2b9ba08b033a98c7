//! API Response types
//!
//! Envelope used by the panel REST API

use serde::{Deserialize, Serialize};

/// Envelope code signalling success
pub const API_CODE_SUCCESS: i64 = 1;

/// Unified API response structure
///
/// All panel API responses follow this format, even on HTTP 200:
/// ```json
/// {
///     "code": 1,
///     "data": { ... },
///     "msg": ""
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (1 = success, anything else is a logical failure)
    pub code: i64,
    /// Response data
    pub data: T,
    /// Human-readable message, usually empty on success
    #[serde(default)]
    pub msg: String,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            code: API_CODE_SUCCESS,
            data,
            msg: String::new(),
        }
    }

    /// Whether the envelope carries the given success code
    pub fn is_success(&self, success_code: i64) -> bool {
        self.code == success_code
    }
}

impl ApiResponse<serde_json::Value> {
    /// Create an error response with a null payload
    pub fn error(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            data: serde_json::Value::Null,
            msg: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_missing_msg_defaults_to_empty() {
        let resp: ApiResponse<serde_json::Value> =
            serde_json::from_value(json!({ "code": 1, "data": { "token": "x" } })).unwrap();
        assert!(resp.is_success(API_CODE_SUCCESS));
        assert_eq!(resp.msg, "");
        assert_eq!(resp.data["token"], "x");
    }

    #[test]
    fn test_error_envelope() {
        let resp = ApiResponse::error(0, "bad credentials");
        assert!(!resp.is_success(API_CODE_SUCCESS));
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({ "code": 0, "data": null, "msg": "bad credentials" })
        );
    }
}
