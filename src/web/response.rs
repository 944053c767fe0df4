use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

/// JSON envelope shared by every endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct ApiResponse<T: Serialize = ()> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error,
        }
    }
}

/// 200 with a payload.
pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(message, data))
}

/// 201 with a payload.
pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::build(StatusCode::CREATED).json(ApiResponse::ok(message, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::message("Logout successful")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": true, "message": "Logout successful" })
        );

        let body = serde_json::to_value(ApiResponse::failure(
            "Validation error",
            Some("\"title\" failed length validation".to_owned()),
        ))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "\"title\" failed length validation");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_envelope_carries_data() {
        let body = serde_json::to_value(ApiResponse::ok("Found", vec![1, 2])).unwrap();
        assert_eq!(body["data"], serde_json::json!([1, 2]));
    }
}
