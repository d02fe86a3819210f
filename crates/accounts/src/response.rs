use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform wrapper around every response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status: u16,
    pub error: bool,
    pub message: String,
    pub data: Option<Value>,
    pub error_data: Option<Value>,
}

impl Envelope {
    pub fn success(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error: false,
            message: message.into(),
            data: None,
            error_data: None,
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error: true,
            message: message.into(),
            data: None,
            error_data: None,
        }
    }

    /// Attach a payload under `data.<key>`
    pub fn with_data(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::error!(key, error = %e, "failed to serialize response payload");
            Value::Null
        });

        let mut payload = serde_json::Map::new();
        payload.insert(key.to_string(), value);
        self.data = Some(Value::Object(payload));
        self
    }

    /// Attach an error detail under `errorData.data`
    pub fn with_error_detail(mut self, detail: impl Into<String>) -> Self {
        self.error_data = Some(serde_json::json!({ "data": detail.into() }));
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = Envelope::success(StatusCode::CREATED, "user created successfully")
            .with_data("data", serde_json::json!({ "insertedId": "abc" }));

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], 201);
        assert_eq!(json["error"], false);
        assert_eq!(json["data"]["data"]["insertedId"], "abc");
        assert!(json["errorData"].is_null());
    }

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = Envelope::failure(StatusCode::BAD_REQUEST, "incorrect password")
            .with_error_detail("password mismatch");

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["error"], true);
        assert_eq!(json["message"], "incorrect password");
        assert_eq!(json["errorData"]["data"], "password mismatch");
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_unserializable_payload_becomes_null() {
        // JSON object keys must be strings
        let payload = std::collections::BTreeMap::from([((1, 2), "x")]);
        let envelope = Envelope::success(StatusCode::OK, "ok").with_data("data", payload);

        assert_eq!(envelope.data.unwrap()["data"], Value::Null);
    }

    #[test]
    fn test_response_status_matches_envelope() {
        let response = Envelope::failure(StatusCode::NOT_FOUND, "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
