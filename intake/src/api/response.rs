use crate::errors::IntakeError;
use crate::metrics_defs::REQUEST_REJECTED;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use shared::counter;

pub const SERVER_ERROR: &str = "서버 오류가 발생했습니다.";

#[derive(Serialize)]
struct Created {
    success: bool,
    data: Vec<Value>,
}

pub fn created(data: Vec<Value>) -> Response {
    (StatusCode::CREATED, Json(Created { success: true, data })).into_response()
}

#[derive(Serialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ErrorBody {
    pub fn new<S: Into<String>>(error: S) -> Self {
        ErrorBody {
            error: error.into(),
            details: None,
            message: None,
            kind: None,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches the underlying message and error class for operators.
    pub fn with_diagnostics(mut self, message: String, kind: &str) -> Self {
        self.message = Some(message);
        self.kind = Some(kind.to_string());
        self
    }
}

pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn log_rejection(endpoint: &'static str, error: &IntakeError) {
    counter!(REQUEST_REJECTED, "endpoint" => endpoint, "reason" => error.reason()).increment(1);

    match error {
        IntakeError::Validation(e) => {
            tracing::info!(endpoint, reason = "validation", error = %e, "request rejected");
        }
        IntakeError::Configuration(_) => {
            tracing::error!(endpoint, "persistence backend is not configured");
        }
        IntakeError::Persistence(e) => {
            tracing::error!(endpoint, error = %e, "insert failed");
        }
        IntakeError::MalformedBody(e) => {
            tracing::error!(
                endpoint,
                error_type = error.type_name(),
                error = %e,
                "request failed"
            );
        }
    }
}

pub fn log_panic(endpoint: &'static str, message: &str) {
    counter!(REQUEST_REJECTED, "endpoint" => endpoint, "reason" => "internal").increment(1);
    tracing::error!(endpoint, error_type = "Panic", error = %message, "handler panicked");
}
