use http::StatusCode;
use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for request handling
pub type Result<T, E = IntakeError> = std::result::Result<T, E>;

/// Client input defects. The display text is the message returned to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("이름과 연락처를 입력해주세요.")]
    MissingNameOrContact,

    #[error("개인정보 처리방침에 동의해주세요.")]
    PrivacyNotAgreed,

    #[error("이벤트와 출처는 필수입니다.")]
    MissingEventOrSource,
}

/// The persistence backend has no usable credentials in this deployment.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("데이터베이스 연결 설정이 필요합니다.")]
pub struct ConfigurationError;

/// The data store did not accept a write.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("data store rejected the write with status {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("data store request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("could not decode data store response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl PersistenceError {
    /// Provider-reported detail, for operators.
    pub fn detail(&self) -> String {
        match self {
            PersistenceError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Failure of a best-effort notification. Logged, never returned to callers.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("mail credentials are not configured")]
    MissingCredentials,

    #[error("mail {0} address is not configured")]
    MissingAddress(&'static str),

    #[error("notification request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("notification timed out after {0:?}")]
    Timeout(Duration),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notifier panicked: {0}")]
    Panicked(String),
}

/// Everything that can end a request without a stored record.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

impl IntakeError {
    pub fn status(&self) -> StatusCode {
        match self {
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::Configuration(_)
            | IntakeError::Persistence(_)
            | IntakeError::MalformedBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics tags and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "validation",
            IntakeError::Configuration(_) => "configuration",
            IntakeError::Persistence(_) => "persistence",
            IntakeError::MalformedBody(_) => "internal",
        }
    }

    /// Error class reported alongside internal failures.
    pub fn type_name(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "ValidationError",
            IntakeError::Configuration(_) => "ConfigurationError",
            IntakeError::Persistence(_) => "PersistenceError",
            IntakeError::MalformedBody(e) => match e.classify() {
                serde_json::error::Category::Syntax => "SyntaxError",
                serde_json::error::Category::Data => "DataError",
                serde_json::error::Category::Eof => "EofError",
                serde_json::error::Category::Io => "IoError",
            },
        }
    }
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            IntakeError::from(ValidationError::PrivacyNotAgreed).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            IntakeError::from(ConfigurationError).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let rejected = IntakeError::from(PersistenceError::Rejected {
            status: 409,
            message: "duplicate key".into(),
            code: Some("23505".into()),
        });
        assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rejected.reason(), "persistence");
    }

    #[test]
    fn test_malformed_body_type_names() {
        let syntax = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert_eq!(IntakeError::from(syntax).type_name(), "SyntaxError");

        let eof = serde_json::from_str::<serde_json::Value>("{\"a\":").unwrap_err();
        assert_eq!(IntakeError::from(eof).type_name(), "EofError");
    }

    #[test]
    fn test_messages_are_caller_facing() {
        assert_eq!(
            ValidationError::MissingNameOrContact.to_string(),
            "이름과 연락처를 입력해주세요."
        );
        assert_eq!(ConfigurationError.to_string(), "데이터베이스 연결 설정이 필요합니다.");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(&*payload), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&*payload), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*payload), "unknown panic payload");
    }
}
