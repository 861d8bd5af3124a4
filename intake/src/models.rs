//! Request payloads and the rows written for them.

use crate::errors::ValidationError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_CLICK_SOURCE: &str = "unknown";

/// Body of `POST /submit`. Unknown keys are ignored.
///
/// Text fields take any JSON value so a wrong type is a validation failure,
/// not a decode failure. See [`text`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub name: Option<Value>,
    pub contact: Option<Value>,
    /// Any JSON value; only its truthiness matters.
    pub privacy_agreed: Option<Value>,
    pub click_source: Option<Value>,
}

/// Row for the consultations table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewConsultation {
    pub name: String,
    pub contact: String,
    pub is_completed: bool,
    pub click_source: String,
}

impl SubmitRequest {
    pub fn validate(self) -> Result<NewConsultation, ValidationError> {
        let (Some(name), Some(contact)) = (text(self.name), text(self.contact)) else {
            return Err(ValidationError::MissingNameOrContact);
        };

        if !self.privacy_agreed.as_ref().is_some_and(is_truthy) {
            return Err(ValidationError::PrivacyNotAgreed);
        }

        Ok(NewConsultation {
            name,
            contact,
            is_completed: false,
            click_source: text(self.click_source)
                .unwrap_or_else(|| UNKNOWN_CLICK_SOURCE.to_string()),
        })
    }
}

impl NewConsultation {
    pub fn to_row(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "contact": self.contact,
            "is_completed": self.is_completed,
            "click_source": self.click_source,
        })
    }
}

/// Body of `POST /track`.
#[derive(Debug, Default, Deserialize)]
pub struct TrackRequest {
    pub event: Option<Value>,
    pub source: Option<Value>,
    pub timestamp: Option<Value>,
    pub metadata: Option<Value>,
}

/// Row for the tracking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTrackingEvent {
    pub event: String,
    pub source: String,
    pub timestamp: String,
    pub metadata: Value,
}

impl TrackRequest {
    /// `now` fills in a missing timestamp.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTrackingEvent, ValidationError> {
        let (Some(event), Some(source)) = (text(self.event), text(self.source)) else {
            return Err(ValidationError::MissingEventOrSource);
        };

        let timestamp =
            text(self.timestamp).unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

        let metadata = match self.metadata {
            Some(value) if is_truthy(&value) => value,
            _ => Value::Object(Map::new()),
        };

        Ok(NewTrackingEvent {
            event,
            source,
            timestamp,
            metadata,
        })
    }
}

impl NewTrackingEvent {
    pub fn to_row(&self) -> Value {
        serde_json::json!({
            "event": self.event,
            "source": self.source,
            "timestamp": self.timestamp,
            "metadata": self.metadata,
        })
    }
}

/// Text of a form field, stored as sent. Blank strings and zero count as
/// missing; numbers become their decimal text; any other type is missing.
fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Loose truthiness as form posts send it: `true`, `"on"`, `1` all count.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
