//! `POST /track`: store one analytics event. No notifications.

use crate::api::response::{
    ErrorBody, ErrorResponse, SERVER_ERROR, created, log_panic, log_rejection,
};
use crate::errors::{ConfigurationError, IntakeError, Result, panic_message};
use crate::metrics_defs::{REQUEST_DURATION, TRACKING_CREATED};
use crate::models::TrackRequest;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::Value;
use shared::{counter, histogram};
use std::any::Any;
use std::time::Instant;

const ENDPOINT: &str = "track";
const STORE_FAILED: &str = "추적 데이터 저장 중 오류가 발생했습니다.";

pub(crate) async fn handle(State(state): State<AppState>, body: Bytes) -> Response {
    let started = Instant::now();

    let result = process(&state, &body).await;
    histogram!(REQUEST_DURATION, "endpoint" => ENDPOINT).record(started.elapsed().as_secs_f64());

    match result {
        Ok(data) => created(data),
        Err(e) => {
            log_rejection(ENDPOINT, &e);
            error_response(e).into_response()
        }
    }
}

async fn process(state: &AppState, body: &[u8]) -> Result<Vec<Value>> {
    let request: TrackRequest = serde_json::from_slice(body)?;
    let event = request.validate(Utc::now())?;

    let deps = state.resolve();
    let store = deps.store.as_deref().ok_or(ConfigurationError)?;

    let data = store.insert(&state.tables().tracking, event.to_row()).await?;
    tracing::debug!(event = %event.event, source = %event.source, "tracking event stored");
    counter!(TRACKING_CREATED).increment(1);

    Ok(data)
}

// Provider detail and diagnostics are logged, not echoed, on this endpoint.
fn error_response(error: IntakeError) -> ErrorResponse {
    let status = error.status();
    let body = match &error {
        IntakeError::Validation(e) => ErrorBody::new(e.to_string()),
        IntakeError::Configuration(e) => ErrorBody::new(e.to_string()),
        IntakeError::Persistence(_) => ErrorBody::new(STORE_FAILED),
        IntakeError::MalformedBody(_) => ErrorBody::new(SERVER_ERROR),
    };

    ErrorResponse { status, body }
}

pub(crate) fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    log_panic(ENDPOINT, &panic_message(&*payload));

    ErrorResponse {
        status: http::StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorBody::new(SERVER_ERROR),
    }
    .into_response()
}
