//! `POST /submit`: store a consultation request, then notify the team.

use crate::api::response::{
    ErrorBody, ErrorResponse, SERVER_ERROR, created, log_panic, log_rejection,
};
use crate::errors::{ConfigurationError, IntakeError, Result, panic_message};
use crate::metrics_defs::{REQUEST_DURATION, SUBMISSION_CREATED};
use crate::models::SubmitRequest;
use crate::notify;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use shared::{counter, histogram};
use std::any::Any;
use std::time::Instant;

const ENDPOINT: &str = "submit";
const STORE_FAILED: &str = "데이터 저장 중 오류가 발생했습니다.";

pub(crate) async fn handle(State(state): State<AppState>, body: Bytes) -> Response {
    tracing::info!(endpoint = ENDPOINT, body_bytes = body.len(), "submission received");
    let started = Instant::now();

    let result = process(&state, &body).await;
    histogram!(REQUEST_DURATION, "endpoint" => ENDPOINT).record(started.elapsed().as_secs_f64());

    match result {
        Ok(data) => {
            tracing::info!(endpoint = ENDPOINT, "submission processed");
            created(data)
        }
        Err(e) => {
            log_rejection(ENDPOINT, &e);
            error_response(e).into_response()
        }
    }
}

async fn process(state: &AppState, body: &[u8]) -> Result<Vec<Value>> {
    let request: SubmitRequest = serde_json::from_slice(body)?;
    tracing::info!(
        has_name = request.name.is_some(),
        has_contact = request.contact.is_some(),
        privacy_agreed = ?request.privacy_agreed,
        click_source = ?request.click_source,
        "submission fields"
    );

    let consultation = request.validate()?;

    let deps = state.resolve();
    let store = deps.store.as_deref().ok_or(ConfigurationError)?;

    let data = store
        .insert(&state.tables().consultations, consultation.to_row())
        .await?;
    tracing::info!(rows = data.len(), "consultation stored");
    counter!(SUBMISSION_CREATED).increment(1);

    // The response is settled from here on
    let deliveries = notify::fan_out(deps.email.as_deref(), &*deps.chat, &consultation).await;
    tracing::info!(
        sent = deliveries.iter().filter(|d| d.is_sent()).count(),
        attempted = deliveries.len(),
        "notifications finished"
    );

    Ok(data)
}

fn error_response(error: IntakeError) -> ErrorResponse {
    let status = error.status();
    let body = match &error {
        IntakeError::Validation(e) => ErrorBody::new(e.to_string()),
        IntakeError::Configuration(e) => ErrorBody::new(e.to_string()),
        IntakeError::Persistence(e) => ErrorBody::new(STORE_FAILED).with_details(e.detail()),
        IntakeError::MalformedBody(e) => {
            ErrorBody::new(SERVER_ERROR).with_diagnostics(e.to_string(), error.type_name())
        }
    };

    ErrorResponse { status, body }
}

pub(crate) fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(&*payload);
    log_panic(ENDPOINT, &message);

    ErrorResponse {
        status: http::StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorBody::new(SERVER_ERROR).with_diagnostics(message, "Panic"),
    }
    .into_response()
}
