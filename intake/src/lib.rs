pub mod api;
pub mod config;
pub mod env;
pub mod errors;
pub mod metrics_defs;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod redact;
pub mod state;

#[cfg(test)]
mod testutils;

use config::{Config, InvalidConfig, Listener};
use env::EnvSource;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum IntakeRunError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] InvalidConfig),
    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Serves the submission API and the admin probes until either listener fails.
pub async fn run(config: Config, env: Arc<dyn EnvSource>) -> Result<(), IntakeRunError> {
    config.validate()?;

    let state = AppState::from_env(&config, env)?;
    let ready_state = state.clone();
    let admin_service = AdminService::new(move || ready_state.is_ready());

    tracing::info!(
        listener = %config.listener.address(),
        admin_listener = %config.admin_listener.address(),
        "starting intake"
    );

    let api_task = serve_api(&config.listener, state);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}

async fn serve_api(listener: &Listener, state: AppState) -> std::io::Result<()> {
    let tcp_listener = TcpListener::bind(listener.address()).await?;
    axum::serve(tcp_listener, api::router(state)).await
}
