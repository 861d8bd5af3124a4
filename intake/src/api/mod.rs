pub mod response;
mod submit;
mod track;

use crate::state::AppState;
use axum::Router;
use axum::routing::post;
use tower_http::catch_panic::CatchPanicLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/submit",
            post(submit::handle).layer(CatchPanicLayer::custom(submit::panic_response)),
        )
        .route(
            "/track",
            post(track::handle).layer(CatchPanicLayer::custom(track::panic_response)),
        )
        .with_state(state)
}
