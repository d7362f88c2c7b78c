pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/generate/ppt", post(handlers::handle_generate_ppt))
        .route("/generate/word", post(handlers::handle_generate_word))
        .route("/download", get(handlers::handle_download))
        .with_state(state)
}
