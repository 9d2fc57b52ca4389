//! Router assembly.
//!
//! `/api/v1` carries the JSON API; every other path is served from the frontend
//! directory, with `index.html` as the fallback for client-side routes.

use std::path::Path;
use std::sync::Arc;

use axum::{
  extract::DefaultBodyLimit,
  routing::{get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  services::{ServeDir, ServeFile},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

pub const STATIC_DIR: &str = "./static";

/// Request bodies are tiny JSON objects; anything bigger is rejected before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
  build_router_with_frontend(state, STATIC_DIR)
}

pub fn build_router_with_frontend(state: Arc<AppState>, frontend_dir: impl AsRef<Path>) -> Router {
  let dir = frontend_dir.as_ref();
  let frontend = ServeDir::new(dir)
    .append_index_html_on_directories(true)
    .not_found_service(ServeFile::new(dir.join("index.html")));

  Router::new()
    .nest("/api/v1", api_routes())
    .with_state(state)
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    .fallback_service(frontend)
}

fn api_routes() -> Router<Arc<AppState>> {
  Router::new()
    .route("/health", get(http::http_health))
    .route("/math-problem", post(http::http_generate_problem))
    .route("/math-problem/submit", post(http::http_submit_answer))
    .route("/curriculum-topics", get(http::http_curriculum_topics))
    .route("/problem-history", get(http::http_problem_history))
}
