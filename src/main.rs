//! Math Coach · word-problem tutor backend
//!
//! - Axum HTTP API (problem generation, answer submission, topics, history)
//! - OpenAI-compatible model integration (via environment variables)
//! - SQLite persistence (sqlx)
//! - Static SPA fallback (./static/index.html)
//!
//! See `config` for the environment variables. Logging:
//!   LOG_LEVEL  : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use mathcoach_backend::config::AppConfig;
use mathcoach_backend::{build_router, telemetry, AppState};

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = AppConfig::from_env();

  // Shared application state (database, model client, curriculum, prompts).
  let state = Arc::new(AppState::from_config(&cfg).await?);

  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "mathcoach_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "mathcoach_backend", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(target: "mathcoach_backend", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut s) => {
        s.recv().await;
      }
      Err(e) => {
        tracing::error!(target: "mathcoach_backend", error = %e, "Failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "mathcoach_backend", "Shutdown signal received");
}
