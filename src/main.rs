//! Primary-math practice backend
//!
//! - Axum HTTP API: generate a word problem, evaluate an answer with feedback
//! - Text generation via Gemini or an OpenAI-compatible endpoint (optional)
//! - Postgres persistence via sqlx (in-memory when DATABASE_URL is unset)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                      : u16 (default 3000)
//!   DATABASE_URL              : Postgres URL; unset => in-memory store
//!   DATABASE_MAX_CONNECTIONS  : pool size (default 5)
//!   DATABASE_AUTO_MIGRATE     : "false" skips CREATE TABLE IF NOT EXISTS at startup
//!   GEMINI_API_KEY            : enables Gemini text generation
//!   GEMINI_BASE_URL           : default https://generativelanguage.googleapis.com/v1beta
//!   GEMINI_MODEL              : default gemini-2.5-flash-lite
//!   OPENAI_API_KEY            : enables OpenAI text generation (if no Gemini key)
//!   OPENAI_BASE_URL           : default https://api.openai.com/v1
//!   OPENAI_MODEL              : default gpt-4o-mini
//!   GENAI_PROVIDER            : force "gemini" or "openai"
//!   GENAI_TIMEOUT_SECS        : per-request model timeout (default 20)
//!   REVEAL_ANSWER_ON_GENERATE : "false" withholds correct_answer from new problems
//!   PROMPTS_CONFIG_PATH       : TOML with prompt / generation overrides
//!   LOG_LEVEL                 : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                : "pretty" (default) or "json"

mod config;
mod domain;
mod error;
mod genai;
mod logic;
mod parse;
mod protocol;
mod routes;
mod seeds;
mod state;
mod store;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = AppConfig::from_env();

  // Build the collaborators once; handlers receive them through state.
  let state = Arc::new(AppState::from_config(&cfg).await?);

  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "pmath_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "pmath_backend", "HTTP server stopped");
  Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(target: "pmath_backend", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(target: "pmath_backend", error = %e, "Failed to listen for SIGTERM");
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
  info!(target: "pmath_backend", "Shutdown signal received");
}
