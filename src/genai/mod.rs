//! Text-generation collaborator.
//!
//! The handlers only see the `TextGenerator` trait; concrete backends are
//! Gemini (`generateContent`) and any OpenAI-compatible chat endpoint.
//! Every call site treats the backend as unreliable and owns a fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{GenAiConfig, GenAiProvider};

pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

const USER_AGENT: &str = concat!("pmath-backend/", env!("CARGO_PKG_VERSION"));

/// One prompt plus the sampling parameters for it.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
  pub prompt: String,
  pub temperature: f32,
  pub max_output_tokens: u32,
}

#[derive(Error, Debug)]
pub enum GenAiError {
  #[error("HTTP request failed: {0}")]
  Http(reqwest::Error),

  #[error("API error (HTTP {status}): {message}")]
  Api { status: u16, message: String },

  #[error("Invalid response body: {0}")]
  InvalidBody(String),
}

// Request URLs may carry credentials; keep them out of error text.
impl From<reqwest::Error> for GenAiError {
  fn from(e: reqwest::Error) -> Self {
    GenAiError::Http(e.without_url())
  }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
  /// Backend name for logging.
  fn name(&self) -> &str;

  /// Model identifier for logging.
  fn model(&self) -> &str;

  /// Run one completion and return the trimmed reply text (possibly empty).
  async fn generate(&self, request: &GenerationRequest) -> Result<String, GenAiError>;
}

/// Build the configured backend. `Ok(None)` when no backend is configured.
pub fn from_config(cfg: Option<&GenAiConfig>) -> Result<Option<Arc<dyn TextGenerator>>, GenAiError> {
  let Some(cfg) = cfg else { return Ok(None) };
  let client = reqwest::Client::builder()
    .timeout(Duration::from_secs(cfg.timeout_secs))
    .user_agent(USER_AGENT)
    .build()?;

  let backend: Arc<dyn TextGenerator> = match cfg.provider {
    GenAiProvider::Gemini => Arc::new(GeminiClient::new(client, &cfg.api_key, &cfg.base_url, &cfg.model)),
    GenAiProvider::OpenAi => Arc::new(OpenAiClient::new(client, &cfg.api_key, &cfg.base_url, &cfg.model)),
  };
  Ok(Some(backend))
}

/// Map a non-success response into `GenAiError::Api`, preferring the
/// `{"error": {"message": ...}}` envelope both backends use.
pub(crate) async fn api_error(res: reqwest::Response) -> GenAiError {
  let status = res.status().as_u16();
  let body = res.text().await.unwrap_or_default();
  let message = extract_error_message(&body).unwrap_or(body);
  GenAiError::Api { status, message }
}

fn extract_error_message(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
