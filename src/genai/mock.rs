//! Scripted text generator for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenAiError, GenerationRequest, TextGenerator};

/// Returns a fixed reply (or a fixed failure) and records what it was asked.
pub struct MockGenerator {
  reply: Option<String>,
  call_count: AtomicU32,
  last_request: Mutex<Option<GenerationRequest>>,
}

impl MockGenerator {
  /// A mock that always returns `reply`.
  pub fn with_reply(reply: &str) -> Self {
    Self { reply: Some(reply.to_string()), call_count: AtomicU32::new(0), last_request: Mutex::new(None) }
  }

  /// A mock whose every call fails like an unreachable backend.
  pub fn failing() -> Self {
    Self { reply: None, call_count: AtomicU32::new(0), last_request: Mutex::new(None) }
  }

  pub fn call_count(&self) -> u32 {
    self.call_count.load(Ordering::Relaxed)
  }

  pub fn last_request(&self) -> Option<GenerationRequest> {
    self.last_request.lock().unwrap().clone()
  }
}

#[async_trait]
impl TextGenerator for MockGenerator {
  fn name(&self) -> &str {
    "mock"
  }

  fn model(&self) -> &str {
    "mock-model"
  }

  async fn generate(&self, request: &GenerationRequest) -> Result<String, GenAiError> {
    self.call_count.fetch_add(1, Ordering::Relaxed);
    *self.last_request.lock().unwrap() = Some(request.clone());
    match &self.reply {
      Some(text) => Ok(text.trim().to_string()),
      None => Err(GenAiError::Api { status: 503, message: "backend unavailable".into() }),
    }
  }
}
