//! Minimal OpenAI-compatible chat.completions client.
//!
//! We send one user message and read back plain text; JSON extraction is the
//! caller's job. Calls are instrumented and log model names, latencies, and
//! response sizes (not contents).
//!
//! NOTE: We never log the API key.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{api_error, GenAiError, GenerationRequest, TextGenerator};

#[derive(Clone)]
pub struct OpenAiClient {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl OpenAiClient {
  pub fn new(client: reqwest::Client, api_key: &str, base_url: &str, model: &str) -> Self {
    Self {
      client,
      api_key: api_key.to_string(),
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
    }
  }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
  fn name(&self) -> &str {
    "openai"
  }

  fn model(&self) -> &str {
    &self.model
  }

  #[instrument(level = "info", target = "genai", skip(self, request),
               fields(model = %self.model, prompt_len = request.prompt.len(), max_tokens = request.max_output_tokens))]
  async fn generate(&self, request: &GenerationRequest) -> Result<String, GenAiError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: request.prompt.clone() }],
      temperature: request.temperature,
      max_tokens: Some(request.max_output_tokens),
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      return Err(api_error(res).await);
    }

    let body: ChatCompletionResponse = res
      .json()
      .await
      .map_err(|e| GenAiError::InvalidBody(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(target: "genai", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default().trim().to_string();
    debug!(target: "genai", elapsed = ?start.elapsed(), reply_len = text.len(), "OpenAI reply received");

    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{body_partial_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(base: &str) -> OpenAiClient {
    OpenAiClient::new(reqwest::Client::new(), "sk-test", base, "gpt-4o-mini")
  }

  fn request() -> GenerationRequest {
    GenerationRequest { prompt: "give feedback".into(), temperature: 0.7, max_output_tokens: 300 }
  }

  #[tokio::test]
  async fn posts_chat_completion_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(header("authorization", "Bearer sk-test"))
      .and(body_partial_json(serde_json::json!({
        "model": "gpt-4o-mini",
        "messages": [{ "role": "user", "content": "give feedback" }],
        "max_tokens": 300
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": " Great work!\n" } }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let text = client(&server.uri()).generate(&request()).await.unwrap();
    assert_eq!(text, "Great work!");
  }

  #[tokio::test]
  async fn rate_limit_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
        "error": { "message": "Rate limit reached", "type": "requests" }
      })))
      .mount(&server)
      .await;

    let err = client(&server.uri()).generate(&request()).await.unwrap_err();
    assert_eq!(err.to_string(), "API error (HTTP 429): Rate limit reached");
  }

  #[tokio::test]
  async fn null_content_is_empty_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{ "message": { "content": null } }]
      })))
      .mount(&server)
      .await;

    let text = client(&server.uri()).generate(&request()).await.unwrap();
    assert_eq!(text, "");
  }
}
