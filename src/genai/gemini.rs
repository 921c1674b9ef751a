//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{api_error, GenAiError, GenerationRequest, TextGenerator};

#[derive(Clone)]
pub struct GeminiClient {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl GeminiClient {
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
impl TextGenerator for GeminiClient {
  fn name(&self) -> &str {
    "gemini"
  }

  fn model(&self) -> &str {
    &self.model
  }

  #[instrument(level = "info", target = "genai", skip(self, request),
               fields(model = %self.model, prompt_len = request.prompt.len(), max_tokens = request.max_output_tokens))]
  async fn generate(&self, request: &GenerationRequest) -> Result<String, GenAiError> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let body = GeminiRequest {
      contents: vec![GeminiContent {
        parts: vec![GeminiPart { text: request.prompt.clone() }],
      }],
      generation_config: GenerationConfig {
        temperature: request.temperature,
        max_output_tokens: request.max_output_tokens,
      },
    };

    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .header("x-goog-api-key", &self.api_key)
      .json(&body)
      .send()
      .await?;
    if !res.status().is_success() {
      return Err(api_error(res).await);
    }

    let parsed: GeminiResponse = res
      .json()
      .await
      .map_err(|e| GenAiError::InvalidBody(e.to_string()))?;
    if let Some(usage) = &parsed.usage_metadata {
      info!(target: "genai", prompt_tokens = ?usage.prompt_token_count, completion_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }

    let text: String = parsed
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();
    debug!(target: "genai", elapsed = ?start.elapsed(), reply_len = text.len(), "Gemini reply received");
    Ok(text.trim().to_string())
  }
}

// --- Wire DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
  contents: Vec<GeminiContent>,
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
  parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
  text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f32,
  max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default)]
  usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)]
  prompt_token_count: Option<u32>,
  #[serde(default)]
  candidates_token_count: Option<u32>,
  #[serde(default)]
  total_token_count: Option<u32>,
}
