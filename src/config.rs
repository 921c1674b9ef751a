//! Runtime configuration: environment variables plus an optional TOML file
//! with prompt and generation-parameter overrides.
//!
//! See `AppConfig` for the env surface and `PromptsFile` for the TOML schema.

use serde::Deserialize;
use tracing::{error, info, warn};

/// Which text-generation backend to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenAiProvider {
  Gemini,
  OpenAi,
}

#[derive(Clone, Debug)]
pub struct GenAiConfig {
  pub provider: GenAiProvider,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
  pub url: String,
  pub max_connections: u32,
  pub auto_migrate: bool,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub database: Option<DatabaseConfig>,
  pub genai: Option<GenAiConfig>,
  pub reveal_answer_on_generate: bool,
  pub prompts: Prompts,
  pub generation: GenerationParams,
}

/// Prompt texts sent to the model. Defaults target Singapore Primary 5.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub problem_prompt: String,
  /// Placeholders: {problem_text} {user_answer} {correct_answer} {verdict}
  pub feedback_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      problem_prompt: DEFAULT_PROBLEM_PROMPT.into(),
      feedback_template: DEFAULT_FEEDBACK_TEMPLATE.into(),
    }
  }
}

/// Output length and randomness for the two model calls.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationParams {
  pub problem_temperature: f32,
  pub problem_max_tokens: u32,
  pub feedback_temperature: f32,
  pub feedback_max_tokens: u32,
}

impl Default for GenerationParams {
  fn default() -> Self {
    Self {
      problem_temperature: 0.3,
      problem_max_tokens: 500,
      feedback_temperature: 0.7,
      feedback_max_tokens: 300,
    }
  }
}

/// Shape of the file at PROMPTS_CONFIG_PATH. Every key is optional.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptsFile {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: GenerationParams,
}

const DEFAULT_PROBLEM_PROMPT: &str = r#"You are a Singapore-primary-math word-problem generator.

Rules
- Level: Primary 5 (11-year-olds)
- Syllabus: 2021 Singapore MOE
- Topic band: Number & Algebra → Fractions, Decimals, Percentage, Ratio, Rate
- Numbers: friendly integers / decimals ≤ 2 dp, denominators ≤ 12
- Context: local (hawker centre, MRT, PSLE-style)
- Language: concise, single sentence, no ambiguity
- Cognitive demand: routine, 1- or 2-step solution
- Include unit inside sentence; answer field = numeric only
- Do NOT expose calculation steps inside problem string
- Ensure answer is unique and positive

Return ONLY a JSON object with the following keys:
{
  "problem_text": "the math word problem here",
  "correct_answer": 123.45
}"#;

const DEFAULT_FEEDBACK_TEMPLATE: &str = r#"You are a Singapore Primary 5 math tutor. Provide personalized feedback for this problem.

Problem: "{problem_text}"
Student's answer: {user_answer}
Correct answer: {correct_answer}
The student's answer is {verdict}.

Provide brief, encouraging feedback in Singapore teaching style:
- If correct: Praise specifically what they did well
- If incorrect: Give a gentle hint about the Singapore math concept involved
- Focus on building confidence and mathematical thinking
- Keep it to 2-3 sentences maximum
- Use encouraging language suitable for 11-year-olds"#;

const DEFAULT_PORT: u16 = 3000;

impl AppConfig {
  /// Read the whole configuration from the process environment.
  pub fn from_env() -> Self {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Same as `from_env` with an injectable variable source.
  pub fn from_lookup<F>(get: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let port = get("PORT")
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(DEFAULT_PORT);

    let database = get("DATABASE_URL")
      .filter(|u| !u.trim().is_empty())
      .map(|url| DatabaseConfig {
        url,
        max_connections: get("DATABASE_MAX_CONNECTIONS")
          .and_then(|v| v.parse().ok())
          .unwrap_or(5),
        auto_migrate: get("DATABASE_AUTO_MIGRATE").map(|v| parse_flag(&v)).unwrap_or(true),
      });

    let genai = genai_from_lookup(&get);

    let reveal_answer_on_generate = get("REVEAL_ANSWER_ON_GENERATE")
      .map(|v| parse_flag(&v))
      .unwrap_or(true);

    let file = get("PROMPTS_CONFIG_PATH")
      .and_then(|path| load_prompts_file(&path))
      .unwrap_or_default();

    Self {
      port,
      database,
      genai,
      reveal_answer_on_generate,
      prompts: file.prompts,
      generation: file.generation,
    }
  }
}

fn genai_from_lookup<F>(get: &F) -> Option<GenAiConfig>
where
  F: Fn(&str) -> Option<String>,
{
  let timeout_secs = get("GENAI_TIMEOUT_SECS")
    .and_then(|v| v.parse().ok())
    .unwrap_or(20);
  let gemini_key = get("GEMINI_API_KEY").filter(|k| !k.is_empty());
  let openai_key = get("OPENAI_API_KEY").filter(|k| !k.is_empty());

  let forced = get("GENAI_PROVIDER").filter(|v| !v.trim().is_empty()).and_then(|v| {
    let parsed = parse_provider(&v);
    if parsed.is_none() {
      warn!(target: "pmath_backend", value = %v, "Unknown GENAI_PROVIDER; selecting by available keys");
    }
    parsed
  });

  let provider = match forced {
    Some(p) => p,
    _ if gemini_key.is_some() => GenAiProvider::Gemini,
    _ if openai_key.is_some() => GenAiProvider::OpenAi,
    _ => return None,
  };

  match provider {
    GenAiProvider::Gemini => Some(GenAiConfig {
      provider,
      api_key: gemini_key?,
      base_url: get("GEMINI_BASE_URL")
        .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".into()),
      model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash-lite".into()),
      timeout_secs,
    }),
    GenAiProvider::OpenAi => Some(GenAiConfig {
      provider,
      api_key: openai_key?,
      base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
      model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
      timeout_secs,
    }),
  }
}

fn parse_provider(v: &str) -> Option<GenAiProvider> {
  match v.trim().to_ascii_lowercase().as_str() {
    "gemini" => Some(GenAiProvider::Gemini),
    "openai" => Some(GenAiProvider::OpenAi),
    _ => None,
  }
}

fn parse_flag(v: &str) -> bool {
  !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

/// Attempt to load `PromptsFile` from `path`. On any parsing/IO error, returns None.
pub fn load_prompts_file(path: &str) -> Option<PromptsFile> {
  match std::fs::read_to_string(path) {
    Ok(s) => parse_prompts_file(&s)
      .map_err(|e| error!(target: "pmath_backend", %path, error = %e, "Failed to parse TOML config"))
      .ok()
      .map(|cfg| {
        info!(target: "pmath_backend", %path, "Loaded prompts config (TOML)");
        cfg
      }),
    Err(e) => {
      error!(target: "pmath_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_prompts_file(s: &str) -> Result<PromptsFile, toml::de::Error> {
  toml::from_str::<PromptsFile>(s)
}
