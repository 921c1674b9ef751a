//! Application state: the injected collaborators plus prompt settings.
//!
//! Nothing in here is mutated after start-up; all cross-request state lives
//! in the store. `AppState::from_config` wires production collaborators,
//! tests assemble the struct directly with fakes.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{AppConfig, GenerationParams, Prompts};
use crate::genai::{self, GenAiError, TextGenerator};
use crate::seeds::{Picker, RandomPicker};
use crate::store::{MemoryStore, PgStore, ProblemStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProblemStore>,
    /// `None` when no model backend is configured; every call site falls back.
    pub genai: Option<Arc<dyn TextGenerator>>,
    pub picker: Arc<dyn Picker>,
    pub prompts: Prompts,
    pub generation: GenerationParams,
    pub reveal_answer_on_generate: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("text generation client: {0}")]
    GenAi(#[from] GenAiError),
}

impl AppState {
    /// Build state from config: connect the store, build the model client.
    #[instrument(level = "info", skip_all)]
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, StartupError> {
        let store: Arc<dyn ProblemStore> = match &cfg.database {
            Some(db) => {
                let pg = PgStore::connect(db).await?;
                if db.auto_migrate {
                    pg.ensure_schema().await?;
                }
                info!(target: "pmath_backend", max_connections = db.max_connections, "Postgres store connected.");
                Arc::new(pg)
            }
            None => {
                warn!(target: "pmath_backend", "DATABASE_URL not set. Using in-memory store; data is lost on restart.");
                Arc::new(MemoryStore::new())
            }
        };

        let genai = genai::from_config(cfg.genai.as_ref())?;
        match &genai {
            Some(g) => info!(target: "pmath_backend", backend = g.name(), model = g.model(), "Text generation enabled."),
            None => warn!(target: "pmath_backend", "No GEMINI_API_KEY / OPENAI_API_KEY. Serving fallback problems and feedback only."),
        }
        if !cfg.reveal_answer_on_generate {
            info!(target: "pmath_backend", "Correct answers withheld from problem responses.");
        }

        Ok(Self {
            store,
            genai,
            picker: Arc::new(RandomPicker),
            prompts: cfg.prompts.clone(),
            generation: cfg.generation.clone(),
            reveal_answer_on_generate: cfg.reveal_answer_on_generate,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bare_config_uses_memory_store_and_no_genai() {
        let cfg = AppConfig::from_lookup(|_| None);
        let state = AppState::from_config(&cfg).await.unwrap();
        assert_eq!(state.store.name(), "memory");
        assert!(state.genai.is_none());
        assert!(state.reveal_answer_on_generate);
    }
}
