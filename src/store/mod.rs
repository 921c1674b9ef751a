//! Persistence collaborator: problem sessions and answer submissions.
//!
//! `PgStore` is the production backend; `MemoryStore` serves development runs
//! without a database and the test-suite. Both assign ids and timestamps on
//! insert and hand back the fully populated row.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{AnswerSubmission, NewProblem, NewSubmission, ProblemSession};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Problem session not found: {0}")]
  NotFound(String),
}

#[async_trait]
pub trait ProblemStore: Send + Sync {
  /// Backend name for logging.
  fn name(&self) -> &str;

  async fn insert_session(&self, problem: NewProblem) -> Result<ProblemSession, StoreError>;

  /// `StoreError::NotFound` when no row has this id (including ids that are not UUIDs).
  async fn get_session(&self, id: &str) -> Result<ProblemSession, StoreError>;

  async fn insert_submission(&self, submission: NewSubmission) -> Result<AnswerSubmission, StoreError>;

  /// Cheap liveness probe.
  async fn health(&self) -> Result<(), StoreError>;
}

pub(crate) fn parse_session_id(id: &str) -> Result<Uuid, StoreError> {
  Uuid::parse_str(id.trim()).map_err(|_| StoreError::NotFound(id.to_string()))
}
