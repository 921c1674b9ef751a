//! In-memory store used when no DATABASE_URL is configured, and by tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use super::{parse_session_id, ProblemStore, StoreError};
use crate::domain::{AnswerSubmission, NewProblem, NewSubmission, ProblemSession};

#[derive(Clone, Default)]
pub struct MemoryStore {
  sessions: Arc<RwLock<HashMap<Uuid, ProblemSession>>>,
  submissions: Arc<RwLock<Vec<AnswerSubmission>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub async fn session_count(&self) -> usize {
    self.sessions.read().await.len()
  }

  #[cfg(test)]
  pub async fn submissions(&self) -> Vec<AnswerSubmission> {
    self.submissions.read().await.clone()
  }
}

#[async_trait]
impl ProblemStore for MemoryStore {
  fn name(&self) -> &str {
    "memory"
  }

  #[instrument(level = "debug", skip(self, problem))]
  async fn insert_session(&self, problem: NewProblem) -> Result<ProblemSession, StoreError> {
    let session = ProblemSession {
      id: Uuid::new_v4(),
      created_at: Utc::now(),
      problem_text: problem.problem_text,
      correct_answer: problem.correct_answer,
    };
    self.sessions.write().await.insert(session.id, session.clone());
    Ok(session)
  }

  #[instrument(level = "debug", skip(self))]
  async fn get_session(&self, id: &str) -> Result<ProblemSession, StoreError> {
    let uuid = parse_session_id(id)?;
    self.sessions
      .read()
      .await
      .get(&uuid)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(id.to_string()))
  }

  #[instrument(level = "debug", skip(self, submission), fields(session_id = %submission.session_id))]
  async fn insert_submission(&self, submission: NewSubmission) -> Result<AnswerSubmission, StoreError> {
    // Mirror the foreign key the Postgres schema enforces.
    if !self.sessions.read().await.contains_key(&submission.session_id) {
      return Err(StoreError::NotFound(submission.session_id.to_string()));
    }
    let row = AnswerSubmission {
      id: Uuid::new_v4(),
      session_id: submission.session_id,
      user_answer: submission.user_answer,
      is_correct: submission.is_correct,
      feedback_text: submission.feedback_text,
    };
    self.submissions.write().await.push(row.clone());
    Ok(row)
  }

  async fn health(&self) -> Result<(), StoreError> {
    Ok(())
  }
}
