//! Postgres store (sqlx).

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, instrument};

use super::{parse_session_id, ProblemStore, StoreError};
use crate::config::DatabaseConfig;
use crate::domain::{AnswerSubmission, NewProblem, NewSubmission, ProblemSession};

const CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS math_problem_sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    problem_text TEXT NOT NULL,
    correct_answer DOUBLE PRECISION NOT NULL
)"#;

const CREATE_SUBMISSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS math_problem_submissions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    session_id UUID NOT NULL REFERENCES math_problem_sessions(id),
    user_answer DOUBLE PRECISION NOT NULL,
    is_correct BOOLEAN NOT NULL,
    feedback_text TEXT NOT NULL
)"#;

#[derive(Clone, Debug)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
    let pool = PgPoolOptions::new()
      .max_connections(config.max_connections)
      .connect(&config.url)
      .await?;
    Ok(Self { pool })
  }

  /// Create both tables when absent.
  pub async fn ensure_schema(&self) -> Result<(), StoreError> {
    sqlx::query(CREATE_SESSIONS).execute(&self.pool).await?;
    sqlx::query(CREATE_SUBMISSIONS).execute(&self.pool).await?;
    info!(target: "pmath_backend", "Database schema ensured");
    Ok(())
  }
}

#[async_trait]
impl ProblemStore for PgStore {
  fn name(&self) -> &str {
    "postgres"
  }

  #[instrument(level = "debug", skip(self, problem), fields(text_len = problem.problem_text.len()))]
  async fn insert_session(&self, problem: NewProblem) -> Result<ProblemSession, StoreError> {
    let row = sqlx::query_as::<_, ProblemSession>(
      "INSERT INTO math_problem_sessions (problem_text, correct_answer) VALUES ($1, $2) \
       RETURNING id, created_at, problem_text, correct_answer",
    )
    .bind(&problem.problem_text)
    .bind(problem.correct_answer)
    .fetch_one(&self.pool)
    .await?;
    Ok(row)
  }

  #[instrument(level = "debug", skip(self))]
  async fn get_session(&self, id: &str) -> Result<ProblemSession, StoreError> {
    let uuid = parse_session_id(id)?;
    sqlx::query_as::<_, ProblemSession>(
      "SELECT id, created_at, problem_text, correct_answer FROM math_problem_sessions WHERE id = $1",
    )
    .bind(uuid)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(id.to_string()))
  }

  #[instrument(level = "debug", skip(self, submission), fields(session_id = %submission.session_id))]
  async fn insert_submission(&self, submission: NewSubmission) -> Result<AnswerSubmission, StoreError> {
    let row = sqlx::query_as::<_, AnswerSubmission>(
      "INSERT INTO math_problem_submissions (session_id, user_answer, is_correct, feedback_text) \
       VALUES ($1, $2, $3, $4) \
       RETURNING id, session_id, user_answer, is_correct, feedback_text",
    )
    .bind(submission.session_id)
    .bind(submission.user_answer)
    .bind(submission.is_correct)
    .bind(&submission.feedback_text)
    .fetch_one(&self.pool)
    .await?;
    Ok(row)
  }

  async fn health(&self) -> Result<(), StoreError> {
    let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::{FixedPicker, fallback_problem};

  const DATABASE_URL_VAR: &str = "PMATH_TEST_DATABASE_URL";

  /// Live-database store, or None when no test database is configured.
  async fn make_store() -> Option<PgStore> {
    let url = std::env::var(DATABASE_URL_VAR).ok()?;
    let cfg = DatabaseConfig { url, max_connections: 2, auto_migrate: true };
    let store = PgStore::connect(&cfg).await.ok()?;
    store.ensure_schema().await.ok()?;
    Some(store)
  }

  #[tokio::test]
  async fn session_round_trip_and_submissions() {
    let store = match make_store().await {
      Some(s) => s,
      None => {
        eprintln!("Skipping session_round_trip_and_submissions: {DATABASE_URL_VAR} unavailable");
        return;
      }
    };

    store.health().await.unwrap();
    let session = store.insert_session(fallback_problem(&FixedPicker(0))).await.unwrap();
    assert_eq!(session.correct_answer, 10.6);

    let loaded = store.get_session(&session.id.to_string()).await.unwrap();
    assert_eq!(loaded.problem_text, session.problem_text);

    for (answer, ok) in [(10.6, true), (3.0, false)] {
      let sub = store
        .insert_submission(NewSubmission {
          session_id: session.id,
          user_answer: answer,
          is_correct: ok,
          feedback_text: "ok".into(),
        })
        .await
        .unwrap();
      assert_eq!(sub.session_id, session.id);
      assert_eq!(sub.is_correct, ok);
    }
  }

  #[tokio::test]
  async fn unknown_session_is_not_found() {
    let store = match make_store().await {
      Some(s) => s,
      None => {
        eprintln!("Skipping unknown_session_is_not_found: {DATABASE_URL_VAR} unavailable");
        return;
      }
    };

    let err = store.get_session(&uuid::Uuid::new_v4().to_string()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    let err = store.get_session("garbage").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
  }
}
