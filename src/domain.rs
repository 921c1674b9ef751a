//! Domain models: persisted problem sessions and answer submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Answers closer than this to the stored answer count as correct.
pub const ANSWER_TOLERANCE: f64 = 0.01;

// The comparison runs on the difference expressed in 1e-9 units so that
// decimal literals exactly one tolerance apart (10.6 vs 10.59) are not pulled
// inside the bound by binary representation error.
const QUANTUM_PER_UNIT: f64 = 1e9;

/// A generated word problem and its correct answer. Immutable once stored.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProblemSession {
  pub id: Uuid,
  pub created_at: DateTime<Utc>,
  pub problem_text: String,
  pub correct_answer: f64,
}

/// One learner answer to a `ProblemSession`, with verdict and feedback.
/// `session_id` is a reference, a session may have any number of these.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnswerSubmission {
  pub id: Uuid,
  pub session_id: Uuid,
  pub user_answer: f64,
  pub is_correct: bool,
  pub feedback_text: String,
}

/// Problem content before persistence (from the model or the fallback pool).
#[derive(Clone, Debug, PartialEq)]
pub struct NewProblem {
  pub problem_text: String,
  pub correct_answer: f64,
}

#[derive(Clone, Debug)]
pub struct NewSubmission {
  pub session_id: Uuid,
  pub user_answer: f64,
  pub is_correct: bool,
  pub feedback_text: String,
}

/// Where did the problem content come from? Only logged, never exposed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemOrigin {
  Generated,
  Fallback,
}

impl ProblemOrigin {
  pub fn as_str(self) -> &'static str {
    match self {
      ProblemOrigin::Generated => "genai_generated",
      ProblemOrigin::Fallback => "fallback_pool",
    }
  }
}

/// True iff `|user - correct| < ANSWER_TOLERANCE`. Non-finite values never match.
pub fn within_tolerance(user: f64, correct: f64) -> bool {
  if !user.is_finite() || !correct.is_finite() {
    return false;
  }
  // Rounding to 1e-9 keeps float noise (10.6 - 10.59) from slipping under the
  // bound, at the cost of treating differences in [0.0099999995, 0.01) as a miss.
  let diff = ((user - correct).abs() * QUANTUM_PER_UNIT).round();
  diff < (ANSWER_TOLERANCE * QUANTUM_PER_UNIT).round()
}
