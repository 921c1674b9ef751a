//! Core behaviors behind the two HTTP handlers.
//!
//! This includes:
//!   - Generating a problem (model first, canned pool on any failure) and storing it
//!   - Evaluating an answer against the stored one within `ANSWER_TOLERANCE`
//!   - Producing feedback (model first, canned templates on error or empty reply)
//!
//! Model failures are always recovered here; store failures always propagate.

use tracing::{debug, error, info, instrument, warn};

use crate::domain::{within_tolerance, NewProblem, NewSubmission, ProblemOrigin};
use crate::error::AppError;
use crate::genai::GenerationRequest;
use crate::parse::parse_problem;
use crate::protocol::{AnswerOut, AnswerRequest, ProblemOut};
use crate::seeds::{fallback_feedback, fallback_problem, format_answer};
use crate::state::AppState;
use crate::util::{fill_template, trunc_for_log};

#[instrument(level = "info", skip(state))]
pub async fn generate_problem(state: &AppState) -> Result<ProblemOut, AppError> {
  let (problem, origin) = problem_content(state).await;

  let session = state.store.insert_session(problem).await?;
  info!(target: "problem", session_id = %session.id, origin = origin.as_str(), correct_answer = session.correct_answer, "Problem session stored");

  Ok(ProblemOut {
    session_id: session.id.to_string(),
    problem_text: session.problem_text,
    correct_answer: state.reveal_answer_on_generate.then_some(session.correct_answer),
  })
}

/// Model-generated problem, or a canned one when the model is absent, fails,
/// or returns something that does not validate.
async fn problem_content(state: &AppState) -> (NewProblem, ProblemOrigin) {
  let Some(genai) = &state.genai else {
    warn!(target: "problem", "No text generation backend; using fallback problem");
    return (fallback_problem(state.picker.as_ref()), ProblemOrigin::Fallback);
  };

  let request = GenerationRequest {
    prompt: state.prompts.problem_prompt.clone(),
    temperature: state.generation.problem_temperature,
    max_output_tokens: state.generation.problem_max_tokens,
  };
  match genai.generate(&request).await {
    Ok(raw) => {
      debug!(target: "problem", raw = %trunc_for_log(&raw, 400), "Raw model response");
      match parse_problem(&raw) {
        Ok(p) => (p, ProblemOrigin::Generated),
        Err(e) => {
          warn!(target: "problem", error = %e, "Unusable model response; using fallback problem");
          (fallback_problem(state.picker.as_ref()), ProblemOrigin::Fallback)
        }
      }
    }
    Err(e) => {
      error!(target: "problem", backend = genai.name(), error = %e, "Model call failed; using fallback problem");
      (fallback_problem(state.picker.as_ref()), ProblemOrigin::Fallback)
    }
  }
}

#[instrument(level = "info", skip(state, req), fields(session_id = %req.session_id, user_answer = req.user_answer))]
pub async fn evaluate_answer(state: &AppState, req: AnswerRequest) -> Result<AnswerOut, AppError> {
  let session = state.store.get_session(&req.session_id).await?;

  let is_correct = within_tolerance(req.user_answer, session.correct_answer);
  let feedback = feedback_text(state, &session.problem_text, req.user_answer, session.correct_answer, is_correct).await;

  let submission = state
    .store
    .insert_submission(NewSubmission {
      session_id: session.id,
      user_answer: req.user_answer,
      is_correct,
      feedback_text: feedback.clone(),
    })
    .await?;
  info!(target: "answer", session_id = %session.id, submission_id = %submission.id, %is_correct, "Answer evaluated");

  Ok(AnswerOut { is_correct, feedback, correct_answer: session.correct_answer })
}

async fn feedback_text(
  state: &AppState,
  problem_text: &str,
  user_answer: f64,
  correct_answer: f64,
  is_correct: bool,
) -> String {
  if let Some(genai) = &state.genai {
    let request = GenerationRequest {
      prompt: feedback_prompt(&state.prompts.feedback_template, problem_text, user_answer, correct_answer, is_correct),
      temperature: state.generation.feedback_temperature,
      max_output_tokens: state.generation.feedback_max_tokens,
    };
    match genai.generate(&request).await {
      Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
      Ok(_) => warn!(target: "answer", "Empty feedback from model; using fallback feedback"),
      Err(e) => error!(target: "answer", backend = genai.name(), error = %e, "Feedback call failed; using fallback feedback"),
    }
  }
  fallback_feedback(state.picker.as_ref(), is_correct, correct_answer)
}

pub fn feedback_prompt(tpl: &str, problem_text: &str, user_answer: f64, correct_answer: f64, is_correct: bool) -> String {
  let user = format_answer(user_answer);
  let correct = format_answer(correct_answer);
  fill_template(
    tpl,
    &[
      ("problem_text", problem_text),
      ("user_answer", &user),
      ("correct_answer", &correct),
      ("verdict", if is_correct { "correct" } else { "incorrect" }),
    ],
  )
}
