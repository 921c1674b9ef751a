//! Public HTTP request/response structs (serde ready).
//! Field names are part of the contract with the single-page UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Response of `POST /api/math-problem`.
#[derive(Debug, Serialize)]
pub struct ProblemOut {
    pub session_id: String,
    pub problem_text: String,
    /// Omitted when REVEAL_ANSWER_ON_GENERATE is off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<f64>,
}

/// Body of `POST /api/submit-answer`. Both fields are optional at the serde
/// level so that absence can be reported as a 400 with our own message.
#[derive(Debug, Default, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(rename = "userAnswer", default)]
    pub user_answer: Option<Value>,
}

/// A validated `AnswerIn`.
#[derive(Debug, PartialEq)]
pub struct AnswerRequest {
    pub session_id: String,
    pub user_answer: f64,
}

const MISSING_FIELDS: &str = "Session ID and user answer are required";

impl AnswerIn {
    /// Reject missing/null/empty fields and coerce the answer to a finite number.
    pub fn validate(self) -> Result<AnswerRequest, AppError> {
        let session_id = match self.session_id {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Err(AppError::BadRequest(MISSING_FIELDS.into())),
        };
        let user_answer = match self.user_answer {
            None | Some(Value::Null) => return Err(AppError::BadRequest(MISSING_FIELDS.into())),
            Some(v) => coerce_number(&v)
                .ok_or_else(|| AppError::BadRequest("User answer must be a number".into()))?,
        };
        Ok(AnswerRequest { session_id, user_answer })
    }
}

/// JSON number, or a string holding one. Non-finite values are refused.
fn coerce_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Response of `POST /api/submit-answer`.
#[derive(Debug, Serialize)]
pub struct AnswerOut {
    pub is_correct: bool,
    pub feedback: String,
    pub correct_answer: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
