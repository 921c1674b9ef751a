//! Turning free-form model output into a validated `NewProblem`.
//!
//! Strict parse of the whole reply first; if that fails, the first balanced
//! `{...}` object in the text (models like to wrap JSON in prose or code
//! fences). A malformed object is rejected outright, never patched up.

use serde_json::Value;
use thiserror::Error;

use crate::domain::NewProblem;

#[derive(Error, Debug, PartialEq)]
pub enum ProblemParseError {
  #[error("no JSON object in model output")]
  NoObject,

  #[error("invalid JSON: {0}")]
  InvalidJson(String),

  #[error("problem_text missing or empty")]
  MissingText,

  #[error("correct_answer missing or not a finite number")]
  InvalidAnswer,
}

pub fn parse_problem(raw: &str) -> Result<NewProblem, ProblemParseError> {
  let trimmed = raw.trim();
  let value = match serde_json::from_str::<Value>(trimmed) {
    Ok(v @ Value::Object(_)) => v,
    _ => {
      let candidate = first_json_object(trimmed).ok_or(ProblemParseError::NoObject)?;
      serde_json::from_str::<Value>(candidate).map_err(|e| ProblemParseError::InvalidJson(e.to_string()))?
    }
  };
  validate(&value)
}

fn validate(value: &Value) -> Result<NewProblem, ProblemParseError> {
  let problem_text = match value.get("problem_text") {
    Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
    _ => return Err(ProblemParseError::MissingText),
  };
  let correct_answer = match value.get("correct_answer") {
    Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).ok_or(ProblemParseError::InvalidAnswer)?,
    _ => return Err(ProblemParseError::InvalidAnswer),
  };
  Ok(NewProblem { problem_text, correct_answer })
}

/// First balanced `{...}` slice of `text`. Braces inside JSON string literals
/// (including escaped quotes) do not count towards the balance.
pub fn first_json_object(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (offset, ch) in text[start..].char_indices() {
    if in_string {
      match ch {
        _ if escaped => escaped = false,
        '\\' => escaped = true,
        '"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match ch {
      '"' => in_string = true,
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Some(&text[start..start + offset + 1]);
        }
      }
      _ => {}
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strict_object_is_returned_unmodified() {
    let p = parse_problem(r#"{"problem_text": "  A bus has 12 seats.  ", "correct_answer": 12}"#).unwrap();
    assert_eq!(p.problem_text, "  A bus has 12 seats.  ");
    assert_eq!(p.correct_answer, 12.0);
  }

  #[test]
  fn object_inside_code_fence_and_prose() {
    let raw = "Sure! Here it is:\n```json\n{\"problem_text\": \"Ali has {3} cakes.\", \"correct_answer\": 2.25}\n```\nEnjoy {not json}";
    let p = parse_problem(raw).unwrap();
    assert_eq!(p.problem_text, "Ali has {3} cakes.");
    assert_eq!(p.correct_answer, 2.25);
  }

  #[test]
  fn escaped_quotes_do_not_break_balance() {
    let raw = r#"x {"problem_text": "She said \"}\" twice", "correct_answer": 1.5} y"#;
    assert_eq!(
      first_json_object(raw),
      Some(r#"{"problem_text": "She said \"}\" twice", "correct_answer": 1.5}"#)
    );
  }

  #[test]
  fn nested_objects_are_kept_whole() {
    let raw = r#"{"problem_text": "t", "meta": {"topic": "ratio"}, "correct_answer": 15}"#;
    assert_eq!(first_json_object(&format!("pre {raw} post")), Some(raw));
  }

  #[test]
  fn no_object_is_reported() {
    assert_eq!(parse_problem("I cannot help with that."), Err(ProblemParseError::NoObject));
    assert_eq!(parse_problem(""), Err(ProblemParseError::NoObject));
    assert_eq!(parse_problem("{ unterminated"), Err(ProblemParseError::NoObject));
  }

  #[test]
  fn malformed_object_is_not_repaired() {
    let err = parse_problem(r#"{"problem_text": "x", "correct_answer": 3,}"#).unwrap_err();
    assert!(matches!(err, ProblemParseError::InvalidJson(_)));
  }

  #[test]
  fn missing_or_blank_text_is_rejected() {
    assert_eq!(parse_problem(r#"{"correct_answer": 3}"#), Err(ProblemParseError::MissingText));
    assert_eq!(parse_problem(r#"{"problem_text": "   ", "correct_answer": 3}"#), Err(ProblemParseError::MissingText));
    assert_eq!(parse_problem(r#"{"problem_text": 7, "correct_answer": 3}"#), Err(ProblemParseError::MissingText));
  }

  #[test]
  fn non_numeric_answer_is_rejected() {
    assert_eq!(parse_problem(r#"{"problem_text": "x", "correct_answer": "3"}"#), Err(ProblemParseError::InvalidAnswer));
    assert_eq!(parse_problem(r#"{"problem_text": "x", "correct_answer": null}"#), Err(ProblemParseError::InvalidAnswer));
    assert_eq!(parse_problem(r#"{"problem_text": "x"}"#), Err(ProblemParseError::InvalidAnswer));
  }

  #[test]
  fn top_level_array_falls_through_to_embedded_object() {
    let p = parse_problem(r#"[{"problem_text": "x", "correct_answer": 4}]"#).unwrap();
    assert_eq!(p.correct_answer, 4.0);
  }
}
