//! Turning untrusted model output into a `GeneratedProblem`.
//!
//! Checks run in a fixed order and fail fast:
//!   1. candidate text must be valid JSON describing an object
//!   2. `problem_text` non-blank
//!   3. `final_answer` a finite number (numeric strings are coerced)
//!   4. `hint` non-blank
//!   5. `step_by_step` an array with at least one non-blank step
//!   6. `answer_type` defaults to `numeric`; unknown values are clamped to `numeric`

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{AnswerType, GeneratedProblem};
use crate::extract::extract_json_object;
use crate::util::trunc_for_log;

/// Per-field schema violations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
  #[error("response is not a JSON object")]
  NotAnObject,
  #[error("missing problem_text")]
  MissingProblemText,
  #[error("invalid final_answer")]
  InvalidFinalAnswer,
  #[error("missing hint")]
  MissingHint,
  #[error("missing step_by_step")]
  MissingStepByStep,
}

/// Why a model response could not become a problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponseError {
  #[error("no JSON object found")]
  Extraction,
  #[error("invalid JSON: {0}")]
  Parse(String),
  #[error("{0}")]
  Schema(#[from] SchemaError),
}

/// Full pipeline over raw model text: extract → parse → validate.
pub fn parse_problem(raw: &str) -> Result<GeneratedProblem, ResponseError> {
  let candidate = extract_json_object(raw)?;
  let value: Value = serde_json::from_str(candidate).map_err(|e| {
    debug!(target: "problem", candidate = %trunc_for_log(candidate, 300), "Candidate region is not valid JSON");
    ResponseError::Parse(e.to_string())
  })?;
  validate_problem(&value)
}

/// Validate and coerce an already-parsed JSON value.
pub fn validate_problem(value: &Value) -> Result<GeneratedProblem, ResponseError> {
  let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

  let problem_text = non_blank_str(obj, "problem_text").ok_or(SchemaError::MissingProblemText)?;
  let final_answer = obj
    .get("final_answer")
    .and_then(coerce_number)
    .ok_or(SchemaError::InvalidFinalAnswer)?;
  let hint = non_blank_str(obj, "hint").ok_or(SchemaError::MissingHint)?;
  let step_by_step = obj
    .get("step_by_step")
    .and_then(Value::as_array)
    .map(|items| items.iter().filter_map(coerce_step).collect::<Vec<_>>())
    .filter(|steps| !steps.is_empty())
    .ok_or(SchemaError::MissingStepByStep)?;
  let answer_type = answer_type_or_default(obj.get("answer_type"));

  Ok(GeneratedProblem { problem_text, final_answer, answer_type, hint, step_by_step })
}

fn non_blank_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
  obj
    .get(key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

/// Numbers pass through; numeric strings go through the locale-agnostic `f64` parser.
pub fn coerce_number(v: &Value) -> Option<f64> {
  let n = match v {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}

fn coerce_step(v: &Value) -> Option<String> {
  let s = match v {
    Value::Null => return None,
    Value::String(s) => s.trim().to_string(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    other => other.to_string(),
  };
  (!s.is_empty()).then_some(s)
}

fn answer_type_or_default(v: Option<&Value>) -> AnswerType {
  match v {
    None | Some(Value::Null) => AnswerType::default(),
    Some(Value::String(s)) => AnswerType::parse(s).unwrap_or_else(|| {
      warn!(target: "problem", answer_type = %s, "Unknown answer_type; clamping to numeric");
      AnswerType::default()
    }),
    Some(other) => {
      warn!(target: "problem", answer_type = %other, "Non-string answer_type; clamping to numeric");
      AnswerType::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn valid() -> Value {
    json!({
      "problem_text": "Sarah has 24 stickers. She gives 8 away and buys 12 more. How many now?",
      "final_answer": 28,
      "answer_type": "numeric",
      "hint": "Subtract first, then add.",
      "step_by_step": ["24 - 8 = 16", "16 + 12 = 28"]
    })
  }

  fn with(key: &str, v: Value) -> Value {
    let mut base = valid();
    base[key] = v;
    base
  }

  fn without(key: &str) -> Value {
    let mut base = valid();
    base.as_object_mut().unwrap().remove(key);
    base
  }

  fn schema_err(v: &Value) -> SchemaError {
    match validate_problem(v) {
      Err(ResponseError::Schema(e)) => e,
      other => panic!("expected schema error, got {other:?}"),
    }
  }

  #[test]
  fn accepts_valid_problem() {
    let p = validate_problem(&valid()).unwrap();
    assert_eq!(p.final_answer, 28.0);
    assert_eq!(p.answer_type, AnswerType::Numeric);
    assert_eq!(p.step_by_step.len(), 2);
  }

  #[test]
  fn rejects_non_object() {
    assert_eq!(schema_err(&json!([1, 2])), SchemaError::NotAnObject);
  }

  #[test]
  fn problem_text_must_be_present() {
    assert_eq!(schema_err(&without("problem_text")), SchemaError::MissingProblemText);
    assert_eq!(schema_err(&with("problem_text", json!("  "))), SchemaError::MissingProblemText);
  }

  #[test]
  fn numeric_string_answer_is_coerced() {
    let p = validate_problem(&with("final_answer", json!("42"))).unwrap();
    assert_eq!(p.final_answer, 42.0);
    let p = validate_problem(&with("final_answer", json!(" 2.50 "))).unwrap();
    assert_eq!(p.final_answer, 2.5);
  }

  #[test]
  fn invalid_answers_are_rejected() {
    for bad in [json!("abc"), json!("NaN"), json!("inf"), json!(null), json!(true), json!([28])] {
      assert_eq!(schema_err(&with("final_answer", bad)), SchemaError::InvalidFinalAnswer);
    }
    assert_eq!(schema_err(&without("final_answer")), SchemaError::InvalidFinalAnswer);
  }

  #[test]
  fn hint_must_be_present() {
    assert_eq!(schema_err(&with("hint", json!(""))), SchemaError::MissingHint);
  }

  #[test]
  fn blank_steps_are_dropped() {
    let p = validate_problem(&with("step_by_step", json!(["Step 1: x", "", "  ", "Step 2: y"]))).unwrap();
    assert_eq!(p.step_by_step, vec!["Step 1: x", "Step 2: y"]);
  }

  #[test]
  fn steps_are_coerced_to_strings() {
    let p = validate_problem(&with("step_by_step", json!([1, null, " two ", false]))).unwrap();
    assert_eq!(p.step_by_step, vec!["1", "two", "false"]);
  }

  #[test]
  fn empty_or_non_array_steps_are_rejected() {
    assert_eq!(schema_err(&with("step_by_step", json!(["", " "]))), SchemaError::MissingStepByStep);
    assert_eq!(schema_err(&with("step_by_step", json!("Step 1"))), SchemaError::MissingStepByStep);
    assert_eq!(schema_err(&without("step_by_step")), SchemaError::MissingStepByStep);
  }

  #[test]
  fn checks_run_in_order() {
    let v = json!({ "final_answer": "abc" });
    assert_eq!(schema_err(&v), SchemaError::MissingProblemText);
    let v = json!({ "problem_text": "p", "final_answer": "abc" });
    assert_eq!(schema_err(&v), SchemaError::InvalidFinalAnswer);
  }

  #[test]
  fn answer_type_defaults_and_clamps() {
    assert_eq!(validate_problem(&without("answer_type")).unwrap().answer_type, AnswerType::Numeric);
    assert_eq!(validate_problem(&with("answer_type", json!("Table"))).unwrap().answer_type, AnswerType::Table);
    assert_eq!(validate_problem(&with("answer_type", json!("pie chart"))).unwrap().answer_type, AnswerType::Numeric);
    assert_eq!(validate_problem(&with("answer_type", json!(3))).unwrap().answer_type, AnswerType::Numeric);
  }

  #[test]
  fn validation_is_idempotent() {
    let first = validate_problem(&with("step_by_step", json!([" a ", "", "b"]))).unwrap();
    let again = validate_problem(&serde_json::to_value(&first).unwrap()).unwrap();
    assert_eq!(first, again);
  }

  #[test]
  fn fenced_and_bare_responses_agree() {
    let bare = valid().to_string();
    let fenced = format!("Here you go!\n```json\n{bare}\n```");
    assert_eq!(parse_problem(&fenced).unwrap(), validate_problem(&valid()).unwrap());
  }

  #[test]
  fn malformed_candidate_is_a_parse_error() {
    assert!(matches!(parse_problem("{ problem_text: nope }"), Err(ResponseError::Parse(_))));
    assert_eq!(parse_problem("sorry, I can't"), Err(ResponseError::Extraction));
  }
}
