//! Public request/response structs for the HTTP API (serde ready).
//! Field names follow what the frontend already sends and reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{CurriculumTopic, Difficulty, GeneratedProblem, ProblemType, SessionHistory, Submission};
use crate::error::AppError;
use crate::validate::coerce_number;

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateIn {
  #[serde(default, rename = "curriculumTopicId")]
  pub curriculum_topic_id: Option<String>,
}

impl GenerateIn {
  /// Read the requested topic from a raw body, whatever its content type. An empty
  /// body or `null` asks for a generic problem; anything else must be a valid object.
  pub fn topic_from_body(body: &[u8]) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
      return Ok(None);
    }
    let parsed: Option<GenerateIn> = serde_json::from_slice(body)
      .map_err(|e| AppError::bad_request(format!("Invalid request body: {e}")))?;
    Ok(parsed.and_then(|b| b.curriculum_topic_id))
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct TopicsQuery {
  pub category: Option<String>,
}

/// Short description of the topic a problem was generated for.
#[derive(Debug, Serialize)]
pub struct TopicSummary {
  pub name: String,
  pub difficulty: Difficulty,
  pub problem_type: ProblemType,
}

impl From<&CurriculumTopic> for TopicSummary {
  fn from(t: &CurriculumTopic) -> Self {
    Self { name: t.name.clone(), difficulty: t.difficulty, problem_type: t.problem_type }
  }
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
  pub success: bool,
  pub problem: GeneratedProblem,
  pub session_id: String,
  pub curriculum_topic: Option<TopicSummary>,
}

/// Fields are untyped at the serde level so missing or mistyped ones become a 400 with
/// a readable message instead of a generic deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitIn {
  #[serde(default)]
  pub session_id: Option<Value>,
  #[serde(default)]
  pub user_answer: Option<Value>,
}

impl SubmitIn {
  /// Session id and numeric answer, or a client error.
  pub fn validated(self) -> Result<(String, f64), AppError> {
    let session_id = self
      .session_id
      .as_ref()
      .and_then(Value::as_str)
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string);
    let (Some(session_id), Some(raw_answer)) = (session_id, self.user_answer.filter(|v| !v.is_null())) else {
      return Err(AppError::bad_request("Missing session_id or user_answer"));
    };
    let answer = parse_user_answer(&raw_answer)
      .ok_or_else(|| AppError::bad_request("user_answer must be a number"))?;
    Ok((session_id, answer))
  }
}

/// Accept JSON numbers and numeric strings ("28", " 28.0 "); reject everything else.
pub fn parse_user_answer(v: &Value) -> Option<f64> {
  coerce_number(v)
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
  pub success: bool,
  pub is_correct: bool,
  pub feedback: String,
  pub submission_id: String,
}

#[derive(Debug, Serialize)]
pub struct TopicsOut {
  pub success: bool,
  pub topics: Vec<CurriculumTopic>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

impl HistoryQuery {
  /// Defaults 10/0; limit clamped to 1..=100, negative offsets become 0.
  pub fn bounds(&self) -> (u32, u32) {
    let limit = self
      .limit
      .map(|l| l.clamp(1, i64::from(MAX_HISTORY_LIMIT)) as u32)
      .unwrap_or(DEFAULT_HISTORY_LIMIT);
    let offset = self.offset.map(|o| o.clamp(0, i64::from(u32::MAX)) as u32).unwrap_or(0);
    (limit, offset)
  }
}

#[derive(Debug, Serialize)]
pub struct SessionOut {
  pub id: String,
  pub problem_text: String,
  pub correct_answer: f64,
  pub created_at: DateTime<Utc>,
  pub score: u32,
  pub correct_attempts: usize,
  pub total_attempts: usize,
  pub submissions: Vec<Submission>,
}

impl From<SessionHistory> for SessionOut {
  fn from(h: SessionHistory) -> Self {
    let score = h.score();
    let correct_attempts = h.correct_attempts();
    let total_attempts = h.total_attempts();
    Self {
      id: h.session.id,
      problem_text: h.session.problem_text,
      correct_answer: h.session.correct_answer,
      created_at: h.session.created_at,
      score,
      correct_attempts,
      total_attempts,
      submissions: h.submissions,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
  pub limit: u32,
  pub offset: u32,
  pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryOut {
  pub success: bool,
  pub sessions: Vec<SessionOut>,
  pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
