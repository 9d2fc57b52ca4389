//! Domain models: curriculum topics, generated problems, sessions and submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty band attached to a curriculum topic.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
    }
  }
}

/// Dominant arithmetic operation of a topic.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
  Addition,
  Subtraction,
  Multiplication,
  Division,
  Mixed,
}

impl ProblemType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProblemType::Addition => "addition",
      ProblemType::Subtraction => "subtraction",
      ProblemType::Multiplication => "multiplication",
      ProblemType::Division => "division",
      ProblemType::Mixed => "mixed",
    }
  }
}

/// A teaching objective parsed from the curriculum document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumTopic {
  pub id: String,
  pub name: String,
  pub description: String,
  pub category: String,
  pub subcategory: String,
  pub difficulty: Difficulty,
  pub problem_type: ProblemType,
}

/// How the final answer of a problem is meant to be read.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
  #[default]
  Numeric,
  Table,
  Graph,
}

impl AnswerType {
  /// Case-insensitive lookup; `None` for anything outside the three known kinds.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "numeric" => Some(AnswerType::Numeric),
      "table" => Some(AnswerType::Table),
      "graph" => Some(AnswerType::Graph),
      _ => None,
    }
  }
}

/// A validated problem built from model output. Only `validate` constructs these.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeneratedProblem {
  pub problem_text: String,
  pub final_answer: f64,
  pub answer_type: AnswerType,
  pub hint: String,
  pub step_by_step: Vec<String>,
}

/// One generated problem awaiting answers.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProblemSession {
  pub id: String,
  pub problem_text: String,
  pub correct_answer: f64,
  pub created_at: DateTime<Utc>,
}

/// Input for recording an answer attempt.
#[derive(Clone, Debug)]
pub struct NewSubmission {
  pub session_id: String,
  pub user_answer: f64,
  pub is_correct: bool,
  pub feedback_text: String,
}

/// One recorded answer attempt against a session.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Submission {
  pub id: String,
  pub session_id: String,
  pub user_answer: f64,
  pub is_correct: bool,
  pub feedback_text: String,
  pub created_at: DateTime<Utc>,
}

/// A session together with its attempts (newest first), as listed in the history view.
#[derive(Clone, Debug)]
pub struct SessionHistory {
  pub session: ProblemSession,
  pub submissions: Vec<Submission>,
}

impl SessionHistory {
  pub fn correct_attempts(&self) -> usize {
    self.submissions.iter().filter(|s| s.is_correct).count()
  }

  pub fn total_attempts(&self) -> usize {
    self.submissions.len()
  }

  /// Percentage of correct attempts, rounded; 0 when nothing was submitted.
  pub fn score(&self) -> u32 {
    let total = self.total_attempts();
    if total == 0 {
      return 0;
    }
    ((self.correct_attempts() as f64 / total as f64) * 100.0).round() as u32
  }
}

/// Exact comparison against the stored answer; no tolerance band.
pub fn is_correct_answer(user_answer: f64, correct_answer: f64) -> bool {
  user_answer == correct_answer
}
