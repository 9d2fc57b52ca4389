//! Persistence of problem sessions and submissions.
//!
//! `ProblemStore` is the contract the request logic depends on; `SqliteStore` is the
//! sqlx-backed implementation. Timestamps are stored as fixed-width RFC 3339 UTC text
//! so lexical order equals chronological order.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{NewSubmission, ProblemSession, SessionHistory, Submission};

const SCHEMA: &[&str] = &[
  r#"CREATE TABLE IF NOT EXISTS math_problem_sessions (
       id TEXT PRIMARY KEY NOT NULL,
       problem_text TEXT NOT NULL,
       correct_answer REAL NOT NULL,
       created_at TEXT NOT NULL
     )"#,
  r#"CREATE TABLE IF NOT EXISTS math_problem_submissions (
       id TEXT PRIMARY KEY NOT NULL,
       session_id TEXT NOT NULL REFERENCES math_problem_sessions(id) ON DELETE CASCADE,
       user_answer REAL NOT NULL,
       is_correct INTEGER NOT NULL,
       feedback_text TEXT NOT NULL,
       created_at TEXT NOT NULL
     )"#,
  r#"CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON math_problem_sessions(created_at)"#,
  r#"CREATE INDEX IF NOT EXISTS idx_submissions_session ON math_problem_submissions(session_id, created_at)"#,
];

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
  #[error("corrupt timestamp {value:?} in {table}")]
  Timestamp { table: &'static str, value: String },
}

#[async_trait]
pub trait ProblemStore: Send + Sync {
  async fn create_session(&self, problem_text: &str, correct_answer: f64) -> Result<ProblemSession, StoreError>;

  async fn get_session(&self, id: &str) -> Result<Option<ProblemSession>, StoreError>;

  /// Callers must have resolved the session first; the foreign key rejects orphans.
  async fn create_submission(&self, input: NewSubmission) -> Result<Submission, StoreError>;

  /// Sessions newest first, each with its submissions newest first.
  async fn list_history(&self, limit: u32, offset: u32) -> Result<Vec<SessionHistory>, StoreError>;
}

#[derive(Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Open (creating if missing) the database at `url` and ensure the schema exists.
  #[instrument(level = "info")]
  pub async fn connect(url: &str) -> Result<Self, StoreError> {
    let in_memory = url.contains(":memory:");
    let options = SqliteConnectOptions::from_str(url)?
      .create_if_missing(true)
      .foreign_keys(true)
      .busy_timeout(Duration::from_secs(30));
    let options = if in_memory { options } else { options.journal_mode(SqliteJournalMode::Wal) };

    // Every in-memory connection is its own database, so pin it to one.
    let pool_options = if in_memory {
      SqlitePoolOptions::new().max_connections(1).idle_timeout(None::<Duration>).max_lifetime(None::<Duration>)
    } else {
      SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_options.connect_with(options).await?;

    let store = Self { pool };
    store.ensure_schema().await?;
    info!(target: "mathcoach_backend", in_memory, "Database ready");
    Ok(store)
  }

  pub async fn in_memory() -> Result<Self, StoreError> {
    Self::connect("sqlite::memory:").await
  }

  async fn ensure_schema(&self) -> Result<(), StoreError> {
    for stmt in SCHEMA {
      sqlx::query(stmt).execute(&self.pool).await?;
    }
    Ok(())
  }
}

#[async_trait]
impl ProblemStore for SqliteStore {
  #[instrument(level = "debug", skip(self, problem_text), fields(text_len = problem_text.len()))]
  async fn create_session(&self, problem_text: &str, correct_answer: f64) -> Result<ProblemSession, StoreError> {
    let session = ProblemSession {
      id: Uuid::new_v4().to_string(),
      problem_text: problem_text.to_string(),
      correct_answer,
      created_at: now(),
    };

    sqlx::query(
      "INSERT INTO math_problem_sessions (id, problem_text, correct_answer, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(&session.problem_text)
    .bind(session.correct_answer)
    .bind(ts(&session.created_at))
    .execute(&self.pool)
    .await?;

    debug!(target: "problem", id = %session.id, "Session stored");
    Ok(session)
  }

  #[instrument(level = "debug", skip(self))]
  async fn get_session(&self, id: &str) -> Result<Option<ProblemSession>, StoreError> {
    let row = sqlx::query(
      "SELECT id, problem_text, correct_answer, created_at FROM math_problem_sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    row.as_ref().map(session_from_row).transpose()
  }

  #[instrument(level = "debug", skip(self, input), fields(session_id = %input.session_id))]
  async fn create_submission(&self, input: NewSubmission) -> Result<Submission, StoreError> {
    let submission = Submission {
      id: Uuid::new_v4().to_string(),
      session_id: input.session_id,
      user_answer: input.user_answer,
      is_correct: input.is_correct,
      feedback_text: input.feedback_text,
      created_at: now(),
    };

    sqlx::query(
      "INSERT INTO math_problem_submissions (id, session_id, user_answer, is_correct, feedback_text, created_at) \
       VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&submission.id)
    .bind(&submission.session_id)
    .bind(submission.user_answer)
    .bind(submission.is_correct)
    .bind(&submission.feedback_text)
    .bind(ts(&submission.created_at))
    .execute(&self.pool)
    .await?;

    Ok(submission)
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_history(&self, limit: u32, offset: u32) -> Result<Vec<SessionHistory>, StoreError> {
    let rows = sqlx::query(
      "SELECT id, problem_text, correct_answer, created_at FROM math_problem_sessions \
       ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
    )
    .bind(i64::from(limit))
    .bind(i64::from(offset))
    .fetch_all(&self.pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
      let session = session_from_row(row)?;
      let sub_rows = sqlx::query(
        "SELECT id, session_id, user_answer, is_correct, feedback_text, created_at \
         FROM math_problem_submissions WHERE session_id = ? ORDER BY created_at DESC, rowid DESC",
      )
      .bind(&session.id)
      .fetch_all(&self.pool)
      .await?;
      let submissions = sub_rows.iter().map(submission_from_row).collect::<Result<Vec<_>, _>>()?;
      out.push(SessionHistory { session, submissions });
    }
    Ok(out)
  }
}

/// Current time at the precision we persist.
fn now() -> DateTime<Utc> {
  Utc::now().trunc_subsecs(6)
}

fn ts(t: &DateTime<Utc>) -> String {
  t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(table: &'static str, value: String) -> Result<DateTime<Utc>, StoreError> {
  DateTime::parse_from_rfc3339(&value)
    .map(|t| t.with_timezone(&Utc))
    .map_err(|_| StoreError::Timestamp { table, value })
}

fn session_from_row(row: &SqliteRow) -> Result<ProblemSession, StoreError> {
  Ok(ProblemSession {
    id: row.try_get("id")?,
    problem_text: row.try_get("problem_text")?,
    correct_answer: row.try_get("correct_answer")?,
    created_at: parse_ts("math_problem_sessions", row.try_get("created_at")?)?,
  })
}

fn submission_from_row(row: &SqliteRow) -> Result<Submission, StoreError> {
  Ok(Submission {
    id: row.try_get("id")?,
    session_id: row.try_get("session_id")?,
    user_answer: row.try_get("user_answer")?,
    is_correct: row.try_get("is_correct")?,
    feedback_text: row.try_get("feedback_text")?,
    created_at: parse_ts("math_problem_submissions", row.try_get("created_at")?)?,
  })
}
