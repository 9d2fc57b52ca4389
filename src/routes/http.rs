//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures become the `{success: false, error}` envelope.

use std::sync::Arc;
use axum::{
  body::Bytes,
  extract::{rejection::{BytesRejection, JsonRejection, QueryRejection}, Query, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// An empty body means "no topic". The body is read as JSON regardless of content type.
#[instrument(level = "info", skip(state, body))]
pub async fn http_generate_problem(
  State(state): State<Arc<AppState>>,
  body: Result<Bytes, BytesRejection>,
) -> Result<Json<GenerateOut>, AppError> {
  let topic_id = GenerateIn::topic_from_body(&body?)?;
  let out = generate_problem(&state, topic_id.as_deref()).await?;
  info!(target: "problem", session_id = %out.session_id, "HTTP problem served");
  Ok(Json(GenerateOut {
    success: true,
    curriculum_topic: out.topic.as_ref().map(TopicSummary::from),
    problem: out.problem,
    session_id: out.session_id,
  }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_submit_answer(
  State(state): State<Arc<AppState>>,
  body: Result<Json<SubmitIn>, JsonRejection>,
) -> Result<Json<SubmitOut>, AppError> {
  let Json(body) = body?;
  let (session_id, user_answer) = body.validated()?;
  let out = submit_answer(&state, &session_id, user_answer).await?;
  info!(target: "problem", %session_id, is_correct = out.is_correct, "HTTP submission evaluated");
  Ok(Json(SubmitOut {
    success: true,
    is_correct: out.is_correct,
    feedback: out.feedback,
    submission_id: out.submission_id,
  }))
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_curriculum_topics(
  State(state): State<Arc<AppState>>,
  q: Result<Query<TopicsQuery>, QueryRejection>,
) -> Result<Json<TopicsOut>, AppError> {
  let Query(q) = q?;
  let topics = list_topics(&state, q.category.as_deref())?;
  Ok(Json(TopicsOut { success: true, topics }))
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_problem_history(
  State(state): State<Arc<AppState>>,
  q: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryOut>, AppError> {
  let Query(q) = q?;
  let (limit, offset) = q.bounds();
  let sessions: Vec<SessionOut> = problem_history(&state, limit, offset).await?.into_iter().map(SessionOut::from).collect();
  let has_more = sessions.len() == limit as usize;
  Ok(Json(HistoryOut { success: true, sessions, pagination: Pagination { limit, offset, has_more } }))
}
