//! Request-level behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - generating a problem (prompt → model → extract/validate → store)
//!   - grading a submission and asking the model for tutoring feedback
//!   - listing curriculum topics and problem history
//!
//! Every step runs sequentially inside the request; any failure aborts the request.

use tracing::{debug, info, instrument, warn};

use crate::domain::{is_correct_answer, CurriculumTopic, GeneratedProblem, NewSubmission, SessionHistory};
use crate::error::AppError;
use crate::llm::ModelTier;
use crate::prompt::{build_feedback_prompt, build_problem_prompt, FeedbackContext};
use crate::state::AppState;
use crate::util::trunc_for_log;
use crate::validate::parse_problem;

#[derive(Debug)]
pub struct GeneratedOutcome {
  pub problem: GeneratedProblem,
  pub session_id: String,
  pub topic: Option<CurriculumTopic>,
}

#[derive(Debug)]
pub struct SubmissionOutcome {
  pub is_correct: bool,
  pub feedback: String,
  pub submission_id: String,
}

/// Look up the requested topic. Blank, unknown or unloadable topics fall back to a
/// generic problem rather than failing the request.
#[instrument(level = "debug", skip(state))]
fn resolve_topic(state: &AppState, topic_id: Option<&str>) -> Option<CurriculumTopic> {
  let id = topic_id.map(str::trim).filter(|s| !s.is_empty())?;
  match state.catalog.get(id) {
    Ok(Some(t)) => Some(t),
    Ok(None) => {
      warn!(target: "problem", topic_id = %id, "Unknown curriculum topic; generating a generic problem");
      None
    }
    Err(e) => {
      warn!(target: "problem", topic_id = %id, error = %e, "Curriculum unavailable; generating a generic problem");
      None
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn generate_problem(state: &AppState, topic_id: Option<&str>) -> Result<GeneratedOutcome, AppError> {
  let topic = resolve_topic(state, topic_id);
  let prompt = build_problem_prompt(&state.prompts, topic.as_ref());
  let model = state.model()?;

  let raw = model
    .complete(ModelTier::Strong, &state.prompts.problem_system, &prompt, state.sampling.problem_temperature)
    .await?;
  debug!(target: "problem", raw = %trunc_for_log(&raw, 500), "Raw model output");

  let problem = parse_problem(&raw).map_err(|e| {
    warn!(target: "problem", error = %e, raw = %trunc_for_log(&raw, 200), "Model output rejected");
    e
  })?;

  let session = state.store.create_session(&problem.problem_text, problem.final_answer).await?;
  info!(
    target: "problem",
    session_id = %session.id,
    topic = topic.as_ref().map(|t| t.id.as_str()).unwrap_or("-"),
    answer_type = ?problem.answer_type,
    steps = problem.step_by_step.len(),
    "Problem generated"
  );

  Ok(GeneratedOutcome { problem, session_id: session.id, topic })
}

/// Grade an answer against the stored session and record it with model feedback.
/// Unknown sessions are rejected before anything is written.
#[instrument(level = "info", skip(state))]
pub async fn submit_answer(state: &AppState, session_id: &str, user_answer: f64) -> Result<SubmissionOutcome, AppError> {
  let session = state
    .store
    .get_session(session_id)
    .await?
    .ok_or_else(|| AppError::not_found("Problem session not found"))?;

  let is_correct = is_correct_answer(user_answer, session.correct_answer);
  let feedback = generate_feedback(
    state,
    &FeedbackContext {
      problem_text: &session.problem_text,
      correct_answer: session.correct_answer,
      user_answer,
      is_correct,
    },
  )
  .await?;

  let submission = state
    .store
    .create_submission(NewSubmission {
      session_id: session.id.clone(),
      user_answer,
      is_correct,
      feedback_text: feedback.clone(),
    })
    .await?;
  info!(target: "problem", session_id = %session.id, submission_id = %submission.id, %is_correct, "Answer evaluated");

  Ok(SubmissionOutcome { is_correct, feedback, submission_id: submission.id })
}

#[instrument(level = "info", skip(state, ctx), fields(is_correct = ctx.is_correct))]
pub async fn generate_feedback(state: &AppState, ctx: &FeedbackContext<'_>) -> Result<String, AppError> {
  let prompt = build_feedback_prompt(&state.prompts, ctx);
  let text = state
    .model()?
    .complete(ModelTier::Fast, &state.prompts.feedback_system, &prompt, state.sampling.feedback_temperature)
    .await?;
  Ok(text.trim().to_string())
}

/// All topics, or those of one category when `category` is non-blank.
#[instrument(level = "debug", skip(state))]
pub fn list_topics(state: &AppState, category: Option<&str>) -> Result<Vec<CurriculumTopic>, AppError> {
  match category.map(str::trim).filter(|c| !c.is_empty()) {
    Some(c) => Ok(state.catalog.by_category(c)?),
    None => Ok(state.catalog.topics()?.as_ref().clone()),
  }
}

#[instrument(level = "debug", skip(state))]
pub async fn problem_history(state: &AppState, limit: u32, offset: u32) -> Result<Vec<SessionHistory>, AppError> {
  Ok(state.store.list_history(limit, offset).await?)
}
