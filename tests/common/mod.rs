#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use mathcoach_backend::config::{Prompts, Sampling};
use mathcoach_backend::curriculum::CurriculumCatalog;
use mathcoach_backend::llm::{ModelError, ModelTier, TextModel};
use mathcoach_backend::store::{ProblemStore, SqliteStore};
use mathcoach_backend::{build_router, AppState};

pub const CURRICULUM: &str = "\
## NUMBER AND ALGEBRA
### SUB-STRAND: WHOLE NUMBERS
1. Multiplying by 2-digit numbers
1.1 reading and writing numbers
## STATISTICS
### SUB-STRAND: DATA REPRESENTATION
2. Interpreting tables
";

pub const PROBLEM_JSON: &str = r#"{
  "problem_text": "Sarah has 24 stickers. She gives 8 stickers to her friend and buys 12 more stickers. How many stickers does Sarah have now?",
  "final_answer": 28,
  "hint": "First subtract, then add.",
  "step_by_step": ["Step 1: 24 - 8 = 16", "", "Step 2: 16 + 12 = 28"]
}"#;

/// A call the scripted model received.
#[derive(Debug, Clone)]
pub struct Call {
  pub tier: ModelTier,
  pub system: String,
  pub user: String,
}

/// Replays queued replies in order and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedModel {
  replies: Mutex<VecDeque<Result<String, u16>>>,
  pub calls: Mutex<Vec<Call>>,
}

impl ScriptedModel {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn reply(&self, text: &str) {
    self.replies.lock().unwrap().push_back(Ok(text.to_string()));
  }

  pub fn fail(&self, status: u16) {
    self.replies.lock().unwrap().push_back(Err(status));
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl TextModel for ScriptedModel {
  fn model_name(&self, _tier: ModelTier) -> &str {
    "scripted"
  }

  async fn complete(&self, tier: ModelTier, system: &str, user: &str, _temperature: f32) -> Result<String, ModelError> {
    self.calls.lock().unwrap().push(Call { tier, system: system.to_string(), user: user.to_string() });
    match self.replies.lock().unwrap().pop_front() {
      Some(Ok(text)) => Ok(text),
      Some(Err(status)) => Err(ModelError::Status { status, message: "scripted failure".into() }),
      None => Err(ModelError::Empty),
    }
  }
}

pub struct TestApp {
  pub router: Router,
  pub model: Arc<ScriptedModel>,
  pub store: Arc<SqliteStore>,
}

pub async fn create_test_app() -> TestApp {
  create_test_app_with(|state| build_router(state)).await
}

/// Like `create_test_app` but lets the caller pick how the router is built.
pub async fn create_test_app_with(make_router: impl FnOnce(Arc<AppState>) -> Router) -> TestApp {
  let model = ScriptedModel::new();
  let store = Arc::new(SqliteStore::in_memory().await.unwrap());
  let state = AppState::new(
    Some(model.clone() as Arc<dyn TextModel>),
    store.clone(),
    Arc::new(CurriculumCatalog::from_markdown(CURRICULUM)),
    Prompts::default(),
    Sampling::default(),
  );
  TestApp { router: make_router(Arc::new(state)), model, store }
}

pub async fn create_app_without_model() -> Router {
  let store = Arc::new(SqliteStore::in_memory().await.unwrap());
  let state = AppState::new(
    None,
    store,
    Arc::new(CurriculumCatalog::from_path("/definitely/not/here.md")),
    Prompts::default(),
    Sampling::default(),
  );
  build_router(Arc::new(state))
}

/// Submissions stored across every session, read back through the history listing.
pub async fn stored_submissions(store: &SqliteStore) -> usize {
  let history = store.list_history(100, 0).await.unwrap();
  history.iter().map(|h| h.total_attempts()).sum()
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let response = router.clone().oneshot(req).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, json)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}
