//! Application state shared by all handlers.
//!
//! This owns:
//!   - the optional language model (absent without OPENAI_API_KEY)
//!   - the problem store
//!   - the curriculum catalog (lazily loaded, cached for the process lifetime)
//!   - prompts and sampling settings (from TOML or defaults)
//!
//! Nothing in here is mutated after startup; handlers get it through `Arc<AppState>`.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{AppConfig, Prompts, Sampling};
use crate::curriculum::CurriculumCatalog;
use crate::llm::{ModelError, ModelTier, OpenAI, TextModel};
use crate::store::{ProblemStore, SqliteStore, StoreError};

pub struct AppState {
  pub model: Option<Arc<dyn TextModel>>,
  pub store: Arc<dyn ProblemStore>,
  pub catalog: Arc<CurriculumCatalog>,
  pub prompts: Prompts,
  pub sampling: Sampling,
}

impl AppState {
  pub fn new(
    model: Option<Arc<dyn TextModel>>,
    store: Arc<dyn ProblemStore>,
    catalog: Arc<CurriculumCatalog>,
    prompts: Prompts,
    sampling: Sampling,
  ) -> Self {
    Self { model, store, catalog, prompts, sampling }
  }

  /// Build state from configuration: open the database, point the catalog at the
  /// curriculum file and init the OpenAI client if a key is present.
  #[instrument(level = "info", skip_all)]
  pub async fn from_config(cfg: &AppConfig) -> Result<Self, StoreError> {
    let store = SqliteStore::connect(&cfg.database_url).await?;
    let catalog = CurriculumCatalog::from_path(&cfg.curriculum_path);

    // Warm the catalog so a broken curriculum file shows up in startup logs; requests
    // will retry the load if this fails.
    match catalog.topics() {
      Ok(t) => info!(target: "mathcoach_backend", topics = t.len(), "Curriculum available"),
      Err(e) => warn!(target: "mathcoach_backend", error = %e, "Curriculum not available yet"),
    }

    let model: Option<Arc<dyn TextModel>> = match OpenAI::from_env() {
      Some(oa) => {
        info!(target: "mathcoach_backend", base_url = %oa.base_url, fast_model = %oa.model_name(ModelTier::Fast), strong_model = %oa.model_name(ModelTier::Strong), "OpenAI enabled.");
        Some(Arc::new(oa))
      }
      None => {
        warn!(target: "mathcoach_backend", "OpenAI disabled (no OPENAI_API_KEY). Problem generation and feedback will fail.");
        None
      }
    };

    Ok(Self::new(model, Arc::new(store), Arc::new(catalog), cfg.prompts.clone(), cfg.sampling.clone()))
  }

  pub fn model(&self) -> Result<&dyn TextModel, ModelError> {
    self.model.as_deref().ok_or(ModelError::NotConfigured)
  }
}
