//! Math word-problem tutor backend.
//!
//! Generates Primary 5 math word problems with a language model, validates the model's
//! JSON, stores problems and student answers in SQLite, and serves a JSON API.

pub mod config;
pub mod curriculum;
pub mod domain;
pub mod error;
pub mod extract;
pub mod llm;
pub mod logic;
pub mod prompt;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
pub mod validate;

pub use routes::build_router;
pub use state::AppState;
