//! Request-boundary error type and the uniform `{success: false, error}` envelope.
//!
//! Client mistakes map to 400, unknown sessions to 404. Model, parsing, storage and
//! catalog failures are all treated as infrastructure failures (500); the client is
//! expected to resubmit the whole request.

use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::curriculum::CatalogError;
use crate::llm::ModelError;
use crate::store::StoreError;
use crate::validate::ResponseError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub success: bool,
  pub error: String,
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  NotFound(String),
  /// Extractor rejections (malformed JSON, oversized body) keep axum's status.
  #[error("{message}")]
  Rejected { status: StatusCode, message: String },
  #[error("failed to parse AI response: {0}")]
  Response(#[from] ResponseError),
  #[error("{0}")]
  Model(#[from] ModelError),
  #[error("{0}")]
  Storage(#[from] StoreError),
  #[error("{0}")]
  Catalog(#[from] CatalogError),
}

impl AppError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    AppError::BadRequest(message.into())
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    AppError::NotFound(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Rejected { status, .. } => *status,
      AppError::Response(_) | AppError::Model(_) | AppError::Storage(_) | AppError::Catalog(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

/// Bodies that are JSON but the wrong shape count as malformed input (400), like
/// syntax errors. Content-type and size rejections keep axum's status.
impl From<JsonRejection> for AppError {
  fn from(e: JsonRejection) -> Self {
    match e {
      JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => AppError::bad_request(e.body_text()),
      other => AppError::Rejected { status: other.status(), message: other.body_text() },
    }
  }
}

impl From<BytesRejection> for AppError {
  fn from(e: BytesRejection) -> Self {
    AppError::Rejected { status: e.status(), message: e.body_text() }
  }
}

impl From<QueryRejection> for AppError {
  fn from(e: QueryRejection) -> Self {
    AppError::Rejected { status: e.status(), message: e.body_text() }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(target: "mathcoach_backend", %status, error = %self, "Request failed");
    } else {
      tracing::info!(target: "mathcoach_backend", %status, error = %self, "Request rejected");
    }
    let body = ErrorResponse { success: false, error: self.to_string() };
    (status, Json(body)).into_response()
  }
}
