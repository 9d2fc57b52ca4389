//! Logging setup.
//!
//! `LOG_LEVEL` takes an `EnvFilter` directive string; `LOG_FORMAT=json` switches to
//! one JSON object per line. Problem generation and grading log under the `problem`
//! target, startup and storage under `mathcoach_backend`, and the HTTP layer under
//! `tower_http`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,problem=debug,mathcoach_backend=debug,tower_http=info,axum=info,sqlx=warn";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl LogFormat {
  /// Anything other than `json` (any case) is pretty output.
  pub fn parse(s: Option<&str>) -> Self {
    match s.map(str::trim) {
      Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
      _ => LogFormat::Pretty,
    }
  }
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
  directives
    .filter(|d| !d.trim().is_empty())
    .and_then(|d| EnvFilter::try_new(d).ok())
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
  let directives = std::env::var("LOG_LEVEL").ok();
  let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter_from(directives.as_deref()))
    .with_target(true)
    .with_file(true)
    .with_line_number(true);

  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}
