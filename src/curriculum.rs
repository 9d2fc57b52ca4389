//! Curriculum catalog: topics parsed from a markdown document.
//!
//! Document layout:
//!   `## NUMBER AND ALGEBRA`          category (resets the sub-strand)
//!   `### SUB-STRAND: FRACTIONS`      subcategory
//!   `1. Adding fractions`            topic     -> id `topic-N`
//!   `1.1 like denominators`          sub-topic -> id `subtopic-N`
//! Items appearing before both a category and a sub-strand are ignored. Topic and
//! sub-topic ids share a single counter in document order.
//!
//! The catalog is read lazily on first use and kept for the process lifetime. Two
//! requests racing on the first load may both parse the file; the first stored result
//! wins and the other is discarded, which is harmless since parsing is pure.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{CurriculumTopic, Difficulty, ProblemType};

const EASY_KEYWORDS: &[&str] = &["reading", "writing", "basic", "simple", "counting", "comparing"];
const HARD_KEYWORDS: &[&str] = &[
  "percentage",
  "rate",
  "volume",
  "angles",
  "triangle",
  "parallelogram",
  "trapezium",
  "composite",
];

/// Markers identifying data-interpretation topics (matched case-insensitively against
/// the topic's subcategory and name).
pub const DATA_TOPIC_MARKERS: &[&str] = &["data representation", "table", "graph"];

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("failed to load curriculum topics from {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

pub struct CurriculumCatalog {
  path: PathBuf,
  topics: OnceLock<Arc<Vec<CurriculumTopic>>>,
}

impl CurriculumCatalog {
  /// Catalog backed by a markdown file, read on first access.
  pub fn from_path(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), topics: OnceLock::new() }
  }

  /// Catalog pre-populated from in-memory markdown.
  pub fn from_markdown(content: &str) -> Self {
    let topics = OnceLock::new();
    let _ = topics.set(Arc::new(parse_curriculum(content)));
    Self { path: PathBuf::new(), topics }
  }

  /// All topics, in document order. Failed reads are not cached.
  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  pub fn topics(&self) -> Result<Arc<Vec<CurriculumTopic>>, CatalogError> {
    if let Some(t) = self.topics.get() {
      return Ok(t.clone());
    }

    let content = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Read {
      path: self.path.display().to_string(),
      source,
    })?;
    let parsed = Arc::new(parse_curriculum(&content));
    info!(target: "mathcoach_backend", path = %self.path.display(), topics = parsed.len(), "Loaded curriculum topics");

    let _ = self.topics.set(parsed);
    Ok(self.topics.get().cloned().unwrap_or_default())
  }

  pub fn get(&self, topic_id: &str) -> Result<Option<CurriculumTopic>, CatalogError> {
    Ok(self.topics()?.iter().find(|t| t.id == topic_id).cloned())
  }

  /// Case-insensitive match on the strand name.
  pub fn by_category(&self, category: &str) -> Result<Vec<CurriculumTopic>, CatalogError> {
    Ok(self.topics()?.iter().filter(|t| t.category.eq_ignore_ascii_case(category)).cloned().collect())
  }
}

/// True for topics whose problems should be built around a data table.
pub fn is_data_topic(topic: &CurriculumTopic) -> bool {
  let sub = topic.subcategory.to_lowercase();
  let name = topic.name.to_lowercase();
  DATA_TOPIC_MARKERS.iter().any(|m| sub.contains(m) || name.contains(m))
}

pub fn parse_curriculum(content: &str) -> Vec<CurriculumTopic> {
  let mut topics = Vec::new();
  let mut category = String::new();
  let mut subcategory = String::new();
  let mut counter = 0usize;

  for line in content.lines() {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("### SUB-STRAND:") {
      subcategory = rest.trim().to_string();
    } else if let Some(rest) = line.strip_prefix("## ") {
      category = rest.trim().to_string();
      subcategory.clear();
    } else if let Some((kind, name)) = numbered_item(line) {
      if name.is_empty() || category.is_empty() || subcategory.is_empty() {
        continue;
      }
      counter += 1;
      let prefix = match kind {
        ItemKind::Topic => "topic",
        ItemKind::SubTopic => "subtopic",
      };
      topics.push(CurriculumTopic {
        id: format!("{prefix}-{counter}"),
        name: name.to_string(),
        description: format!("{subcategory}: {name}"),
        category: category.clone(),
        subcategory: subcategory.clone(),
        difficulty: classify_difficulty(name, &subcategory),
        problem_type: classify_problem_type(name),
      });
    }
  }

  topics
}

#[derive(Debug, PartialEq, Eq)]
enum ItemKind {
  Topic,
  SubTopic,
}

/// Split `"12. text"` or `"3.4 text"` into kind and trimmed text.
fn numbered_item(line: &str) -> Option<(ItemKind, &str)> {
  let rest = strip_digits(line)?.strip_prefix('.')?;
  match strip_digits(rest) {
    Some(after_minor) => Some((ItemKind::SubTopic, after_minor.trim_start_matches('.').trim())),
    None => Some((ItemKind::Topic, rest.trim())),
  }
}

/// Strip a non-empty run of ASCII digits; `None` if the text does not start with one.
fn strip_digits(s: &str) -> Option<&str> {
  let rest = s.trim_start_matches(|c: char| c.is_ascii_digit());
  (rest.len() < s.len()).then_some(rest)
}

fn classify_difficulty(name: &str, subcategory: &str) -> Difficulty {
  let name = name.to_lowercase();
  let sub = subcategory.to_lowercase();
  let hit = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k) || sub.contains(k));

  if hit(EASY_KEYWORDS) {
    Difficulty::Easy
  } else if hit(HARD_KEYWORDS) {
    Difficulty::Hard
  } else {
    Difficulty::Medium
  }
}

fn classify_problem_type(name: &str) -> ProblemType {
  let name = name.to_lowercase();
  let has = |a: &str, b: &str| name.contains(a) || name.contains(b);

  if has("adding", "addition") {
    ProblemType::Addition
  } else if has("subtracting", "subtraction") {
    ProblemType::Subtraction
  } else if has("multiplying", "multiplication") {
    ProblemType::Multiplication
  } else if has("dividing", "division") {
    ProblemType::Division
  } else {
    ProblemType::Mixed
  }
}
