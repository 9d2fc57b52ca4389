//! Runtime configuration: environment variables plus an optional TOML file.
//!
//! Environment:
//!   PORT                : u16 (default 3000)
//!   DATABASE_URL        : sqlx SQLite url (default "sqlite:mathcoach.db?mode=rwc")
//!   CURRICULUM_PATH     : curriculum markdown (default "curriculum/primary-5-math.md")
//!   APP_CONFIG_PATH     : TOML file overriding prompts / temperatures
//!   OPENAI_API_KEY      : enables the language model when present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL   : default "gpt-4o-mini" (feedback)
//!   OPENAI_STRONG_MODEL : default "gpt-4o" (problem generation)
//!
//! TOML schema: see `FileConfig`; every key is optional.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:mathcoach.db?mode=rwc";
pub const DEFAULT_CURRICULUM_PATH: &str = "curriculum/primary-5-math.md";

/// Contents of the optional TOML file.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub sampling: Sampling,
}

/// Model temperatures per task.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Sampling {
  pub problem_temperature: f32,
  pub feedback_temperature: f32,
}

impl Default for Sampling {
  fn default() -> Self {
    Self { problem_temperature: 0.9, feedback_temperature: 0.4 }
  }
}

/// Prompt texts. Placeholders in `{braces}` are filled by `prompt`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub problem_system: String,
  pub problem_base: String,
  /// Keys: name, category, subcategory, description, difficulty, problem_type
  pub topic_template: String,
  /// Keys: name, category, subcategory, description, difficulty
  pub data_topic_template: String,
  pub output_contract: String,
  pub feedback_system: String,
  /// Keys: problem_text, correct_answer, user_answer
  pub feedback_correct_template: String,
  /// Keys: problem_text, user_answer
  pub feedback_incorrect_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      problem_system: "You are a math content generator for primary school students. Respond ONLY with strict JSON.".into(),
      problem_base: "Generate a Primary 5 level math word problem. The problem should be appropriate for 10-11 year old students and involve basic arithmetic operations (addition, subtraction, multiplication, or division).".into(),
      topic_template: "Create a math word problem specifically related to this Primary 5 curriculum topic:\n\nTopic: {name}\nCategory: {category}\nSubcategory: {subcategory}\nDescription: {description}\nDifficulty: {difficulty}\nProblem Type: {problem_type}\n\nMake the problem directly relevant to this specific mathematical concept. The difficulty should match the {difficulty} level.".into(),
      data_topic_template: "Create a data interpretation problem for this Primary 5 curriculum topic:\n\nTopic: {name}\nCategory: {category}\nSubcategory: {subcategory}\nDescription: {description}\nDifficulty: {difficulty}\n\nInclude a markdown table (header row, separator row, at least three data rows) with realistic figures inside problem_text, and ask a question that is answered by reading or combining values from the table. The final_answer must still be a single number. Set \"answer_type\" to \"table\".".into(),
      output_contract: OUTPUT_CONTRACT.into(),
      feedback_system: "You are a helpful, encouraging math tutor for Primary 5 students (ages 10-11).".into(),
      feedback_correct_template: "Original Problem: \"{problem_text}\"\nCorrect Answer: {correct_answer}\nStudent's Answer: {user_answer}\nIs Correct: true\n\nWrite personalized feedback for this student. Celebrate their success warmly and briefly explain why the method works. Be age-appropriate, 2-3 sentences long, with a warm and supportive tone.\n\nReturn only the feedback text, no additional formatting.".into(),
      feedback_incorrect_template: "Original Problem: \"{problem_text}\"\nStudent's Answer: {user_answer}\nIs Correct: false\n\nWrite personalized, encouraging feedback for this student. Gently guide them toward the right approach WITHOUT giving away the correct answer or the final result of any calculation. Be age-appropriate, 2-3 sentences long, with a warm and supportive tone.\n\nReturn only the feedback text, no additional formatting.".into(),
    }
  }
}

const OUTPUT_CONTRACT: &str = r#"IMPORTANT: You must respond with ONLY a valid JSON object. No additional text, explanations, or code fences.

Required JSON format:
{
  "problem_text": string, the word problem,
  "final_answer": number, the numeric answer (a JSON number, not a string),
  "answer_type": one of "numeric", "table", "graph",
  "hint": string, a helpful hint for students who are stuck,
  "step_by_step": array of strings, clear solution steps in order
}

Example:
{
  "problem_text": "Sarah has 24 stickers. She gives 8 stickers to her friend and buys 12 more stickers. How many stickers does Sarah have now?",
  "final_answer": 28,
  "answer_type": "numeric",
  "hint": "First subtract the stickers she gave away, then add the new stickers she bought.",
  "step_by_step": [
    "Step 1: Sarah starts with 24 stickers",
    "Step 2: She gives away 8 stickers: 24 - 8 = 16",
    "Step 3: She buys 12 more stickers: 16 + 12 = 28",
    "Step 4: Sarah has 28 stickers now"
  ]
}

Make sure:
- problem_text is engaging and age-appropriate for Primary 5 students
- final_answer is a number (not a string)
- answer_type is exactly one of "numeric", "table", "graph"
- step_by_step is a non-empty array of clear solution steps
- Respond with ONLY the JSON object, nothing else"#;

/// Everything the server needs at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub database_url: String,
  pub curriculum_path: PathBuf,
  pub prompts: Prompts,
  pub sampling: Sampling,
}

impl AppConfig {
  pub fn from_env() -> Self {
    let file = load_file_config_from_env().unwrap_or_default();
    let port = std::env::var("PORT")
      .ok()
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(DEFAULT_PORT);
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
    let curriculum_path = std::env::var("CURRICULUM_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from(DEFAULT_CURRICULUM_PATH));

    Self { port, database_url, curriculum_path, prompts: file.prompts, sampling: file.sampling }
  }
}

/// Attempt to load `FileConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_file_config(&s) {
      Ok(cfg) => {
        info!(target: "mathcoach_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mathcoach_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mathcoach_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_file_config(s: &str) -> Result<FileConfig, toml::de::Error> {
  toml::from_str::<FileConfig>(s)
}
