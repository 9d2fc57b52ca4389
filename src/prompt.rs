//! Prompt assembly for problem generation and answer feedback.
//!
//! Problem prompt layout: base instruction, then (optionally) a topic clause, then the
//! output contract. Everything is plain templating over `Prompts`; no randomness here.

use crate::config::Prompts;
use crate::curriculum::is_data_topic;
use crate::domain::CurriculumTopic;
use crate::util::fill_template;

pub fn build_problem_prompt(prompts: &Prompts, topic: Option<&CurriculumTopic>) -> String {
  let mut out = prompts.problem_base.trim().to_string();

  if let Some(t) = topic {
    let template = if is_data_topic(t) { &prompts.data_topic_template } else { &prompts.topic_template };
    let clause = fill_template(
      template,
      &[
        ("name", t.name.as_str()),
        ("category", t.category.as_str()),
        ("subcategory", t.subcategory.as_str()),
        ("description", t.description.as_str()),
        ("difficulty", t.difficulty.as_str()),
        ("problem_type", t.problem_type.as_str()),
      ],
    );
    out.push_str("\n\n");
    out.push_str(clause.trim());
  }

  out.push_str("\n\n");
  out.push_str(prompts.output_contract.trim());
  out
}

/// What the tutor needs to know about an attempt.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackContext<'a> {
  pub problem_text: &'a str,
  pub correct_answer: f64,
  pub user_answer: f64,
  pub is_correct: bool,
}

/// Tutor prompt for an attempt. For incorrect attempts the correct answer is left out
/// of the prompt entirely, so the model cannot echo it.
///
/// Answers render through `f64`'s `Display`, which already prints `28.0` as `28`.
pub fn build_feedback_prompt(prompts: &Prompts, ctx: &FeedbackContext<'_>) -> String {
  let user_answer = ctx.user_answer.to_string();
  if ctx.is_correct {
    let correct_answer = ctx.correct_answer.to_string();
    fill_template(
      &prompts.feedback_correct_template,
      &[
        ("problem_text", ctx.problem_text),
        ("correct_answer", correct_answer.as_str()),
        ("user_answer", user_answer.as_str()),
      ],
    )
  } else {
    fill_template(
      &prompts.feedback_incorrect_template,
      &[("problem_text", ctx.problem_text), ("user_answer", user_answer.as_str())],
    )
  }
}
