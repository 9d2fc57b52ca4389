//! Bounding the JSON object inside raw model output.
//!
//! Models often wrap the object in a fenced code block or surround it with commentary.
//! We strip one leading/trailing fence and return the span from the first `{` to the
//! last `}`. This is a heuristic: it is correct for a single object with brace-free
//! prose around it, and NOT guaranteed for multiple objects or for prose that itself
//! contains braces (e.g. a brace inside a sentence before the real object).

use crate::validate::ResponseError;

const FENCE: &str = "```";

/// Return the candidate JSON substring of `raw`. Does not parse it.
pub fn extract_json_object(raw: &str) -> Result<&str, ResponseError> {
  let text = strip_code_fence(raw);

  let start = text.find('{').ok_or(ResponseError::Extraction)?;
  let end = text.rfind('}').ok_or(ResponseError::Extraction)?;
  if end < start {
    return Err(ResponseError::Extraction);
  }
  Ok(&text[start..=end])
}

/// Drop a leading fence (with optional language tag, e.g. ```` ```json ````) and a
/// trailing fence. Text without fences is returned trimmed.
fn strip_code_fence(raw: &str) -> &str {
  let mut text = raw.trim();

  if let Some(rest) = text.strip_prefix(FENCE) {
    let tag_len = rest
      .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
      .unwrap_or(rest.len());
    text = &rest[tag_len..];
  }
  if let Some(rest) = text.trim_end().strip_suffix(FENCE) {
    text = rest;
  }
  text.trim()
}
