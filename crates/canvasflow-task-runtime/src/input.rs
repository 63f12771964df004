//! Input bundles and prompt-shape adaptation.
//!
//! Upstream outputs arrive in different shapes: a literal node yields
//! `{ "text": ... }`, the prompt enhancer yields `{ "detailed_prompt": ... }`,
//! hand-written graphs may feed a bare string. Executors that need prompt
//! text go through [`find_prompt`] instead of sniffing shapes themselves.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::TaskError;

/// Object fields that may carry prompt text, most refined first.
const PROMPT_FIELDS: [&str; 5] = ["detailed_prompt", "detailedPrompt", "text", "value", "prompt"];

/// Resolved inputs of a node, keyed by target handle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputBundle(BTreeMap<String, Value>);

impl InputBundle {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a value, returning the one it replaced.
  pub fn insert(&mut self, handle: impl Into<String>, value: Value) -> Option<Value> {
    self.0.insert(handle.into(), value)
  }

  pub fn get(&self, handle: &str) -> Option<&Value> {
    self.0.get(handle)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  /// The value on `handle`, failing with a description of what was expected.
  pub fn require(&self, handle: &str, expected: &str) -> Result<&Value, TaskError> {
    self
      .get(handle)
      .ok_or_else(|| TaskError::missing_input(handle, expected))
  }

  pub fn to_value(&self) -> Value {
    Value::Object(self.0.clone().into_iter().collect())
  }
}

impl FromIterator<(String, Value)> for InputBundle {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

/// Text carried by a value: the value itself if it is a string, otherwise
/// the first non-blank string among the known prompt fields.
pub fn extract_text(value: &Value) -> Option<&str> {
  match value {
    Value::String(s) => Some(s.as_str()),
    Value::Object(map) => PROMPT_FIELDS
      .iter()
      .filter_map(|field| map.get(*field).and_then(Value::as_str))
      .find(|s| !s.trim().is_empty()),
    _ => None,
  }
}

/// Locate prompt text on `handle` and require at least `min_chars`
/// characters after trimming.
pub fn find_prompt(inputs: &InputBundle, handle: &str, min_chars: usize) -> Result<String, TaskError> {
  let value = inputs.require(
    handle,
    "a prompt string or an object with a text, value or detailed_prompt field",
  )?;

  let text = extract_text(value).map(str::trim).unwrap_or_default();
  if text.chars().count() < min_chars {
    return Err(TaskError::invalid_input(
      handle,
      format!(
        "expected a prompt of at least {} characters as a string or an object with a \
         text, value or detailed_prompt field",
        min_chars
      ),
    ));
  }

  Ok(text.to_string())
}
