//! Built-in node executors, one per [`canvasflow_config::NodeKind`].

mod builder;
mod enhance;
mod image;
mod palette;
mod screen;
mod text;
mod typography;

use serde::Serialize;
use serde_json::Value;

use crate::error::TaskError;

pub use builder::{AppBuilderExecutor, AppPlan, MIN_DESCRIPTION_CHARS, PlannedScreen};
pub use enhance::{EnhancedPrompt, PromptEnhancerExecutor};
pub use image::{ImageArtifact, ImageExecutor};
pub use palette::{FALLBACK_PALETTE, Palette, PaletteExecutor};
pub use screen::{ImageStats, ScreenArtifact, ScreenExecutor};
pub use text::{TextExecutor, TextOutput};
pub use typography::{Typography, TypographyExecutor};

/// Shortest prompt an image or screen node accepts, after trimming.
pub const MIN_PROMPT_CHARS: usize = 3;

fn to_output<T: Serialize>(output: &T) -> Result<Value, TaskError> {
  serde_json::to_value(output).map_err(|e| TaskError::Serialization {
    message: e.to_string(),
  })
}

fn config_mismatch(node_id: &str, expected: &str) -> TaskError {
  TaskError::configuration(format!(
    "node '{}' was dispatched to the {} executor with a different config",
    node_id, expected
  ))
}

/// A string field of a service response, ignoring blank values.
fn string_field(value: &Value, names: &[&str]) -> Option<String> {
  names
    .iter()
    .filter_map(|name| value.get(*name).and_then(Value::as_str))
    .map(str::trim)
    .find(|s| !s.is_empty())
    .map(str::to_string)
}

/// Free text from a service response: a bare string or a `text`/`content` field.
fn response_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
    _ => string_field(value, &["text", "content"]),
  }
}
