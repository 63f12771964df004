use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// What the external service is asked to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  /// Free-form text, e.g. an expanded prompt.
  Text,
  Palette,
  Typography,
  Image,
  /// Markup for an application screen.
  Screen,
}

impl Operation {
  pub fn as_str(&self) -> &'static str {
    match self {
      Operation::Text => "text",
      Operation::Palette => "palette",
      Operation::Typography => "typography",
      Operation::Image => "image",
      Operation::Screen => "screen",
    }
  }
}

/// A single call to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
  pub operation: Operation,
  pub prompt: String,
  /// Operation-specific parameters (aspect ratio, style, ...).
  #[serde(default)]
  pub params: serde_json::Value,
}

impl GenerationRequest {
  pub fn new(operation: Operation, prompt: impl Into<String>) -> Self {
    Self {
      operation,
      prompt: prompt.into(),
      params: serde_json::Value::Object(serde_json::Map::new()),
    }
  }

  /// Set one parameter. `None` values are skipped.
  pub fn with_param<V: Serialize>(mut self, key: &str, value: Option<V>) -> Self {
    if let (Some(value), Some(params)) = (value, self.params.as_object_mut()) {
      if let Ok(value) = serde_json::to_value(value) {
        params.insert(key.to_string(), value);
      }
    }
    self
  }
}

/// The external generation service.
///
/// Implementations classify failures through [`ServiceError`]; retrying is
/// the caller's concern, not the service's.
#[async_trait]
pub trait GenerationService: Send + Sync {
  async fn generate(&self, request: &GenerationRequest) -> Result<serde_json::Value, ServiceError>;
}
