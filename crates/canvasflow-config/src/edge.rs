use serde::{Deserialize, Serialize};

/// Feeds the target node's named input from the source node's named output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub source: String,
  #[serde(default = "default_source_handle")]
  pub source_handle: String,
  pub target: String,
  pub target_handle: String,
}

impl EdgeDef {
  pub fn new(
    source: impl Into<String>,
    source_handle: impl Into<String>,
    target: impl Into<String>,
    target_handle: impl Into<String>,
  ) -> Self {
    Self {
      source: source.into(),
      source_handle: source_handle.into(),
      target: target.into(),
      target_handle: target_handle.into(),
    }
  }
}

fn default_source_handle() -> String {
  "output".to_string()
}
