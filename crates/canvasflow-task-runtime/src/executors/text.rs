use async_trait::async_trait;
use canvasflow_config::{AspectRatio, NodeConfig, NodeDef, NodeKind};
use serde::{Deserialize, Serialize};

use super::{config_mismatch, to_output};
use crate::error::TaskError;
use crate::executor::NodeExecutor;
use crate::input::InputBundle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOutput {
  pub text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub aspect_ratio: Option<AspectRatio>,
}

/// Emits the configured literal. Inputs are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExecutor;

#[async_trait]
impl NodeExecutor for TextExecutor {
  fn kind(&self) -> NodeKind {
    NodeKind::Text
  }

  async fn execute(
    &self,
    node: &NodeDef,
    _inputs: &InputBundle,
  ) -> Result<serde_json::Value, TaskError> {
    let NodeConfig::Text(config) = &node.config else {
      return Err(config_mismatch(&node.id, "text"));
    };

    to_output(&TextOutput {
      text: config.value.clone(),
      aspect_ratio: config.aspect_ratio,
    })
  }
}
