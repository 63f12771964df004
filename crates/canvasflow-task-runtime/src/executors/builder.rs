use async_trait::async_trait;
use canvasflow_config::{NodeConfig, NodeDef, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{config_mismatch, to_output};
use crate::error::TaskError;
use crate::executor::NodeExecutor;
use crate::input::InputBundle;

/// Shortest app description the builder accepts, after trimming.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// One screen to be rendered by a downstream screen node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedScreen {
  pub name: String,
  pub prompt: String,
}

/// The builder's output, consumed by per-screen nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPlan {
  pub description: String,
  pub screens: Vec<PlannedScreen>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub palette: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub typography: Option<Value>,
}

impl AppPlan {
  /// The named screen, or the first one when no name is given.
  pub fn screen(&self, name: Option<&str>) -> Option<&PlannedScreen> {
    match name {
      Some(name) => self.screens.iter().find(|s| s.name.eq_ignore_ascii_case(name)),
      None => self.screens.first(),
    }
  }
}

/// Validates screen selections and plans one render per screen.
///
/// Does no generation itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppBuilderExecutor;

#[async_trait]
impl NodeExecutor for AppBuilderExecutor {
  fn kind(&self) -> NodeKind {
    NodeKind::AppBuilder
  }

  async fn execute(&self, node: &NodeDef, inputs: &InputBundle) -> Result<Value, TaskError> {
    let NodeConfig::AppBuilder(config) = &node.config else {
      return Err(config_mismatch(&node.id, "app_builder"));
    };

    let screens: Vec<&str> = config
      .screens
      .iter()
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .collect();
    if screens.is_empty() {
      return Err(TaskError::configuration("select at least one screen"));
    }

    let description = config.description.trim();
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
      return Err(TaskError::configuration(format!(
        "app description must be at least {} characters",
        MIN_DESCRIPTION_CHARS
      )));
    }

    let plan = AppPlan {
      description: description.to_string(),
      screens: screens
        .into_iter()
        .map(|name| PlannedScreen {
          name: name.to_string(),
          prompt: format!("{} screen for: {}", name, description),
        })
        .collect(),
      palette: inputs.get("palette").cloned(),
      typography: inputs.get("typography").cloned(),
    };

    to_output(&plan)
  }
}
