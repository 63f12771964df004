use async_trait::async_trait;
use canvasflow_config::{NodeConfig, NodeDef, NodeKind};
use canvasflow_host_http::{GenerationRequest, Operation, RetryableCaller, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{config_mismatch, string_field, to_output};
use crate::error::TaskError;
use crate::executor::NodeExecutor;
use crate::input::{InputBundle, extract_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
  pub heading_font: String,
  pub body_font: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rationale: Option<String>,
}

/// Suggests a heading/body font pairing for a description or a palette.
#[derive(Clone)]
pub struct TypographyExecutor {
  caller: RetryableCaller,
}

impl TypographyExecutor {
  pub fn new(caller: RetryableCaller) -> Self {
    Self { caller }
  }
}

/// Describe the source for the service: its text, or the palette colors.
fn describe_source(source: &Value) -> Option<String> {
  if let Some(text) = extract_text(source).map(str::trim).filter(|s| !s.is_empty()) {
    return Some(text.to_string());
  }
  let colors: Vec<&str> = source
    .get("colors")?
    .as_array()?
    .iter()
    .filter_map(Value::as_str)
    .collect();
  (!colors.is_empty()).then(|| format!("A brand using the colors {}", colors.join(", ")))
}

#[async_trait]
impl NodeExecutor for TypographyExecutor {
  fn kind(&self) -> NodeKind {
    NodeKind::Typography
  }

  async fn execute(&self, node: &NodeDef, inputs: &InputBundle) -> Result<Value, TaskError> {
    let NodeConfig::Typography(config) = &node.config else {
      return Err(config_mismatch(&node.id, "typography"));
    };

    let source = inputs.require("source", "a description or a palette")?;
    let description = describe_source(source).ok_or_else(|| {
      TaskError::invalid_input(
        "source",
        "expected text or a palette with a non-empty colors list",
      )
    })?;

    let request = GenerationRequest::new(Operation::Typography, description)
      .with_param("tone", config.tone.as_deref());
    let response = self.caller.call(&request).await?;

    let (Some(heading_font), Some(body_font)) = (
      string_field(&response, &["heading_font", "headingFont"]),
      string_field(&response, &["body_font", "bodyFont"]),
    ) else {
      return Err(
        ServiceError::invalid_response("typography response needs heading_font and body_font")
          .into(),
      );
    };

    to_output(&Typography {
      heading_font,
      body_font,
      rationale: string_field(&response, &["rationale"]),
    })
  }
}
