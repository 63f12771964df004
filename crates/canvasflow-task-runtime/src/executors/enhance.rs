use async_trait::async_trait;
use canvasflow_config::{NodeConfig, NodeDef, NodeKind};
use canvasflow_host_http::{GenerationRequest, Operation, RetryableCaller, ServiceError};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MIN_PROMPT_CHARS, config_mismatch, response_text, to_output};
use crate::error::TaskError;
use crate::executor::NodeExecutor;
use crate::input::{InputBundle, find_prompt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedPrompt {
  pub detailed_prompt: String,
  pub original_prompt: String,
}

/// Expands a short prompt into a detailed one through the text service.
#[derive(Clone)]
pub struct PromptEnhancerExecutor {
  caller: RetryableCaller,
}

impl PromptEnhancerExecutor {
  pub fn new(caller: RetryableCaller) -> Self {
    Self { caller }
  }
}

/// Render the author's instruction template. The context is the input
/// bundle plus `prompt`, the extracted prompt text.
fn render_instructions(
  template: &str,
  inputs: &InputBundle,
  prompt: &str,
) -> Result<String, TaskError> {
  let mut context = inputs.to_value();
  if let Some(map) = context.as_object_mut() {
    map.insert("prompt".to_string(), serde_json::Value::from(prompt));
  }

  Environment::new()
    .render_str(template, context)
    .map_err(|e| TaskError::Template {
      message: e.to_string(),
    })
}

#[async_trait]
impl NodeExecutor for PromptEnhancerExecutor {
  fn kind(&self) -> NodeKind {
    NodeKind::PromptEnhancer
  }

  async fn execute(
    &self,
    node: &NodeDef,
    inputs: &InputBundle,
  ) -> Result<serde_json::Value, TaskError> {
    let NodeConfig::PromptEnhancer(config) = &node.config else {
      return Err(config_mismatch(&node.id, "prompt_enhancer"));
    };

    let original = find_prompt(inputs, "prompt", MIN_PROMPT_CHARS)?;
    let instruction = match &config.instructions {
      Some(template) => render_instructions(template, inputs, &original)?,
      None => original.clone(),
    };
    debug!(node_id = %node.id, instruction = %instruction, "expanding prompt");

    let request = GenerationRequest::new(Operation::Text, instruction)
      .with_param("style", config.style.as_deref());
    let response = self.caller.call(&request).await?;

    let detailed = response_text(&response)
      .ok_or_else(|| ServiceError::invalid_response("text response carried no text"))?;

    to_output(&EnhancedPrompt {
      detailed_prompt: detailed,
      original_prompt: original,
    })
  }
}
