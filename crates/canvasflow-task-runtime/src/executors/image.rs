use async_trait::async_trait;
use canvasflow_config::{AspectRatio, NodeConfig, NodeDef, NodeKind};
use canvasflow_host_http::{GenerationRequest, Operation, RetryableCaller, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{MIN_PROMPT_CHARS, config_mismatch, string_field, to_output};
use crate::error::TaskError;
use crate::executor::NodeExecutor;
use crate::input::{InputBundle, find_prompt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
  pub image_url: String,
  /// The prompt the image was rendered from.
  pub prompt: String,
  pub aspect_ratio: AspectRatio,
}

/// Renders one image from an upstream prompt.
#[derive(Clone)]
pub struct ImageExecutor {
  caller: RetryableCaller,
}

impl ImageExecutor {
  pub fn new(caller: RetryableCaller) -> Self {
    Self { caller }
  }
}

/// Ask the image service for one image and return its URL.
pub(crate) async fn request_image(
  caller: &RetryableCaller,
  prompt: &str,
  aspect_ratio: AspectRatio,
  style: Option<&str>,
) -> Result<String, ServiceError> {
  let request = GenerationRequest::new(Operation::Image, prompt)
    .with_param("aspect_ratio", Some(aspect_ratio))
    .with_param("style", style);
  let response = caller.call(&request).await?;

  match &response {
    Value::String(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
    _ => string_field(&response, &["image_url", "imageUrl", "url"])
      .ok_or_else(|| ServiceError::invalid_response("image response carried no url")),
  }
}

/// An aspect ratio chosen upstream, e.g. on a text node.
fn upstream_aspect_ratio(inputs: &InputBundle) -> Option<AspectRatio> {
  inputs.iter().find_map(|(_, value)| {
    value
      .get("aspect_ratio")
      .or_else(|| value.get("aspectRatio"))
      .and_then(|v| serde_json::from_value(v.clone()).ok())
  })
}

#[async_trait]
impl NodeExecutor for ImageExecutor {
  fn kind(&self) -> NodeKind {
    NodeKind::Image
  }

  async fn execute(&self, node: &NodeDef, inputs: &InputBundle) -> Result<Value, TaskError> {
    let NodeConfig::Image(config) = &node.config else {
      return Err(config_mismatch(&node.id, "image"));
    };

    let prompt = find_prompt(inputs, "prompt", MIN_PROMPT_CHARS)?;
    let aspect_ratio = config
      .aspect_ratio
      .or_else(|| upstream_aspect_ratio(inputs))
      .unwrap_or_default();

    let image_url =
      request_image(&self.caller, &prompt, aspect_ratio, config.style.as_deref()).await?;
    info!(node_id = %node.id, image_url = %image_url, "image rendered");

    to_output(&ImageArtifact {
      image_url,
      prompt,
      aspect_ratio,
    })
  }
}
