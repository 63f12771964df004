use async_trait::async_trait;
use canvasflow_config::{AspectRatio, NodeConfig, NodeDef, NodeKind};
use canvasflow_host_http::{GenerationRequest, Operation, RetryableCaller, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::builder::AppPlan;
use super::image::request_image;
use super::{MIN_PROMPT_CHARS, config_mismatch, string_field, to_output};
use crate::error::TaskError;
use crate::executor::NodeExecutor;
use crate::input::{InputBundle, find_prompt};
use crate::substitution::{SubKind, SubRequest, SubstitutionPipeline, analyze_placeholders};

/// How many of a screen's placeholders were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStats {
  pub succeeded: usize,
  pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenArtifact {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub screen_name: Option<String>,
  pub html: String,
  pub prompt: String,
  pub images: ImageStats,
}

/// Renders a screen's markup, then fills its image placeholders.
///
/// Placeholder images are best effort: the node succeeds with whatever
/// images rendered and reports the counts in [`ScreenArtifact::images`].
#[derive(Clone)]
pub struct ScreenExecutor {
  caller: RetryableCaller,
  pipeline: SubstitutionPipeline,
}

impl ScreenExecutor {
  pub fn new(caller: RetryableCaller, pipeline: SubstitutionPipeline) -> Self {
    Self { caller, pipeline }
  }
}

/// Sub-requests the screen service declared explicitly in its response.
fn declared_sub_requests(response: &Value) -> Vec<SubRequest> {
  response
    .get("images")
    .and_then(Value::as_array)
    .map(|entries| {
      entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<SubRequest>(entry.clone()).ok())
        .filter(|r| !r.token.is_empty() && !r.description.trim().is_empty())
        .collect()
    })
    .unwrap_or_default()
}

fn aspect_ratio_for(kind: SubKind) -> AspectRatio {
  match kind {
    SubKind::Image => AspectRatio::Landscape,
    SubKind::Icon => AspectRatio::Square,
  }
}

#[async_trait]
impl NodeExecutor for ScreenExecutor {
  fn kind(&self) -> NodeKind {
    NodeKind::Screen
  }

  async fn execute(&self, node: &NodeDef, inputs: &InputBundle) -> Result<Value, TaskError> {
    let NodeConfig::Screen(config) = &node.config else {
      return Err(config_mismatch(&node.id, "screen"));
    };

    let (screen_name, prompt, plan) = match inputs.get("plan") {
      Some(value) => {
        let plan: AppPlan = serde_json::from_value(value.clone())
          .map_err(|e| TaskError::invalid_input("plan", format!("not an app plan: {}", e)))?;
        let screen = plan.screen(config.screen_name.as_deref()).ok_or_else(|| {
          TaskError::invalid_input(
            "plan",
            format!(
              "plan has no screen named '{}'",
              config.screen_name.as_deref().unwrap_or_default()
            ),
          )
        })?;
        (Some(screen.name.clone()), screen.prompt.clone(), Some(plan))
      }
      None => (
        config.screen_name.clone(),
        find_prompt(inputs, "prompt", MIN_PROMPT_CHARS)?,
        None,
      ),
    };

    let palette = plan
      .as_ref()
      .and_then(|p| p.palette.clone())
      .or_else(|| inputs.get("palette").cloned());
    let typography = plan
      .as_ref()
      .and_then(|p| p.typography.clone())
      .or_else(|| inputs.get("typography").cloned());

    let request = GenerationRequest::new(Operation::Screen, prompt.as_str())
      .with_param("screen_name", screen_name.as_deref())
      .with_param("palette", palette)
      .with_param("typography", typography);
    let response = self.caller.call(&request).await?;

    let html = match &response {
      Value::String(html) => html.clone(),
      _ => string_field(&response, &["html", "markup"])
        .ok_or_else(|| ServiceError::invalid_response("screen response carried no html"))?,
    };

    let mut sub_requests = analyze_placeholders(&html);
    sub_requests.extend(declared_sub_requests(&response));

    let caller = &self.caller;
    let outcome = self
      .pipeline
      .run(&html, sub_requests, |sub| async move {
        request_image(caller, &sub.description, aspect_ratio_for(sub.kind), None).await
      })
      .await;

    info!(
      node_id = %node.id,
      succeeded = outcome.succeeded,
      total = outcome.total,
      "screen rendered"
    );

    to_output(&ScreenArtifact {
      screen_name,
      html: outcome.artifact,
      prompt,
      images: ImageStats {
        succeeded: outcome.succeeded,
        total: outcome.total,
      },
    })
  }
}
