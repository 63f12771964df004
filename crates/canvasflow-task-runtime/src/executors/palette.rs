use async_trait::async_trait;
use canvasflow_config::{NodeConfig, NodeDef, NodeKind};
use canvasflow_host_http::{GenerationRequest, Operation, RetryableCaller};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{config_mismatch, string_field, to_output};
use crate::error::TaskError;
use crate::executor::NodeExecutor;
use crate::input::{InputBundle, extract_text};

/// Returned whenever a usable palette cannot be derived.
pub const FALLBACK_PALETTE: [&str; 3] = ["#1F2937", "#3B82F6", "#F9FAFB"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
  pub colors: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  /// True when the colors are [`FALLBACK_PALETTE`].
  #[serde(default)]
  pub fallback: bool,
}

impl Palette {
  pub fn fallback() -> Self {
    Self {
      colors: FALLBACK_PALETTE.iter().map(|c| c.to_string()).collect(),
      name: None,
      fallback: true,
    }
  }
}

/// Derives a color palette from a description or an image.
///
/// A connected but unusable source, or a service answer without colors,
/// yields [`Palette::fallback`] so a broken palette never aborts the run.
#[derive(Clone)]
pub struct PaletteExecutor {
  caller: RetryableCaller,
}

impl PaletteExecutor {
  pub fn new(caller: RetryableCaller) -> Self {
    Self { caller }
  }
}

fn is_hex_color(s: &str) -> bool {
  let Some(digits) = s.strip_prefix('#') else {
    return false;
  };
  matches!(digits.len(), 3 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Valid `#rrggbb`-style colors of a service response, if any.
fn parse_colors(response: &Value) -> Option<Vec<String>> {
  let colors: Vec<String> = response
    .get("colors")?
    .as_array()?
    .iter()
    .filter_map(Value::as_str)
    .map(str::trim)
    .filter(|c| is_hex_color(c))
    .map(|c| c.to_uppercase())
    .collect();
  (!colors.is_empty()).then_some(colors)
}

#[async_trait]
impl NodeExecutor for PaletteExecutor {
  fn kind(&self) -> NodeKind {
    NodeKind::Palette
  }

  async fn execute(&self, node: &NodeDef, inputs: &InputBundle) -> Result<Value, TaskError> {
    let NodeConfig::Palette(config) = &node.config else {
      return Err(config_mismatch(&node.id, "palette"));
    };

    let source = inputs.require("source", "a description or an image to derive colors from")?;
    let description = extract_text(source)
      .map(str::trim)
      .filter(|s| !s.is_empty());
    let image_url = string_field(source, &["image_url", "imageUrl"]);

    let prompt = match (description, &image_url) {
      (Some(text), _) => text.to_string(),
      (None, Some(_)) => "Derive a palette from the referenced image".to_string(),
      (None, None) => {
        warn!(node_id = %node.id, "palette source has no text or image, using fallback");
        return to_output(&Palette::fallback());
      }
    };

    let request = GenerationRequest::new(Operation::Palette, prompt)
      .with_param("mood", config.mood.as_deref())
      .with_param("image_url", image_url);
    let response = self.caller.call(&request).await?;

    let palette = match parse_colors(&response) {
      Some(colors) => Palette {
        colors,
        name: string_field(&response, &["name"]),
        fallback: false,
      },
      None => {
        warn!(node_id = %node.id, "palette response has no usable colors, using fallback");
        Palette::fallback()
      }
    };

    to_output(&palette)
  }
}
