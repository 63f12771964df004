use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::AspectRatio;

/// One step of a generation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  #[serde(flatten)]
  pub config: NodeConfig,
  /// Hard deadline for this node's executor.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}

impl NodeDef {
  pub fn new(id: impl Into<String>, config: NodeConfig) -> Self {
    Self {
      id: id.into(),
      config,
      timeout_ms: None,
    }
  }

  pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
    self.timeout_ms = Some(timeout_ms);
    self
  }

  pub fn kind(&self) -> NodeKind {
    self.config.kind()
  }
}

/// Static, author-supplied configuration. The variant selects the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
  /// A literal value, optionally carrying a chosen aspect ratio.
  Text(TextConfig),
  /// Expands a short prompt into a detailed one.
  PromptEnhancer(PromptEnhancerConfig),
  /// Derives a color palette from an upstream description.
  Palette(PaletteConfig),
  /// Suggests a typography pairing from an upstream description.
  Typography(TypographyConfig),
  /// Renders a single image from a prompt.
  Image(ImageConfig),
  /// Renders an app screen and fills its image placeholders.
  Screen(ScreenConfig),
  /// Validates screen selections and emits a plan for per-screen nodes.
  AppBuilder(AppBuilderConfig),
}

impl NodeConfig {
  pub fn kind(&self) -> NodeKind {
    match self {
      NodeConfig::Text(_) => NodeKind::Text,
      NodeConfig::PromptEnhancer(_) => NodeKind::PromptEnhancer,
      NodeConfig::Palette(_) => NodeKind::Palette,
      NodeConfig::Typography(_) => NodeKind::Typography,
      NodeConfig::Image(_) => NodeKind::Image,
      NodeConfig::Screen(_) => NodeKind::Screen,
      NodeConfig::AppBuilder(_) => NodeKind::AppBuilder,
    }
  }
}

/// The closed set of node types, used as the executor registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Text,
  PromptEnhancer,
  Palette,
  Typography,
  Image,
  Screen,
  AppBuilder,
}

impl NodeKind {
  pub const ALL: [NodeKind; 7] = [
    NodeKind::Text,
    NodeKind::PromptEnhancer,
    NodeKind::Palette,
    NodeKind::Typography,
    NodeKind::Image,
    NodeKind::Screen,
    NodeKind::AppBuilder,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      NodeKind::Text => "text",
      NodeKind::PromptEnhancer => "prompt_enhancer",
      NodeKind::Palette => "palette",
      NodeKind::Typography => "typography",
      NodeKind::Image => "image",
      NodeKind::Screen => "screen",
      NodeKind::AppBuilder => "app_builder",
    }
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
  #[serde(default)]
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptEnhancerConfig {
  /// Template rendered against the input bundle, e.g. `"Expand: {{ prompt }}"`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub instructions: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mood: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypographyConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub aspect_ratio: Option<AspectRatio>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
  /// Which screen of an upstream plan to render. Defaults to the first.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub screen_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppBuilderConfig {
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub screens: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_node_def_parses_tagged_config() {
    let node: NodeDef = serde_json::from_value(json!({
      "id": "idea",
      "type": "text",
      "value": "A cozy coffee shop",
      "aspect_ratio": "16:9"
    }))
    .unwrap();

    assert_eq!(node.id, "idea");
    assert_eq!(node.kind(), NodeKind::Text);
    assert_eq!(
      node.config,
      NodeConfig::Text(TextConfig {
        value: "A cozy coffee shop".to_string(),
        aspect_ratio: Some(AspectRatio::Landscape),
      })
    );
  }

  #[test]
  fn test_node_def_defaults_missing_builder_fields() {
    let node: NodeDef = serde_json::from_value(json!({
      "id": "builder",
      "type": "app_builder",
      "timeout_ms": 5000
    }))
    .unwrap();

    assert_eq!(node.timeout_ms, Some(5000));
    match node.config {
      NodeConfig::AppBuilder(config) => {
        assert!(config.description.is_empty());
        assert!(config.screens.is_empty());
      }
      other => panic!("expected app_builder config, got {:?}", other),
    }
  }

  #[test]
  fn test_unknown_node_type_is_rejected() {
    let result: Result<NodeDef, _> = serde_json::from_value(json!({
      "id": "x",
      "type": "video"
    }));
    assert!(result.is_err());
  }

  #[test]
  fn test_kind_names_match_serde_tags() {
    for kind in NodeKind::ALL {
      let tag = serde_json::to_value(kind).unwrap();
      assert_eq!(tag, json!(kind.as_str()));
    }
  }
}
