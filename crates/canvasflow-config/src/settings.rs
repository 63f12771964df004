use serde::{Deserialize, Serialize};

/// Knobs exposed to the engine's caller. Every field has a default, so an
/// empty JSON object is a valid settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
  /// Total tries per external call, including the first.
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  #[serde(default = "default_base_delay_ms")]
  pub base_delay_ms: u64,
  /// Upper bound of the random delay added to every backoff.
  #[serde(default = "default_max_jitter_ms")]
  pub max_jitter_ms: u64,
  /// Sub-requests in flight at once inside a single node.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Sub-requests considered per artifact; the rest are left as placeholders.
  #[serde(default = "default_max_sub_requests")]
  pub max_sub_requests: usize,
  /// Reject graphs that feed one input handle from more than one edge.
  #[serde(default)]
  pub strict_inputs: bool,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self {
      max_attempts: default_max_attempts(),
      base_delay_ms: default_base_delay_ms(),
      max_jitter_ms: default_max_jitter_ms(),
      max_concurrent: default_max_concurrent(),
      max_sub_requests: default_max_sub_requests(),
      strict_inputs: false,
    }
  }
}

fn default_max_attempts() -> u32 {
  3
}

fn default_base_delay_ms() -> u64 {
  500
}

fn default_max_jitter_ms() -> u64 {
  250
}

fn default_max_concurrent() -> usize {
  4
}

fn default_max_sub_requests() -> usize {
  8
}
