use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
  #[default]
  #[serde(rename = "1:1")]
  Square,
  #[serde(rename = "16:9")]
  Landscape,
  #[serde(rename = "9:16")]
  Portrait,
  #[serde(rename = "4:3")]
  Standard,
  #[serde(rename = "3:4")]
  Tall,
}

impl AspectRatio {
  pub fn as_str(&self) -> &'static str {
    match self {
      AspectRatio::Square => "1:1",
      AspectRatio::Landscape => "16:9",
      AspectRatio::Portrait => "9:16",
      AspectRatio::Standard => "4:3",
      AspectRatio::Tall => "3:4",
    }
  }
}

impl fmt::Display for AspectRatio {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
