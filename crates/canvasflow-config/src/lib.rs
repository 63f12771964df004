//! Canvasflow Config
//!
//! This crate contains the serializable graph definition types for canvasflow.
//! A graph is a small set of generation steps (nodes) wired together by
//! named-handle edges. These types describe the graph as authored, before it
//! is validated and ordered by `canvasflow-workflow`.
//!
//! Graph definitions are loaded from JSON files:
//!
//! ```json
//! {
//!   "name": "landing page",
//!   "nodes": [
//!     { "id": "idea", "type": "text", "value": "A cozy coffee shop", "aspect_ratio": "16:9" },
//!     { "id": "hero", "type": "image" }
//!   ],
//!   "edges": [
//!     { "source": "idea", "target": "hero", "target_handle": "prompt" }
//!   ]
//! }
//! ```

mod edge;
mod enums;
mod graph;
mod node;
mod settings;

pub use edge::EdgeDef;
pub use enums::AspectRatio;
pub use graph::GraphDef;
pub use node::{
  AppBuilderConfig, ImageConfig, NodeConfig, NodeDef, NodeKind, PaletteConfig,
  PromptEnhancerConfig, ScreenConfig, TextConfig, TypographyConfig,
};
pub use settings::EngineSettings;
