//! Canvasflow Task Runtime
//!
//! Everything needed to run a single node, independent of graph traversal:
//!
//! - [`NodeExecutor`]: turns a node's static config plus its resolved
//!   [`InputBundle`] into an output value, or fails.
//! - [`ExecutorRegistry`]: maps each [`canvasflow_config::NodeKind`] to its executor.
//! - [`SubstitutionPipeline`]: concurrent, best-effort generation of the
//!   sub-artifacts declared inside a parent artifact, merged back by
//!   literal placeholder replacement.
//!
//! Executors never see the execution context of a run. They are functions of
//! `(config, inputs)`; the orchestrator owns all state.

mod error;
mod executor;
mod executors;
mod input;
mod registry;
mod substitution;

pub use error::{ErrorKind, TaskError};
pub use executor::NodeExecutor;
pub use executors::{
  AppBuilderExecutor, AppPlan, EnhancedPrompt, FALLBACK_PALETTE, ImageArtifact, ImageExecutor,
  ImageStats, MIN_DESCRIPTION_CHARS, MIN_PROMPT_CHARS, Palette, PaletteExecutor, PlannedScreen,
  PromptEnhancerExecutor, ScreenArtifact, ScreenExecutor, TextExecutor, TextOutput, Typography,
  TypographyExecutor,
};
pub use input::{InputBundle, extract_text, find_prompt};
pub use registry::ExecutorRegistry;
pub use substitution::{
  SubKind, SubRequest, SubResult, SubstitutionOutcome, SubstitutionPipeline, analyze_placeholders,
  substitute_tokens,
};
