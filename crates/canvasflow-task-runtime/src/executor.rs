use async_trait::async_trait;
use canvasflow_config::{NodeDef, NodeKind};

use crate::error::TaskError;
use crate::input::InputBundle;

/// Runs one kind of node.
///
/// `execute` must not depend on anything but the node's config and the
/// supplied inputs (plus whatever external service the executor wraps).
#[async_trait]
pub trait NodeExecutor: Send + Sync {
  /// The node kind this executor handles.
  fn kind(&self) -> NodeKind;

  async fn execute(
    &self,
    node: &NodeDef,
    inputs: &InputBundle,
  ) -> Result<serde_json::Value, TaskError>;
}
