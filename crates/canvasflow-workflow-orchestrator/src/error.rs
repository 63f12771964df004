//! Error types for graph execution.

use canvasflow_config::NodeKind;
use canvasflow_task_runtime::{ErrorKind, TaskError};
use canvasflow_workflow::WorkflowError;
use thiserror::Error;

/// Errors that stop a workflow run.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// The graph is not acyclic. Nothing was executed.
  #[error("cycle detected at node '{node_id}'")]
  Cycle { node_id: String },

  /// The graph failed validation before execution.
  #[error("invalid workflow graph: {message}")]
  InvalidGraph { message: String },

  /// No executor is registered for the node's kind.
  #[error("no executor registered for node '{node_id}' of type '{kind}'")]
  MissingExecutor { node_id: String, kind: NodeKind },

  /// The node's executor returned an error.
  #[error("node '{node_id}' failed: {source}")]
  NodeFailed {
    node_id: String,
    #[source]
    source: TaskError,
  },

  /// The node exceeded its `timeout_ms`.
  #[error("node '{node_id}' timed out after {timeout_ms}ms")]
  Timeout { node_id: String, timeout_ms: u64 },
}

impl ExecutionError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ExecutionError::Cycle { .. } => ErrorKind::Cycle,
      ExecutionError::InvalidGraph { .. } | ExecutionError::MissingExecutor { .. } => {
        ErrorKind::Configuration
      }
      ExecutionError::NodeFailed { source, .. } => source.kind(),
      ExecutionError::Timeout { .. } => ErrorKind::Timeout,
    }
  }

  /// The node the run stopped at, if the failure belongs to one.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      ExecutionError::Cycle { node_id }
      | ExecutionError::MissingExecutor { node_id, .. }
      | ExecutionError::NodeFailed { node_id, .. }
      | ExecutionError::Timeout { node_id, .. } => Some(node_id),
      ExecutionError::InvalidGraph { .. } => None,
    }
  }
}

impl From<WorkflowError> for ExecutionError {
  fn from(e: WorkflowError) -> Self {
    match e {
      WorkflowError::Cycle { node_id } => ExecutionError::Cycle { node_id },
      other => ExecutionError::InvalidGraph {
        message: other.to_string(),
      },
    }
  }
}
