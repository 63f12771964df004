//! Outcome types returned by the engine.

use std::collections::BTreeMap;

use canvasflow_task_runtime::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::context::ExecutionContext;
use crate::error::ExecutionError;

/// Lifecycle of a node within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  Pending,
  Running,
  Completed,
  Failed,
}

/// Result of a run in which every node completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
  pub execution_id: String,
  pub context: ExecutionContext,
  pub statuses: BTreeMap<String, NodeStatus>,
}

impl ExecutionResult {
  pub fn output(&self, node_id: &str) -> Option<&Value> {
    self.context.output(node_id)
  }
}

/// A failed run: the error plus whatever was produced before it.
#[derive(Debug, Error)]
#[error("execution {execution_id} failed: {error}")]
pub struct ExecutionFailure {
  pub execution_id: String,
  #[source]
  pub error: ExecutionError,
  pub context: ExecutionContext,
  pub statuses: BTreeMap<String, NodeStatus>,
}

impl ExecutionFailure {
  pub fn kind(&self) -> ErrorKind {
    self.error.kind()
  }

  pub fn node_id(&self) -> Option<&str> {
    self.error.node_id()
  }
}
