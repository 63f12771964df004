use std::collections::BTreeMap;

use canvasflow_task_runtime::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The node a run stopped at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
  pub node_id: String,
  pub kind: ErrorKind,
  pub message: String,
}

/// Outputs produced during one run, keyed by node id.
///
/// Filled in execution order and owned by a single run. When a node fails,
/// outputs produced before it stay in place and the failure is recorded
/// next to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
  outputs: BTreeMap<String, Value>,
  /// Node ids in completion order.
  completed: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  failure: Option<NodeFailure>,
}

impl ExecutionContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn insert(&mut self, node_id: impl Into<String>, output: Value) {
    let node_id = node_id.into();
    if self.outputs.insert(node_id.clone(), output).is_none() {
      self.completed.push(node_id);
    }
  }

  pub(crate) fn record_failure(&mut self, failure: NodeFailure) {
    self.failure = Some(failure);
  }

  pub fn output(&self, node_id: &str) -> Option<&Value> {
    self.outputs.get(node_id)
  }

  pub fn outputs(&self) -> &BTreeMap<String, Value> {
    &self.outputs
  }

  pub fn completed(&self) -> &[String] {
    &self.completed
  }

  pub fn failure(&self) -> Option<&NodeFailure> {
    self.failure.as_ref()
  }

  /// Ids of every node with an entry: completed nodes, then the failed one.
  pub fn node_ids(&self) -> Vec<&str> {
    self
      .completed
      .iter()
      .map(String::as_str)
      .chain(self.failure.iter().map(|f| f.node_id.as_str()))
      .collect()
  }

  pub fn len(&self) -> usize {
    self.outputs.len() + usize::from(self.failure.is_some())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
