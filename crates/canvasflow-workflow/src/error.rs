use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
  #[error("duplicate node id: {node_id}")]
  DuplicateNodeId { node_id: String },

  #[error("edge references unknown node: {node_id}")]
  InvalidEdge { node_id: String },

  #[error("input '{handle}' of node '{node_id}' is fed by more than one edge")]
  DuplicateInput { node_id: String, handle: String },

  #[error("cycle detected at node '{node_id}'")]
  Cycle { node_id: String },
}
