//! Execution events and notifiers.
//!
//! The engine reports progress through an [`ExecutionNotifier`] so callers
//! can log, stream or ignore it without the engine knowing which.

use canvasflow_task_runtime::ErrorKind;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a run, in the order they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  WorkflowStarted {
    execution_id: String,
    graph: String,
  },

  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  NodeCompleted {
    execution_id: String,
    node_id: String,
    data: serde_json::Value,
  },

  NodeFailed {
    execution_id: String,
    node_id: String,
    kind: ErrorKind,
    error: String,
  },

  WorkflowCompleted { execution_id: String },

  /// The run failed. For a cycle or invalid graph no node events precede it.
  WorkflowFailed {
    execution_id: String,
    kind: ErrorKind,
    error: String,
  },
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls a run; volume is a handful of
/// events per node.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
