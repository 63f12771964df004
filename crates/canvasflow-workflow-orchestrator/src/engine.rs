//! Sequential workflow execution.
//!
//! The `WorkflowEngine` orders a graph with the dependency resolver and runs
//! one node at a time, feeding each node the outputs of its upstream edges.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use canvasflow_config::{EngineSettings, GraphDef, NodeDef};
use canvasflow_task_runtime::{ExecutorRegistry, InputBundle, NodeExecutor};
use canvasflow_workflow::Graph;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::context::{ExecutionContext, NodeFailure};
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{ExecutionFailure, ExecutionResult, NodeStatus};

/// The workflow execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification strategies.
/// Use `WorkflowEngine::new()` for an engine that discards events, or
/// `WorkflowEngine::with_notifier()` to observe them.
pub struct WorkflowEngine<N: ExecutionNotifier = NoopNotifier> {
  registry: ExecutorRegistry,
  settings: EngineSettings,
  notifier: N,
}

impl WorkflowEngine<NoopNotifier> {
  pub fn new(registry: ExecutorRegistry, settings: EngineSettings) -> Self {
    Self::with_notifier(registry, settings, NoopNotifier)
  }
}

/// Mutable state of one run.
struct Run<'n, N> {
  execution_id: String,
  context: ExecutionContext,
  statuses: BTreeMap<String, NodeStatus>,
  notifier: &'n N,
}

impl<N: ExecutionNotifier> Run<'_, N> {
  fn start_node(&mut self, node_id: &str) {
    self
      .statuses
      .insert(node_id.to_string(), NodeStatus::Running);
    self.notifier.notify(ExecutionEvent::NodeStarted {
      execution_id: self.execution_id.clone(),
      node_id: node_id.to_string(),
    });
  }

  fn complete_node(&mut self, node_id: &str, output: Value) {
    self
      .statuses
      .insert(node_id.to_string(), NodeStatus::Completed);
    self.notifier.notify(ExecutionEvent::NodeCompleted {
      execution_id: self.execution_id.clone(),
      node_id: node_id.to_string(),
      data: output.clone(),
    });
    self.context.insert(node_id, output);
  }

  fn fail_node(&mut self, node_id: &str, e: &ExecutionError) {
    self
      .statuses
      .insert(node_id.to_string(), NodeStatus::Failed);
    self.notifier.notify(ExecutionEvent::NodeFailed {
      execution_id: self.execution_id.clone(),
      node_id: node_id.to_string(),
      kind: e.kind(),
      error: e.to_string(),
    });
    self.context.record_failure(NodeFailure {
      node_id: node_id.to_string(),
      kind: e.kind(),
      message: e.to_string(),
    });
  }
}

impl<N: ExecutionNotifier> WorkflowEngine<N> {
  pub fn with_notifier(registry: ExecutorRegistry, settings: EngineSettings, notifier: N) -> Self {
    Self {
      registry,
      settings,
      notifier,
    }
  }

  /// Validate and execute a graph definition.
  ///
  /// Validation failures are reported like any other failed run, with an
  /// empty context.
  pub async fn execute(&self, def: GraphDef) -> Result<ExecutionResult, ExecutionFailure> {
    match Graph::new(def) {
      Ok(graph) => self.execute_graph(&graph).await,
      Err(e) => {
        let execution_id = uuid::Uuid::new_v4().to_string();
        let error = ExecutionError::from(e);
        error!(execution_id = %execution_id, error = %error, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.clone(),
          kind: error.kind(),
          error: error.to_string(),
        });
        Err(ExecutionFailure {
          execution_id,
          error,
          context: ExecutionContext::new(),
          statuses: BTreeMap::new(),
        })
      }
    }
  }

  /// Execute a validated graph, one node at a time.
  ///
  /// The first failing node stops the run; outputs produced before it are
  /// returned in the failure for inspection.
  #[instrument(skip(self, graph), fields(graph = %graph.name(), execution_id = tracing::field::Empty))]
  pub async fn execute_graph(&self, graph: &Graph) -> Result<ExecutionResult, ExecutionFailure> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    tracing::Span::current().record("execution_id", execution_id.as_str());

    let mut run = Run {
      execution_id: execution_id.clone(),
      context: ExecutionContext::new(),
      statuses: graph
        .nodes()
        .iter()
        .map(|n| (n.id.clone(), NodeStatus::Pending))
        .collect(),
      notifier: &self.notifier,
    };

    info!(
      execution_id = %execution_id,
      nodes = graph.nodes().len(),
      edges = graph.edges().len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      graph: graph.name().to_string(),
    });

    match self.run_nodes(graph, &mut run).await {
      Ok(()) => {
        info!(
          execution_id = %execution_id,
          completed = run.context.len(),
          "workflow_completed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: execution_id.clone(),
        });
        Ok(ExecutionResult {
          execution_id,
          context: run.context,
          statuses: run.statuses,
        })
      }
      Err(e) => {
        error!(
          execution_id = %execution_id,
          kind = %e.kind(),
          error = %e,
          "workflow_failed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.clone(),
          kind: e.kind(),
          error: e.to_string(),
        });
        Err(ExecutionFailure {
          execution_id,
          error: e,
          context: run.context,
          statuses: run.statuses,
        })
      }
    }
  }

  async fn run_nodes(&self, graph: &Graph, run: &mut Run<'_, N>) -> Result<(), ExecutionError> {
    if self.settings.strict_inputs {
      graph.check_single_writer()?;
    }

    let order = graph.execution_order()?;
    let position: HashMap<&str, usize> = order
      .iter()
      .enumerate()
      .map(|(i, node)| (node.id.as_str(), i))
      .collect();

    for node in &order {
      let inputs = assemble_inputs(graph, node, &position, &run.context);
      run.start_node(&node.id);

      match self.run_node(node, &inputs).await {
        Ok(output) => {
          info!(node_id = %node.id, kind = %node.kind(), "task_completed");
          run.complete_node(&node.id, output);
        }
        Err(e) => {
          error!(node_id = %node.id, kind = %e.kind(), error = %e, "task_failed");
          run.fail_node(&node.id, &e);
          return Err(e);
        }
      }
    }

    Ok(())
  }

  async fn run_node(&self, node: &NodeDef, inputs: &InputBundle) -> Result<Value, ExecutionError> {
    let executor: Arc<dyn NodeExecutor> = self.registry.get(node.kind()).ok_or_else(|| {
      ExecutionError::MissingExecutor {
        node_id: node.id.clone(),
        kind: node.kind(),
      }
    })?;

    let pending = executor.execute(node, inputs);
    let result = match node.timeout_ms {
      Some(timeout_ms) => tokio::time::timeout(Duration::from_millis(timeout_ms), pending)
        .await
        .map_err(|_| ExecutionError::Timeout {
          node_id: node.id.clone(),
          timeout_ms,
        })?,
      None => pending.await,
    };

    result.map_err(|source| ExecutionError::NodeFailed {
      node_id: node.id.clone(),
      source,
    })
  }
}

/// Build a node's input bundle from the outputs of its upstream edges.
///
/// Edges are applied in the execution order of their sources, so when two
/// edges feed the same handle the later producer wins.
fn assemble_inputs(
  graph: &Graph,
  node: &NodeDef,
  position: &HashMap<&str, usize>,
  context: &ExecutionContext,
) -> InputBundle {
  let mut edges: Vec<_> = graph.incoming(&node.id).collect();
  edges.sort_by_key(|edge| position.get(edge.source.as_str()).copied());

  let mut inputs = InputBundle::new();
  for edge in edges {
    let Some(output) = context.output(&edge.source) else {
      debug!(node_id = %node.id, source = %edge.source, "upstream produced no output");
      continue;
    };
    if inputs.insert(&edge.target_handle, output.clone()).is_some() {
      warn!(
        node_id = %node.id,
        handle = %edge.target_handle,
        source = %edge.source,
        source_handle = %edge.source_handle,
        "input fed by several edges, later source wins"
      );
    }
  }
  inputs
}

#[cfg(test)]
mod tests {
  use super::*;
  use canvasflow_config::{EdgeDef, NodeConfig, TextConfig};
  use serde_json::json;

  fn text(id: &str, value: &str) -> NodeDef {
    NodeDef::new(
      id,
      NodeConfig::Text(TextConfig {
        value: value.to_string(),
        aspect_ratio: None,
      }),
    )
  }

  fn graph(nodes: Vec<NodeDef>, edges: Vec<EdgeDef>) -> Graph {
    Graph::new(GraphDef {
      name: "test".to_string(),
      nodes,
      edges,
    })
    .unwrap()
  }

  #[test]
  fn test_assemble_inputs_orders_by_source_position() {
    let graph = graph(
      vec![text("first", "1"), text("second", "2"), text("sink", "")],
      vec![
        EdgeDef::new("second", "output", "sink", "prompt"),
        EdgeDef::new("first", "output", "sink", "prompt"),
        EdgeDef::new("first", "output", "sink", "source"),
      ],
    );
    let position: HashMap<&str, usize> = [("first", 0), ("second", 1), ("sink", 2)]
      .into_iter()
      .collect();
    let mut context = ExecutionContext::new();
    context.insert("first", json!("one"));
    context.insert("second", json!("two"));

    let sink = graph.node("sink").unwrap();
    let inputs = assemble_inputs(&graph, sink, &position, &context);

    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs.get("prompt"), Some(&json!("two")));
    assert_eq!(inputs.get("source"), Some(&json!("one")));
  }

  #[test]
  fn test_assemble_inputs_without_edges_is_empty() {
    let graph = graph(vec![text("alone", "x")], vec![]);
    let inputs = assemble_inputs(
      &graph,
      graph.node("alone").unwrap(),
      &HashMap::new(),
      &ExecutionContext::new(),
    );
    assert!(inputs.is_empty());
  }
}
