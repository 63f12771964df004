//! Dependency ordering.
//!
//! Depth-first traversal over the "fed by" relation: a node is emitted only
//! after every node that feeds it, so the output is a topological order.
//! Traversal roots are all nodes in declaration order, which keeps the order
//! of unrelated nodes stable across runs.

use std::collections::HashMap;

use canvasflow_config::{EdgeDef, NodeDef};
use tracing::debug;

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  /// On the active traversal path.
  Visiting,
  /// Already placed in the output.
  Visited,
}

/// Computes an execution order for a set of nodes and edges.
pub struct DependencyResolver<'a> {
  nodes: &'a [NodeDef],
  by_id: HashMap<&'a str, &'a NodeDef>,
  /// target node_id -> source node_ids, in edge order.
  feeders: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> DependencyResolver<'a> {
  pub fn new(nodes: &'a [NodeDef], edges: &'a [EdgeDef]) -> Self {
    let by_id = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut feeders: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
    for edge in edges {
      feeders
        .entry(edge.target.as_str())
        .or_default()
        .push(edge.source.as_str());
    }

    Self {
      nodes,
      by_id,
      feeders,
    }
  }

  /// Order every node so that each appears after all nodes feeding it.
  ///
  /// Fails with [`WorkflowError::Cycle`] naming the node where the cycle was
  /// re-entered; no partial order is returned in that case.
  pub fn order(&self) -> Result<Vec<&'a NodeDef>, WorkflowError> {
    let mut marks: HashMap<&'a str, Mark> = HashMap::with_capacity(self.nodes.len());
    let mut ordered = Vec::with_capacity(self.nodes.len());
    // Active path: each node with the index of the next feeder to visit.
    let mut stack: Vec<(&'a NodeDef, usize)> = Vec::new();

    for root in self.nodes {
      self.enter(root.id.as_str(), &mut marks, &mut stack)?;

      while let Some((node, next)) = stack.last_mut() {
        match self.feeders_of(node.id.as_str()).get(*next) {
          Some(&source) => {
            *next += 1;
            self.enter(source, &mut marks, &mut stack)?;
          }
          None => {
            let done = *node;
            stack.pop();
            marks.insert(done.id.as_str(), Mark::Visited);
            ordered.push(done);
          }
        }
      }
    }

    debug!(
      order = ?ordered.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
      "resolved execution order"
    );
    Ok(ordered)
  }

  fn feeders_of(&self, node_id: &str) -> &[&'a str] {
    self
      .feeders
      .get(node_id)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// Push `node_id` onto the active path unless it is already placed.
  fn enter(
    &self,
    node_id: &'a str,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<(&'a NodeDef, usize)>,
  ) -> Result<(), WorkflowError> {
    match marks.get(node_id) {
      Some(Mark::Visited) => return Ok(()),
      Some(Mark::Visiting) => {
        return Err(WorkflowError::Cycle {
          node_id: node_id.to_string(),
        });
      }
      None => {}
    }

    let node = self
      .by_id
      .get(node_id)
      .copied()
      .ok_or_else(|| WorkflowError::InvalidEdge {
        node_id: node_id.to_string(),
      })?;

    marks.insert(node_id, Mark::Visiting);
    stack.push((node, 0));
    Ok(())
  }
}
