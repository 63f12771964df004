use std::collections::{HashMap, HashSet};

use canvasflow_config::{EdgeDef, GraphDef, NodeDef};

use crate::error::WorkflowError;
use crate::resolver::DependencyResolver;

/// Validated graph structure for ordering and input assembly.
#[derive(Debug, Clone)]
pub struct Graph {
  name: String,
  nodes: Vec<NodeDef>,
  edges: Vec<EdgeDef>,
  /// node_id -> position in `nodes`.
  index: HashMap<String, usize>,
  /// node_id -> positions in `edges` of the edges targeting it, in edge order.
  incoming: HashMap<String, Vec<usize>>,
}

impl Graph {
  /// Validate a graph definition.
  ///
  /// Fails on a repeated node id or on an edge whose source or target is not
  /// a node of the graph. Cycles are not checked here; see [`Graph::execution_order`].
  pub fn new(def: GraphDef) -> Result<Self, WorkflowError> {
    let GraphDef { name, nodes, edges } = def;

    let mut index = HashMap::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
      if index.insert(node.id.clone(), position).is_some() {
        return Err(WorkflowError::DuplicateNodeId {
          node_id: node.id.clone(),
        });
      }
    }

    let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
    for node in &nodes {
      incoming.entry(node.id.clone()).or_default();
    }

    for (position, edge) in edges.iter().enumerate() {
      for endpoint in [&edge.source, &edge.target] {
        if !index.contains_key(endpoint) {
          return Err(WorkflowError::InvalidEdge {
            node_id: endpoint.clone(),
          });
        }
      }
      incoming
        .entry(edge.target.clone())
        .or_default()
        .push(position);
    }

    Ok(Self {
      name,
      nodes,
      edges,
      index,
      incoming,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn nodes(&self) -> &[NodeDef] {
    &self.nodes
  }

  pub fn edges(&self) -> &[EdgeDef] {
    &self.edges
  }

  /// Get a node by ID.
  pub fn node(&self, node_id: &str) -> Option<&NodeDef> {
    self.index.get(node_id).map(|&position| &self.nodes[position])
  }

  /// Edges targeting a node, in the order they were declared.
  pub fn incoming(&self, node_id: &str) -> impl Iterator<Item = &EdgeDef> {
    self
      .incoming
      .get(node_id)
      .into_iter()
      .flatten()
      .map(|&position| &self.edges[position])
  }

  /// Reject graphs in which one input handle is fed by several edges.
  pub fn check_single_writer(&self) -> Result<(), WorkflowError> {
    for node in &self.nodes {
      let mut seen = HashSet::new();
      for edge in self.incoming(&node.id) {
        if !seen.insert(edge.target_handle.as_str()) {
          return Err(WorkflowError::DuplicateInput {
            node_id: node.id.clone(),
            handle: edge.target_handle.clone(),
          });
        }
      }
    }
    Ok(())
  }

  /// Producer-before-consumer order over every node of the graph.
  pub fn execution_order(&self) -> Result<Vec<&NodeDef>, WorkflowError> {
    DependencyResolver::new(&self.nodes, &self.edges).order()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use canvasflow_config::{NodeConfig, TextConfig};

  fn text_node(id: &str) -> NodeDef {
    NodeDef::new(id, NodeConfig::Text(TextConfig::default()))
  }

  fn graph_def(ids: &[&str], edges: Vec<EdgeDef>) -> GraphDef {
    GraphDef {
      name: "test".to_string(),
      nodes: ids.iter().map(|id| text_node(id)).collect(),
      edges,
    }
  }

  #[test]
  fn test_duplicate_node_id_is_rejected() {
    let result = Graph::new(graph_def(&["a", "a"], vec![]));
    assert_eq!(
      result.unwrap_err(),
      WorkflowError::DuplicateNodeId {
        node_id: "a".to_string()
      }
    );
  }

  #[test]
  fn test_edge_to_unknown_node_is_rejected() {
    let result = Graph::new(graph_def(
      &["a"],
      vec![EdgeDef::new("a", "output", "ghost", "in")],
    ));
    assert_eq!(
      result.unwrap_err(),
      WorkflowError::InvalidEdge {
        node_id: "ghost".to_string()
      }
    );
  }

  #[test]
  fn test_incoming_in_declaration_order() {
    let graph = Graph::new(graph_def(
      &["a", "b", "c"],
      vec![
        EdgeDef::new("a", "output", "c", "left"),
        EdgeDef::new("b", "output", "c", "right"),
      ],
    ))
    .unwrap();

    let handles: Vec<(&str, &str)> = graph
      .incoming("c")
      .map(|e| (e.source.as_str(), e.target_handle.as_str()))
      .collect();
    assert_eq!(handles, vec![("a", "left"), ("b", "right")]);
    assert_eq!(graph.incoming("a").count(), 0);
    assert_eq!(graph.incoming("z").count(), 0);
    assert!(graph.node("b").is_some());
    assert!(graph.node("z").is_none());
  }

  #[test]
  fn test_check_single_writer() {
    let fan_in = Graph::new(graph_def(
      &["a", "b", "c"],
      vec![
        EdgeDef::new("a", "output", "c", "prompt"),
        EdgeDef::new("b", "output", "c", "prompt"),
      ],
    ))
    .unwrap();
    assert_eq!(
      fan_in.check_single_writer().unwrap_err(),
      WorkflowError::DuplicateInput {
        node_id: "c".to_string(),
        handle: "prompt".to_string()
      }
    );

    let fan_out = Graph::new(graph_def(
      &["a", "b", "c"],
      vec![
        EdgeDef::new("a", "output", "b", "prompt"),
        EdgeDef::new("a", "output", "c", "prompt"),
      ],
    ))
    .unwrap();
    assert!(fan_out.check_single_writer().is_ok());
  }
}
