//! Canvasflow Workflow
//!
//! This crate provides the validated graph representation for canvasflow.
//! A [`Graph`] is built from a [`canvasflow_config::GraphDef`] and guarantees:
//! - node ids are unique
//! - every edge references existing nodes
//!
//! The [`DependencyResolver`] turns a graph into an execution order in which
//! every producer precedes its consumers, or reports the node where a cycle
//! was re-entered.

mod error;
mod graph;
mod resolver;

pub use error::WorkflowError;
pub use graph::Graph;
pub use resolver::DependencyResolver;
