//! Canvasflow Workflow Orchestrator
//!
//! Runs a canvasflow graph from definition to result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowEngine                         │
//! │  - execute(graph) → ExecutionResult | ExecutionFailure      │
//! │  - dependency ordering, one node at a time                  │
//! │  - input assembly from upstream outputs                     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ExecutorRegistry                         │
//! │  - one NodeExecutor per node kind                           │
//! │  - remote executors retry through RetryableCaller           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use canvasflow_workflow_orchestrator::WorkflowEngine;
//! use canvasflow_task_runtime::ExecutorRegistry;
//!
//! let registry = ExecutorRegistry::standard(service, &settings);
//! let engine = WorkflowEngine::new(registry, settings);
//!
//! match engine.execute(graph_def).await {
//!   Ok(result) => println!("{:?}", result.context.outputs()),
//!   Err(failure) => eprintln!("{} at {:?}", failure.kind(), failure.node_id()),
//! }
//! ```

mod context;
mod engine;
mod error;
mod events;
mod result;

pub use context::{ExecutionContext, NodeFailure};
pub use engine::WorkflowEngine;
pub use error::ExecutionError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::{ExecutionFailure, ExecutionResult, NodeStatus};
