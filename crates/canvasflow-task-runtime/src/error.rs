use std::fmt;

use canvasflow_host_http::ServiceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// The graph is not acyclic.
  Cycle,
  /// Unknown node type, invalid graph or unusable static config.
  Configuration,
  /// A required input is absent or malformed.
  Input,
  /// Rate limiting or a server fault that outlived its retries.
  TransientService,
  /// The external service rejected the request.
  NonTransientService,
  /// A node exceeded its deadline.
  Timeout,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ErrorKind::Cycle => "cycle",
      ErrorKind::Configuration => "configuration",
      ErrorKind::Input => "input",
      ErrorKind::TransientService => "transient_service",
      ErrorKind::NonTransientService => "non_transient_service",
      ErrorKind::Timeout => "timeout",
    };
    f.write_str(name)
  }
}

/// Errors a node executor can return.
#[derive(Debug, Error)]
pub enum TaskError {
  /// A required input handle is not connected.
  #[error("missing required input '{handle}': expected {expected}")]
  MissingInput { handle: String, expected: String },

  /// An input is connected but its value is not usable.
  #[error("invalid input '{handle}': {message}")]
  InvalidInput { handle: String, message: String },

  /// The node's static configuration is invalid.
  #[error("invalid configuration: {message}")]
  Configuration { message: String },

  /// An author-supplied template failed to render.
  #[error("template error: {message}")]
  Template { message: String },

  /// The output could not be serialized.
  #[error("failed to serialize output: {message}")]
  Serialization { message: String },

  /// The external generation call failed.
  #[error("generation failed: {0}")]
  Service(#[from] ServiceError),
}

impl TaskError {
  pub fn missing_input(handle: impl Into<String>, expected: impl Into<String>) -> Self {
    Self::MissingInput {
      handle: handle.into(),
      expected: expected.into(),
    }
  }

  pub fn invalid_input(handle: impl Into<String>, message: impl Into<String>) -> Self {
    Self::InvalidInput {
      handle: handle.into(),
      message: message.into(),
    }
  }

  pub fn configuration(message: impl Into<String>) -> Self {
    Self::Configuration {
      message: message.into(),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      TaskError::MissingInput { .. } | TaskError::InvalidInput { .. } => ErrorKind::Input,
      TaskError::Configuration { .. }
      | TaskError::Template { .. }
      | TaskError::Serialization { .. } => ErrorKind::Configuration,
      TaskError::Service(e) if e.is_transient() => ErrorKind::TransientService,
      TaskError::Service(_) => ErrorKind::NonTransientService,
    }
  }
}
