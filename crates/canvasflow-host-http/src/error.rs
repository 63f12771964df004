use thiserror::Error;

/// Errors returned by a generation service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
  /// The service answered with a non-success status.
  #[error("service returned status {status}: {message}")]
  Status { status: u16, message: String },

  /// The request never produced a response (connect, timeout, reset).
  #[error("transport error: {message}")]
  Transport { message: String },

  /// The service answered but the body was not usable.
  #[error("invalid response: {message}")]
  InvalidResponse { message: String },

  /// The service endpoint could not be built.
  #[error("invalid endpoint: {message}")]
  InvalidEndpoint { message: String },
}

impl ServiceError {
  pub fn status(status: u16, message: impl Into<String>) -> Self {
    Self::Status {
      status,
      message: message.into(),
    }
  }

  pub fn transport(message: impl Into<String>) -> Self {
    Self::Transport {
      message: message.into(),
    }
  }

  pub fn invalid_response(message: impl Into<String>) -> Self {
    Self::InvalidResponse {
      message: message.into(),
    }
  }

  /// Rate limiting, server-side faults and transport failures may succeed on
  /// retry. Everything else is a rejection of the request itself.
  pub fn is_transient(&self) -> bool {
    match self {
      ServiceError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
      ServiceError::Transport { .. } => true,
      ServiceError::InvalidResponse { .. } | ServiceError::InvalidEndpoint { .. } => false,
    }
  }
}

impl From<reqwest::Error> for ServiceError {
  fn from(e: reqwest::Error) -> Self {
    match e.status() {
      Some(status) => ServiceError::status(status.as_u16(), e.to_string()),
      None if e.is_decode() => ServiceError::invalid_response(e.to_string()),
      None => ServiceError::transport(e.to_string()),
    }
  }
}
