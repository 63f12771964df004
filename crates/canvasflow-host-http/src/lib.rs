//! Canvasflow Host HTTP
//!
//! Outbound access to the external generation service.
//!
//! - [`GenerationService`] is the collaborator boundary: one request in,
//!   one JSON result or a classified [`ServiceError`] out.
//! - [`RetryableCaller`] wraps any service with bounded exponential backoff.
//!   It only looks at error classification and timing, never at payloads.
//! - [`HttpGenerationService`] is the reqwest-backed implementation used by
//!   the CLI.

mod error;
mod http;
mod retry;
mod service;

pub use error::ServiceError;
pub use http::HttpGenerationService;
pub use retry::{
  JitterSource, NoJitter, RandomJitter, RetryPolicy, RetryableCaller, retry_with_backoff,
};
pub use service::{GenerationRequest, GenerationService, Operation};
