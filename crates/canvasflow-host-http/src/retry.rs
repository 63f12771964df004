//! Bounded exponential backoff around generation calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::service::{GenerationRequest, GenerationService};

/// How often and how patiently to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total tries, including the first. Zero is treated as one.
  pub max_attempts: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay: Duration::from_millis(500),
    }
  }
}

impl RetryPolicy {
  /// Delay before the retry that follows failed attempt `attempt` (zero-based),
  /// without jitter: `2^attempt * base_delay`.
  pub fn backoff(&self, attempt: u32) -> Duration {
    self
      .base_delay
      .saturating_mul(2u32.saturating_pow(attempt))
  }
}

/// Source of the random delay added to each backoff.
pub trait JitterSource: Send + Sync {
  fn jitter(&self) -> Duration;
}

/// Uniform jitter in `[0, max]`.
#[derive(Debug, Clone, Copy)]
pub struct RandomJitter {
  pub max: Duration,
}

impl JitterSource for RandomJitter {
  fn jitter(&self) -> Duration {
    let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
      return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
  }
}

/// No jitter at all. Used by tests to keep retries deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
  fn jitter(&self) -> Duration {
    Duration::ZERO
  }
}

/// Run `operation` until it succeeds, fails non-transiently, or the policy's
/// attempts are used up. The closure receives the 1-based attempt number.
///
/// After exhaustion the last failure is returned.
pub async fn retry_with_backoff<T, F, Fut>(
  policy: &RetryPolicy,
  jitter: &dyn JitterSource,
  mut operation: F,
) -> Result<T, ServiceError>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, ServiceError>>,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 0;

  loop {
    attempt += 1;
    match operation(attempt).await {
      Ok(value) => return Ok(value),
      Err(e) if e.is_transient() && attempt < max_attempts => {
        let delay = policy.backoff(attempt - 1).saturating_add(jitter.jitter());
        warn!(
          attempt,
          max_attempts,
          backoff_ms = delay.as_millis() as u64,
          error = %e,
          "retrying generation request"
        );
        tokio::time::sleep(delay).await;
      }
      Err(e) => {
        if e.is_transient() {
          warn!(attempts = attempt, error = %e, "generation request exhausted retries");
        } else {
          debug!(attempt, error = %e, "generation request rejected, not retrying");
        }
        return Err(e);
      }
    }
  }
}

/// A generation service wrapped with a retry policy.
///
/// Cheap to clone; clones share the service and jitter source.
#[derive(Clone)]
pub struct RetryableCaller {
  service: Arc<dyn GenerationService>,
  policy: RetryPolicy,
  jitter: Arc<dyn JitterSource>,
}

impl RetryableCaller {
  /// Create a caller with random jitter of up to one base delay.
  pub fn new(service: Arc<dyn GenerationService>, policy: RetryPolicy) -> Self {
    let jitter = Arc::new(RandomJitter {
      max: policy.base_delay,
    });
    Self {
      service,
      policy,
      jitter,
    }
  }

  pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
    self.jitter = jitter;
    self
  }

  pub async fn call(&self, request: &GenerationRequest) -> Result<serde_json::Value, ServiceError> {
    let service = &self.service;
    retry_with_backoff(&self.policy, self.jitter.as_ref(), |attempt| {
      debug!(
        operation = request.operation.as_str(),
        attempt, "calling generation service"
      );
      service.generate(request)
    })
    .await
  }
}
