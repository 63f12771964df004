use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use canvasflow_config::{EngineSettings, NodeKind};
use canvasflow_host_http::{
  GenerationService, JitterSource, RandomJitter, RetryPolicy, RetryableCaller,
};

use crate::executor::NodeExecutor;
use crate::executors::{
  AppBuilderExecutor, ImageExecutor, PaletteExecutor, PromptEnhancerExecutor, ScreenExecutor,
  TextExecutor, TypographyExecutor,
};
use crate::substitution::SubstitutionPipeline;

/// Maps node kinds to executors.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
  executors: HashMap<NodeKind, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
  /// An empty registry. Every node kind must be registered before use.
  pub fn new() -> Self {
    Self::default()
  }

  /// All built-in executors, calling `service` through a retrying caller
  /// configured from `settings`.
  pub fn standard(service: Arc<dyn GenerationService>, settings: &EngineSettings) -> Self {
    let jitter = Arc::new(RandomJitter {
      max: Duration::from_millis(settings.max_jitter_ms),
    });
    Self::standard_with_jitter(service, settings, jitter)
  }

  /// Like [`ExecutorRegistry::standard`] with an explicit jitter source.
  pub fn standard_with_jitter(
    service: Arc<dyn GenerationService>,
    settings: &EngineSettings,
    jitter: Arc<dyn JitterSource>,
  ) -> Self {
    let policy = RetryPolicy {
      max_attempts: settings.max_attempts,
      base_delay: Duration::from_millis(settings.base_delay_ms),
    };
    let caller = RetryableCaller::new(service, policy).with_jitter(jitter);
    let pipeline = SubstitutionPipeline::new(settings.max_concurrent, settings.max_sub_requests);

    let mut registry = Self::new();
    registry.register(TextExecutor);
    registry.register(PromptEnhancerExecutor::new(caller.clone()));
    registry.register(PaletteExecutor::new(caller.clone()));
    registry.register(TypographyExecutor::new(caller.clone()));
    registry.register(ImageExecutor::new(caller.clone()));
    registry.register(ScreenExecutor::new(caller, pipeline));
    registry.register(AppBuilderExecutor);
    registry
  }

  /// Register an executor under its own kind, replacing any previous one.
  pub fn register<E: NodeExecutor + 'static>(&mut self, executor: E) -> &mut Self {
    self.executors.insert(executor.kind(), Arc::new(executor));
    self
  }

  pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn NodeExecutor>> {
    self.executors.get(&kind).cloned()
  }

  pub fn contains(&self, kind: NodeKind) -> bool {
    self.executors.contains_key(&kind)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use canvasflow_host_http::{GenerationRequest, ServiceError};

  struct Unreachable;

  #[async_trait]
  impl GenerationService for Unreachable {
    async fn generate(
      &self,
      _request: &GenerationRequest,
    ) -> Result<serde_json::Value, ServiceError> {
      Err(ServiceError::transport("unreachable"))
    }
  }

  #[test]
  fn test_standard_registry_covers_every_kind() {
    let registry = ExecutorRegistry::standard(Arc::new(Unreachable), &EngineSettings::default());
    for kind in NodeKind::ALL {
      assert!(registry.contains(kind), "missing executor for {}", kind);
      assert_eq!(registry.get(kind).unwrap().kind(), kind);
    }
  }

  #[test]
  fn test_empty_registry() {
    let registry = ExecutorRegistry::new();
    assert!(registry.get(NodeKind::Text).is_none());
  }
}
