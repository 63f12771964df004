use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::ServiceError;
use crate::service::{GenerationRequest, GenerationService, Operation};

/// Generation service reached over HTTP.
///
/// Each operation is a `POST {endpoint}/{operation}` with a JSON body
/// `{ "prompt": ..., "params": {...} }`. A 2xx response body is returned as
/// the result; any other status becomes [`ServiceError::Status`] carrying the
/// response text.
#[derive(Debug, Clone)]
pub struct HttpGenerationService {
  client: Client,
  endpoint: Url,
  api_key: Option<String>,
}

impl HttpGenerationService {
  pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, ServiceError> {
    let mut endpoint = Url::parse(endpoint).map_err(|e| ServiceError::InvalidEndpoint {
      message: format!("{}: {}", endpoint, e),
    })?;

    // Without a trailing slash `join` would replace the last path segment.
    if !endpoint.path().ends_with('/') {
      let path = format!("{}/", endpoint.path());
      endpoint.set_path(&path);
    }

    Ok(Self {
      client: Client::new(),
      endpoint,
      api_key,
    })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  fn operation_url(&self, operation: Operation) -> Result<Url, ServiceError> {
    self
      .endpoint
      .join(operation.as_str())
      .map_err(|e| ServiceError::InvalidEndpoint {
        message: e.to_string(),
      })
  }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
  async fn generate(&self, request: &GenerationRequest) -> Result<serde_json::Value, ServiceError> {
    let url = self.operation_url(request.operation)?;
    debug!(url = %url, "posting generation request");

    let mut builder = self.client.post(url).json(&json!({
      "prompt": request.prompt,
      "params": request.params,
    }));
    if let Some(api_key) = &self.api_key {
      builder = builder.bearer_auth(api_key);
    }

    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(ServiceError::status(status.as_u16(), message));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ServiceError::invalid_response(e.to_string()))
  }
}
