//! Concurrent sub-artifact generation with literal placeholder substitution.
//!
//! A parent artifact (screen markup) declares the sub-artifacts it needs as
//! placeholder tokens such as `[[image:a barista pouring latte art]]`. The
//! pipeline requests every sub-artifact concurrently, lets each request settle
//! on its own, and then, as the single owner of the artifact text, replaces
//! the tokens whose requests succeeded. Failed requests leave their token in
//! place and only lower the success count.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, LazyLock};

use canvasflow_host_http::ServiceError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\[\[(image|icon):([^\]]*)\]\]").expect("placeholder pattern is valid")
});

/// What kind of sub-artifact a placeholder asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubKind {
  #[default]
  Image,
  Icon,
}

/// A sub-artifact declared inside a parent artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRequest {
  /// Exact text to replace in the parent artifact.
  pub token: String,
  pub description: String,
  #[serde(default)]
  pub kind: SubKind,
}

/// A successfully generated sub-artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubResult {
  pub token: String,
  pub data: String,
}

/// The merged artifact plus partial-success telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionOutcome {
  pub artifact: String,
  pub succeeded: usize,
  /// Sub-requests attempted, after de-duplication and capping.
  pub total: usize,
}

/// Scan markup for `[[image:...]]` and `[[icon:...]]` tokens.
///
/// Tokens with a blank description are ignored; repeated tokens are reported
/// once, in order of first appearance.
pub fn analyze_placeholders(markup: &str) -> Vec<SubRequest> {
  let mut seen = HashSet::new();
  PLACEHOLDER
    .captures_iter(markup)
    .filter_map(|caps| {
      let token = caps.get(0)?.as_str();
      let description = caps.get(2)?.as_str().trim();
      if description.is_empty() || !seen.insert(token.to_string()) {
        return None;
      }
      let kind = match caps.get(1)?.as_str() {
        "icon" => SubKind::Icon,
        _ => SubKind::Image,
      };
      Some(SubRequest {
        token: token.to_string(),
        description: description.to_string(),
        kind,
      })
    })
    .collect()
}

/// Replace every occurrence of each token in a single pass over `haystack`.
///
/// Tokens match literally. Where several tokens match at the same position
/// the longest one wins, and replacement text is never scanned again, so each
/// occurrence is replaced at most once. A token mapped to itself is kept as is
/// and shields the shorter tokens it contains.
pub fn substitute_tokens(haystack: &str, replacements: &[(&str, &str)]) -> String {
  let mut by_token: HashMap<&str, &str> = HashMap::with_capacity(replacements.len());
  for &(token, data) in replacements {
    if !token.is_empty() {
      by_token.entry(token).or_insert(data);
    }
  }
  if by_token.is_empty() {
    return haystack.to_string();
  }

  let mut tokens: Vec<&str> = by_token.keys().copied().collect();
  tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

  let pattern = tokens
    .iter()
    .map(|token| regex::escape(token))
    .collect::<Vec<_>>()
    .join("|");
  match Regex::new(&pattern) {
    Ok(re) => re
      .replace_all(haystack, |caps: &Captures<'_>| {
        let matched = &caps[0];
        by_token.get(matched).copied().unwrap_or(matched).to_string()
      })
      .into_owned(),
    Err(e) => {
      debug!(error = %e, "tokens too large for a pattern, scanning instead");
      scan_substitute(haystack, &tokens, &by_token)
    }
  }
}

/// Same contract as [`substitute_tokens`]; `tokens` must be longest first.
fn scan_substitute(haystack: &str, tokens: &[&str], by_token: &HashMap<&str, &str>) -> String {
  let mut merged = String::with_capacity(haystack.len());
  let mut rest = haystack;
  while let Some(c) = rest.chars().next() {
    match tokens.iter().find(|token| rest.starts_with(**token)) {
      Some(token) => {
        merged.push_str(by_token.get(token).copied().unwrap_or(*token));
        rest = &rest[token.len()..];
      }
      None => {
        merged.push(c);
        rest = &rest[c.len_utf8()..];
      }
    }
  }
  merged
}

/// Best-effort fan-out of sub-requests with bounded concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionPipeline {
  /// Requests in flight at once. Zero is treated as one.
  pub max_concurrent: usize,
  /// Requests considered per artifact; the rest keep their placeholder.
  pub max_sub_requests: usize,
}

impl Default for SubstitutionPipeline {
  fn default() -> Self {
    Self {
      max_concurrent: 4,
      max_sub_requests: 8,
    }
  }
}

impl SubstitutionPipeline {
  pub fn new(max_concurrent: usize, max_sub_requests: usize) -> Self {
    Self {
      max_concurrent,
      max_sub_requests,
    }
  }

  /// Generate each sub-artifact with `fetch` and substitute the successes.
  ///
  /// Every request runs to its own completion; one failure never cancels the
  /// others. Successes are merged in one pass once all requests settle, with
  /// failed and capped tokens matched as themselves, so the result depends
  /// only on which requests succeeded, not on completion order.
  pub async fn run<F, Fut>(
    &self,
    artifact: &str,
    requests: Vec<SubRequest>,
    fetch: F,
  ) -> SubstitutionOutcome
  where
    F: Fn(SubRequest) -> Fut,
    Fut: Future<Output = Result<String, ServiceError>>,
  {
    let mut seen = HashSet::new();
    let mut requests: Vec<SubRequest> = requests
      .into_iter()
      .filter(|r| !r.token.is_empty() && seen.insert(r.token.clone()))
      .collect();

    if requests.len() > self.max_sub_requests {
      warn!(
        requested = requests.len(),
        cap = self.max_sub_requests,
        "too many sub-requests, extra placeholders left untouched"
      );
    }
    let skipped: Vec<String> = requests
      .split_off(self.max_sub_requests.min(requests.len()))
      .into_iter()
      .map(|r| r.token)
      .collect();
    let tokens: Vec<String> = requests.iter().map(|r| r.token.clone()).collect();
    let total = tokens.len();

    let permits = Arc::new(Semaphore::new(self.max_concurrent.max(1)));
    let attempts = requests.into_iter().map(|request| {
      let permits = permits.clone();
      let token = request.token.clone();
      let pending = fetch(request);
      async move {
        let _permit = match permits.acquire_owned().await {
          Ok(permit) => permit,
          Err(_) => return None,
        };
        match pending.await {
          Ok(data) => Some(SubResult { token, data }),
          Err(e) => {
            warn!(token = %token, error = %e, "sub-request failed, keeping placeholder");
            None
          }
        }
      }
    });

    // join_all keeps request order, so results line up with `tokens`.
    let results: Vec<Option<SubResult>> = futures::future::join_all(attempts).await;
    let succeeded = results.iter().flatten().count();

    let replacements: Vec<(&str, &str)> = tokens
      .iter()
      .zip(&results)
      .map(|(token, result)| match result {
        Some(r) => (r.token.as_str(), r.data.as_str()),
        None => (token.as_str(), token.as_str()),
      })
      .chain(skipped.iter().map(|t| (t.as_str(), t.as_str())))
      .collect();
    let merged = substitute_tokens(artifact, &replacements);

    SubstitutionOutcome {
      artifact: merged,
      succeeded,
      total,
    }
  }
}
