//! Resource provider backed by a web search API restricted to trusted domains.

use async_trait::async_trait;
use mediscan_core::config::ProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::EnrichmentProvider;
use crate::types::{AnalysisKind, EnrichmentRequest, Resource};

const MAX_SNIPPET_CHARS: usize = 280;

/// Fetches reference articles for the request subject.
#[derive(Clone)]
pub struct WebSearchResourceProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    key_env: String,
    trusted_domains: Vec<String>,
    max_results: usize,
}

impl WebSearchResourceProvider {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, max_results: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            key_env: "api key".to_string(),
            trusted_domains: Vec::new(),
            max_results: max_results.max(1),
        }
    }

    pub fn with_trusted_domains(mut self, domains: Vec<String>) -> Self {
        self.trusted_domains = domains;
        self
    }

    /// Build from configuration, reading the API key from the configured env var.
    pub fn from_config(config: &ProviderConfig, max_results: usize) -> Self {
        let api_key = std::env::var(&config.resources_api_key_env).ok();
        let mut provider = Self::new(&config.resources_url, api_key, max_results)
            .with_trusted_domains(config.trusted_domains.clone());
        provider.key_env = config.resources_api_key_env.clone();
        provider
    }

    fn query(request: &EnrichmentRequest) -> String {
        let suffix = match request.kind {
            AnalysisKind::Skin => "skin condition symptoms diagnosis treatment",
            AnalysisKind::Radiology => "chest x-ray findings diagnosis treatment",
            AnalysisKind::Triage => "symptoms causes when to see a doctor",
        };
        format!("{} {}", request.subject_label(), suffix)
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: String,
    search_depth: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "no_domains")]
    include_domains: &'a [String],
}

fn no_domains(domains: &&[String]) -> bool {
    domains.is_empty()
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Host name of a URL without scheme, port, or a leading `www.`.
fn source_from_url(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    host.trim_start_matches("www.").to_string()
}

fn truncate_snippet(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= MAX_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn into_resources(hits: Vec<SearchHit>, max: usize) -> Vec<Resource> {
    hits.into_iter()
        .filter(|h| h.url.starts_with("https://") || h.url.starts_with("http://"))
        .take(max)
        .map(|h| Resource {
            title: if h.title.trim().is_empty() {
                h.url.clone()
            } else {
                h.title.trim().to_string()
            },
            source: source_from_url(&h.url),
            snippet: truncate_snippet(&h.content),
            url: h.url,
        })
        .collect()
}

#[async_trait]
impl EnrichmentProvider for WebSearchResourceProvider {
    type Output = Vec<Resource>;

    fn name(&self) -> &'static str {
        "resources"
    }

    async fn fetch(&self, request: &EnrichmentRequest) -> Result<Vec<Resource>, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(format!("{} is not set", self.key_env))
        })?;

        let body = SearchRequest {
            api_key,
            query: Self::query(request),
            search_depth: "basic",
            max_results: self.max_results,
            include_domains: &self.trusted_domains,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let resources = into_resources(parsed.results, self.max_results);
        tracing::debug!(count = resources.len(), "Search results received");
        Ok(resources)
    }
}
