//! Summary provider backed by an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use mediscan_core::config::ProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::fallback;
use crate::provider::EnrichmentProvider;
use crate::types::{AnalysisKind, EnrichmentRequest, Summary};

const MAX_TOKENS: u32 = 400;

/// Generates a patient-friendly summary and explanation.
///
/// The confidence and risk notes are always produced locally so that they stay
/// consistent with the fallback wording.
#[derive(Clone)]
pub struct ChatCompletionSummaryProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    key_env: String,
}

impl ChatCompletionSummaryProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            key_env: "api key".to_string(),
        }
    }

    /// Build from configuration, reading the API key from the configured env var.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let api_key = std::env::var(&config.summary_api_key_env).ok();
        let mut provider = Self::new(&config.summary_base_url, &config.summary_model, api_key);
        provider.key_env = config.summary_api_key_env.clone();
        provider
    }

    fn prompt(request: &EnrichmentRequest) -> String {
        let audience = match request.kind {
            AnalysisKind::Skin => "a skin lesion classifier",
            AnalysisKind::Radiology => "a chest X-ray classifier",
            AnalysisKind::Triage => "a symptom intake conversation",
        };
        let mut prompt = format!(
            "A result from {} reports \"{}\" with {:.0}% confidence and {} risk.\n",
            audience,
            request.subject_label(),
            request.confidence * 100.0,
            request.risk
        );
        if !request.recommendations.is_empty() {
            prompt.push_str("Recommendations: ");
            prompt.push_str(&request.recommendations.join("; "));
            prompt.push('\n');
        }
        if let Some(ref ctx) = request.extra_context {
            prompt.push_str("Context: ");
            prompt.push_str(ctx);
            prompt.push('\n');
        }
        prompt.push_str(
            "Write two short paragraphs separated by a blank line. The first summarizes the \
             result for a patient. The second explains the condition in plain language. \
             Do not give a diagnosis.",
        );
        prompt
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Split a completion into summary and explanation paragraphs.
fn split_completion(content: &str) -> Option<(String, String)> {
    let mut paragraphs = content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let text = paragraphs.next()?.to_string();
    let explanation = paragraphs.collect::<Vec<_>>().join("\n\n");
    Some((text, explanation))
}

#[async_trait]
impl EnrichmentProvider for ChatCompletionSummaryProvider {
    type Output = Summary;

    fn name(&self) -> &'static str {
        "summary"
    }

    async fn fetch(&self, request: &EnrichmentRequest) -> Result<Summary, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(format!("{} is not set", self.key_env))
        })?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a careful medical communicator writing for patients."
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::prompt(request),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let (text, explanation) = split_completion(&content).ok_or(ProviderError::EmptyPayload)?;

        tracing::debug!(chars = text.len(), "Summary completion received");

        Ok(Summary {
            text,
            explanation,
            confidence_note: fallback::confidence_note(request.confidence),
            risk_note: fallback::risk_note(request.risk),
        })
    }
}
