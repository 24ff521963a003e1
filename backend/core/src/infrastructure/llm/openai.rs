// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI LLM Provider Adapter
//
// Anti-Corruption Layer for the OpenAI chat completions API.
// The same wire format is spoken by Groq, so the HTTP client below is shared
// with the Groq adapter; only status handling and defaults differ.

use super::{build_http_client, error_from_response, kind_for_status, map_transport_error, parse_json, read_body};
use crate::domain::config::ProviderConfig;
use crate::domain::errors::ConfigError;
use crate::domain::llm::{
    ApiKey, Capability, ChatMessage, ClassificationResult, LLMProvider, NormalizedResponse,
    ProviderError, ProviderErrorKind, ProviderId,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

/// HTTP client for any OpenAI-compatible chat completions endpoint
pub(crate) struct ChatCompletionsClient {
    provider: ProviderId,
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
    model: String,
    temperature: f32,
    max_tokens: u32,
    classify_status: fn(StatusCode) -> ProviderErrorKind,
}

impl ChatCompletionsClient {
    pub(crate) fn new(
        config: &ProviderConfig,
        api_key: ApiKey,
        timeout: Duration,
        classify_status: fn(StatusCode) -> ProviderErrorKind,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            provider: config.provider,
            client: build_http_client(config.provider, timeout)?,
            endpoint: config.endpoint_or_default().trim_end_matches('/').to_string(),
            api_key,
            model: config.model_or_default(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            classify_status,
        })
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        json_mode: bool,
    ) -> Result<(String, Option<u32>), ProviderError> {
        let mut messages: Vec<WireMessage<'_>> = history
            .iter()
            .map(|m| WireMessage { role: m.role.as_str(), content: &m.content })
            .collect();
        messages.push(WireMessage { role: "user", content: prompt });

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            // Classification wants a stable label, not creativity
            temperature: if json_mode { 0.0 } else { self.temperature },
            max_tokens: self.max_tokens,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        let url = format!("{}/chat/completions", self.endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(self.provider, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(self.provider, response, self.classify_status).await);
        }

        let bytes = read_body(self.provider, response).await?;
        let parsed: ChatCompletionResponse = parse_json(self.provider, &bytes)?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::malformed(format!("{} returned no completion text", self.provider))
            })?;

        Ok((text, parsed.usage.and_then(|u| u.total_tokens)))
    }

    pub(crate) async fn invoke(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<NormalizedResponse, ProviderError> {
        let started = Instant::now();
        let (text, tokens_used) = self.complete(prompt, history, false).await?;

        Ok(NormalizedResponse {
            provider_id: self.provider,
            text,
            tokens_used,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }

    pub(crate) async fn classify(&self, prompt: &str) -> Result<ClassificationResult, ProviderError> {
        let (text, _) = self.complete(prompt, &[], true).await?;
        ClassificationResult::from_model_output(&text)
    }
}

/// OpenAI adapter (chat and classify)
pub struct OpenAIAdapter {
    inner: ChatCompletionsClient,
}

impl OpenAIAdapter {
    pub fn new(config: &ProviderConfig, api_key: ApiKey, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: ChatCompletionsClient::new(config, api_key, timeout, kind_for_status)?,
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAIAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAI
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(capability, Capability::Chat | Capability::Classify)
    }

    async fn invoke(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<NormalizedResponse, ProviderError> {
        self.inner.invoke(prompt, history).await
    }

    async fn classify(&self, prompt: &str) -> Result<ClassificationResult, ProviderError> {
        self.inner.classify(prompt).await
    }
}
