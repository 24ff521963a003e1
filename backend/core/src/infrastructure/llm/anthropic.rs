// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Anthropic Claude LLM Provider Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API. Chat only: the
// gateway never routes classification here.

use super::{build_http_client, error_from_response, kind_for_status, map_transport_error, parse_json, read_body};
use crate::domain::config::ProviderConfig;
use crate::domain::errors::ConfigError;
use crate::domain::llm::{
    ApiKey, Capability, ChatMessage, LLMProvider, NormalizedResponse, ProviderError,
    ProviderErrorKind, ProviderId,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

// 529 is Anthropic's "overloaded" status
fn anthropic_status(status: StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        529 => ProviderErrorKind::Unavailable,
        _ => kind_for_status(status),
    }
}

pub struct AnthropicAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(config: &ProviderConfig, api_key: ApiKey, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_http_client(ProviderId::Anthropic, timeout)?,
            endpoint: config.endpoint_or_default().trim_end_matches('/').to_string(),
            api_key,
            model: config.model_or_default(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LLMProvider for AnthropicAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::Chat
    }

    async fn invoke(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<NormalizedResponse, ProviderError> {
        let started = Instant::now();

        let mut messages: Vec<AnthropicMessage<'_>> = history
            .iter()
            .map(|m| AnthropicMessage { role: m.role.as_str(), content: &m.content })
            .collect();
        messages.push(AnthropicMessage { role: "user", content: prompt });

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(ProviderId::Anthropic, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(ProviderId::Anthropic, response, anthropic_status).await);
        }

        let bytes = read_body(ProviderId::Anthropic, response).await?;
        let parsed: MessagesResponse = parse_json(ProviderId::Anthropic, &bytes)?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            return Err(ProviderError::malformed("anthropic returned no text content"));
        }

        Ok(NormalizedResponse {
            provider_id: ProviderId::Anthropic,
            text,
            tokens_used: parsed.usage.map(|u| u.input_tokens + u.output_tokens),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn adapter(endpoint: &str) -> AnthropicAdapter {
        let config = ProviderConfig::new(ProviderId::Anthropic).with_endpoint(endpoint);
        AnthropicAdapter::new(&config, ApiKey::new("sk-ant-test"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_chat_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "sk-ant-test")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-3-5-haiku-latest",
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "content": [
                        {"type": "text", "text": "Hello "},
                        {"type": "tool_use", "id": "x", "name": "noop", "input": {}},
                        {"type": "text", "text": "visitor"}
                    ],
                    "usage": {"input_tokens": 12, "output_tokens": 4}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let response = adapter(&server.url()).invoke("Hello", &[]).await.unwrap();
        assert_eq!(response.provider_id, ProviderId::Anthropic);
        assert_eq!(response.text, "Hello visitor");
        assert_eq!(response.tokens_used, Some(16));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_overloaded_is_transient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let err = adapter(&server.url()).invoke("Hello", &[]).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_forbidden_is_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(403)
            .create_async()
            .await;

        let err = adapter(&server.url()).invoke("Hello", &[]).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::AuthFailure);
    }

    #[tokio::test]
    async fn test_classification_is_not_supported() {
        let adapter = adapter("http://localhost");
        assert!(!adapter.supports(Capability::Classify));
        let err = adapter.classify("anything").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
    }
}
