// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Groq LLM Provider Adapter
//
// Groq serves an OpenAI-compatible API, so the wire work is delegated to the
// shared chat completions client. Groq answers 498 when capacity is exhausted.

use super::kind_for_status;
use super::openai::ChatCompletionsClient;
use crate::domain::config::ProviderConfig;
use crate::domain::errors::ConfigError;
use crate::domain::llm::{
    ApiKey, Capability, ChatMessage, ClassificationResult, LLMProvider, NormalizedResponse,
    ProviderError, ProviderErrorKind, ProviderId,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

fn groq_status(status: StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        498 => ProviderErrorKind::Unavailable,
        _ => kind_for_status(status),
    }
}

pub struct GroqAdapter {
    inner: ChatCompletionsClient,
}

impl GroqAdapter {
    pub fn new(config: &ProviderConfig, api_key: ApiKey, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: ChatCompletionsClient::new(config, api_key, timeout, groq_status)?,
        })
    }
}

#[async_trait]
impl LLMProvider for GroqAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Groq
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
