// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Provider-agnostic request and response shapes for the AI gateway.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption boundary between the gateway and vendor APIs

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// Every adapter in infrastructure/llm/ translates between these types and one
// vendor wire format. The gateway only ever sees ProviderError kinds, never
// vendor status codes or bodies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Groq,
    OpenAI,
    Anthropic,
}

impl ProviderId {
    /// Default priority order, highest first
    pub const ALL: [ProviderId; 3] = [ProviderId::Groq, ProviderId::OpenAI, ProviderId::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Groq => "groq",
            ProviderId::OpenAI => "openai",
            ProviderId::Anthropic => "anthropic",
        }
    }

    /// Environment variable conventionally holding this provider's key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::Groq => "GROQ_API_KEY",
            ProviderId::OpenAI => "OPENAI_API_KEY",
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderId::Groq),
            "openai" => Ok(ProviderId::OpenAI),
            "anthropic" => Ok(ProviderId::Anthropic),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Named operation an adapter may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Chat,
    Classify,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Chat => "chat",
            Capability::Classify => "classify",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque provider secret. Never printed or serialized in clear text.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // env: references are not secrets and stay readable in `config show`
        if self.0.starts_with("env:") {
            serializer.serialize_str(&self.0)
        } else {
            serializer.serialize_str("***")
        }
    }
}

/// A configured credential for one provider
#[derive(Debug, Clone)]
pub struct ProviderCredential {
    pub provider_id: ProviderId,
    pub api_key: ApiKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Normalized chat request accepted by the gateway
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatMessage>,
    pub template_name: String,
    /// Extra template variables beyond `message`
    pub variables: std::collections::HashMap<String, String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, template_name: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            template_name: template_name.into(),
            variables: Default::default(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// Provider-agnostic chat result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    pub provider_id: ProviderId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ClassificationResult {
    /// Parse a model's raw classification output.
    ///
    /// Accepts a bare JSON object or one wrapped in a ```json fence.
    pub fn from_model_output(raw: &str) -> Result<Self, ProviderError> {
        let json = extract_json_object(raw)
            .ok_or_else(|| ProviderError::malformed("classification output is not a JSON object"))?;

        let parsed: ClassificationResult = serde_json::from_str(json)
            .map_err(|e| ProviderError::malformed(format!("invalid classification JSON: {}", e)))?;

        let label = parsed.label.trim().to_string();
        if label.is_empty() {
            return Err(ProviderError::malformed("classification label is empty"));
        }

        if let Some(confidence) = parsed.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ProviderError::malformed(format!(
                    "classification confidence {} outside [0, 1]",
                    confidence
                )));
            }
        }

        Ok(Self { label, confidence: parsed.confidence })
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Shared failure taxonomy for every adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderErrorKind {
    Timeout,
    AuthFailure,
    RateLimited,
    Malformed,
    Unavailable,
}

impl ProviderErrorKind {
    /// Transient kinds are retried against the next provider
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::Timeout | ProviderErrorKind::RateLimited | ProviderErrorKind::Unavailable
        )
    }

    /// Stable external error code
    pub fn code(&self) -> &'static str {
        match self {
            ProviderErrorKind::Timeout => "PROVIDER_TIMEOUT",
            ProviderErrorKind::AuthFailure => "PROVIDER_AUTH_FAILURE",
            ProviderErrorKind::RateLimited => "PROVIDER_RATE_LIMITED",
            ProviderErrorKind::Malformed => "PROVIDER_MALFORMED_RESPONSE",
            ProviderErrorKind::Unavailable => "PROVIDER_UNAVAILABLE",
        }
    }

    /// Caller-facing message, free of vendor detail
    pub fn public_message(&self) -> &'static str {
        match self {
            ProviderErrorKind::Timeout => "The AI provider did not respond in time",
            ProviderErrorKind::AuthFailure => "The AI provider rejected the configured credentials",
            ProviderErrorKind::RateLimited => "The AI provider is rate limiting requests",
            ProviderErrorKind::Malformed => "The AI provider returned an unusable response",
            ProviderErrorKind::Unavailable => "The AI provider is currently unavailable",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::AuthFailure => "authentication failure",
            ProviderErrorKind::RateLimited => "rate limited",
            ProviderErrorKind::Malformed => "malformed",
            ProviderErrorKind::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

/// Adapter failure. `detail` holds upstream text for logs only.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub detail: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, detail)
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::AuthFailure, detail)
    }

    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, detail)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Domain interface for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Model identifier sent on the wire
    fn model(&self) -> &str;

    /// Capability discovery; the gateway never inspects concrete types
    fn supports(&self, capability: Capability) -> bool;

    /// Send `prompt` as the final user turn after `history`
    async fn invoke(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<NormalizedResponse, ProviderError>;

    /// Classify an already rendered classification prompt
    async fn classify(&self, _prompt: &str) -> Result<ClassificationResult, ProviderError> {
        Err(ProviderError::malformed(format!(
            "provider '{}' does not support classification",
            self.id()
        )))
    }
}
