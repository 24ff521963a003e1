// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Priority Ordered Provider Selection
//
// Built once at startup from the `ai` section of the manifest. Providers
// without a usable credential are left out entirely, so selection never has
// to look at keys again. Order is fixed at construction: same configuration,
// same candidate list.

use crate::domain::config::AiConfig;
use crate::domain::errors::{ConfigError, GatewayError};
use crate::domain::llm::{ApiKey, Capability, LLMProvider, ProviderId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::anthropic::AnthropicAdapter;
use super::groq::GroqAdapter;
use super::openai::OpenAIAdapter;

/// Configured providers in priority order, highest first
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LLMProvider>>,
}

impl ProviderRegistry {
    /// Create the registry from configuration, resolving `env:` keys from the process environment
    pub fn from_config(config: &AiConfig) -> Result<Self, ConfigError> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    pub fn from_config_with(
        config: &AiConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        info!("Initializing LLM provider registry");

        let timeout = config.timeout();
        let mut providers: Vec<Arc<dyn LLMProvider>> = Vec::new();

        for credential in config.credentials_with(&lookup) {
            let id = credential.provider_id;
            let Some(provider_config) = config.provider(id) else {
                debug!("Provider '{}' not configured, skipping", id);
                continue;
            };

            let provider = Self::create_provider(provider_config, credential.api_key, timeout)?;
            info!("Registered provider: {} ({})", id, provider.model());
            providers.push(provider);
        }

        for id in config.missing_credentials_with(&lookup) {
            warn!("Provider '{}' has no usable credential, skipping", id);
        }

        if providers.is_empty() {
            warn!("No LLM providers configured - AI routes will answer NO_PROVIDER_AVAILABLE");
        }

        Ok(Self { providers })
    }

    fn create_provider(
        config: &crate::domain::config::ProviderConfig,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Arc<dyn LLMProvider>, ConfigError> {
        let provider: Arc<dyn LLMProvider> = match config.provider {
            ProviderId::Groq => Arc::new(GroqAdapter::new(config, api_key, timeout)?),
            ProviderId::OpenAI => Arc::new(OpenAIAdapter::new(config, api_key, timeout)?),
            ProviderId::Anthropic => Arc::new(AnthropicAdapter::new(config, api_key, timeout)?),
        };
        Ok(provider)
    }

    /// Registry over already-built providers, kept in the given order
    pub fn from_providers(providers: Vec<Arc<dyn LLMProvider>>) -> Self {
        Self { providers }
    }

    pub fn empty() -> Self {
        Self { providers: Vec::new() }
    }

    /// Providers able to serve `capability`, in priority order
    pub fn candidates(&self, capability: Capability) -> Vec<Arc<dyn LLMProvider>> {
        self.providers
            .iter()
            .filter(|p| p.supports(capability))
            .cloned()
            .collect()
    }

    /// Highest priority provider for `capability`
    pub fn select(&self, capability: Capability) -> Result<Arc<dyn LLMProvider>, GatewayError> {
        self.providers
            .iter()
            .find(|p| p.supports(capability))
            .cloned()
            .ok_or(GatewayError::NoProviderAvailable(capability))
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn is_configured(&self, id: ProviderId) -> bool {
        self.providers.iter().any(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_ids())
            .finish()
    }
}
