// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AI Gateway
//!
//! Facade the HTTP layer calls for chat and classification.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Purpose:** Own the lifecycle of one AI request
//! - **Integration:** presentation::api → AiGateway → PromptCatalog + ProviderRegistry
//!
//! # Request Lifecycle
//!
//! `Received → TemplateRendered → ProviderSelected → Invoked → Succeeded | Failed`
//!
//! - Transient provider failures (timeout, rate limit, unavailable) move on to
//!   the next candidate in priority order, once per candidate.
//! - Auth and malformed-response failures stop the request immediately.
//! - Every request ends with exactly one `AiEvent::RequestCompleted`, and
//!   every failover publishes one `AiEvent::ProviderFallback`.
//! - An optional caller deadline bounds the whole request; each attempt is
//!   also bounded by the configured provider timeout.

use crate::domain::config::AiConfig;
use crate::domain::errors::GatewayError;
use crate::domain::events::{AiEvent, RequestOutcome};
use crate::domain::llm::{
    Capability, ChatMessage, ChatRequest, ClassificationResult, LLMProvider, NormalizedResponse,
    ProviderError, ProviderId,
};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::llm::ProviderRegistry;
use crate::infrastructure::prompt_catalog::PromptCatalog;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Gateway knobs taken from the `ai` configuration section
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub attempt_timeout: Duration,
    pub chat_template: String,
    pub classify_template: String,
    pub priority: Vec<ProviderId>,
}

impl GatewaySettings {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            attempt_timeout: config.timeout(),
            chat_template: config.chat_template.clone(),
            classify_template: config.classify_template.clone(),
            priority: config.priority_order(),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}

/// Body of `GET /api/v1/ai/status`
#[derive(Debug, Clone, Serialize)]
pub struct AiStatusReport {
    pub status: &'static str,
    pub components: BTreeMap<&'static str, &'static str>,
    pub providers: BTreeMap<&'static str, bool>,
    pub priority: Vec<ProviderId>,
    pub timestamp: DateTime<Utc>,
}

struct Dispatched<T> {
    result: Result<T, GatewayError>,
    provider: Option<ProviderId>,
    attempts: u32,
}

impl<T> Dispatched<T> {
    fn rejected(error: GatewayError) -> Self {
        Self { result: Err(error), provider: None, attempts: 0 }
    }
}

pub struct AiGateway {
    catalog: Arc<PromptCatalog>,
    registry: Arc<ProviderRegistry>,
    event_bus: Arc<EventBus>,
    settings: GatewaySettings,
}

impl AiGateway {
    pub fn new(
        catalog: Arc<PromptCatalog>,
        registry: Arc<ProviderRegistry>,
        event_bus: Arc<EventBus>,
        settings: GatewaySettings,
    ) -> Self {
        Self { catalog, registry, event_bus, settings }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Render the chat template and dispatch it with fallback
    pub async fn chat(
        &self,
        request: ChatRequest,
        deadline: Option<Duration>,
    ) -> Result<NormalizedResponse, GatewayError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        debug!(%request_id, stage = "Received", template = %request.template_name, "AI chat request");

        let dispatched = match self.render_chat(&request) {
            Ok(prompt) => {
                debug!(%request_id, stage = "TemplateRendered", "Prompt rendered");
                let history: &[ChatMessage] = &request.history;
                let prompt = prompt.as_str();
                self.dispatch(request_id, Capability::Chat, deadline, move |provider| async move {
                    provider.invoke(prompt, history).await
                })
                .await
            }
            Err(e) => Dispatched::rejected(e),
        };

        self.complete(request_id, Capability::Chat, started, dispatched)
    }

    /// Classify `text` with `template` (or the configured classify template)
    pub async fn classify(
        &self,
        text: &str,
        template: Option<&str>,
        deadline: Option<Duration>,
    ) -> Result<ClassificationResult, GatewayError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let template = template.unwrap_or(&self.settings.classify_template);
        debug!(%request_id, stage = "Received", template, "AI classify request");

        let dispatched = match self.render_classify(text, template) {
            Ok(prompt) => {
                debug!(%request_id, stage = "TemplateRendered", "Prompt rendered");
                let prompt = prompt.as_str();
                self.dispatch(request_id, Capability::Classify, deadline, move |provider| async move {
                    provider.classify(prompt).await
                })
                .await
            }
            Err(e) => Dispatched::rejected(e),
        };

        self.complete(request_id, Capability::Classify, started, dispatched)
    }

    /// Provider availability derived from the registry; no network calls
    pub fn status(&self, cache_enabled: bool) -> AiStatusReport {
        let providers: BTreeMap<&'static str, bool> = ProviderId::ALL
            .iter()
            .map(|id| (id.as_str(), self.registry.is_configured(*id)))
            .collect();

        let operational = !self.registry.is_empty();

        AiStatusReport {
            status: if operational { "operational" } else { "degraded" },
            components: BTreeMap::from([
                ("llm_service", if operational { "operational" } else { "degraded" }),
                ("cache", if cache_enabled { "operational" } else { "disabled" }),
            ]),
            providers,
            priority: self.settings.priority.clone(),
            timestamp: Utc::now(),
        }
    }

    fn render_chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        if request.message.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("message cannot be empty".into()));
        }

        let mut variables = request.variables.clone();
        variables.insert("message".to_string(), request.message.clone());
        Ok(self.catalog.render(&request.template_name, &variables)?)
    }

    fn render_classify(&self, text: &str, template: &str) -> Result<String, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("text cannot be empty".into()));
        }

        let variables = HashMap::from([("text".to_string(), text.to_string())]);
        Ok(self.catalog.render(template, &variables)?)
    }

    async fn dispatch<T, F, Fut>(
        &self,
        request_id: Uuid,
        capability: Capability,
        deadline: Option<Duration>,
        call: F,
    ) -> Dispatched<T>
    where
        F: Fn(Arc<dyn LLMProvider>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let candidates = self.registry.candidates(capability);
        if candidates.is_empty() {
            return Dispatched::rejected(GatewayError::NoProviderAvailable(capability));
        }

        let deadline_at = deadline.map(|d| Instant::now() + d);
        let mut attempts = 0;
        let mut last: Option<(ProviderId, ProviderError)> = None;

        for (index, provider) in candidates.iter().enumerate() {
            let provider_id = provider.id();

            let budget = match deadline_at {
                Some(at) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    remaining.min(self.settings.attempt_timeout)
                }
                None => self.settings.attempt_timeout,
            };

            attempts += 1;
            debug!(%request_id, stage = "ProviderSelected", provider = %provider_id, attempt = attempts);

            let outcome = match tokio::time::timeout(budget, call(provider.clone())).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::timeout(format!(
                    "{} did not answer within {}ms",
                    provider_id,
                    budget.as_millis()
                ))),
            };
            debug!(%request_id, stage = "Invoked", provider = %provider_id, ok = outcome.is_ok());

            match outcome {
                Ok(value) => {
                    return Dispatched { result: Ok(value), provider: Some(provider_id), attempts };
                }
                Err(error) if error.is_transient() => {
                    warn!(%request_id, provider = %provider_id, "Transient provider failure: {}", error);

                    let deadline_passed = deadline_at.is_some_and(|at| Instant::now() >= at);
                    if !deadline_passed {
                        if let Some(next) = candidates.get(index + 1) {
                            self.record_fallback(request_id, capability, provider_id, next.id(), &error);
                        }
                    }

                    last = Some((provider_id, error));
                    if deadline_passed {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%request_id, provider = %provider_id, "Provider failure: {}", error);
                    return Dispatched {
                        result: Err(GatewayError::Provider(error)),
                        provider: Some(provider_id),
                        attempts,
                    };
                }
            }
        }

        match last {
            Some((provider_id, error)) => Dispatched {
                result: Err(GatewayError::Provider(error)),
                provider: Some(provider_id),
                attempts,
            },
            // Deadline elapsed before any attempt could start
            None => Dispatched {
                result: Err(GatewayError::Provider(ProviderError::timeout(
                    "caller deadline elapsed before dispatch",
                ))),
                provider: None,
                attempts,
            },
        }
    }

    fn record_fallback(
        &self,
        request_id: Uuid,
        capability: Capability,
        from: ProviderId,
        to: ProviderId,
        error: &ProviderError,
    ) {
        info!(%request_id, %from, %to, reason = %error.kind, "Falling back to next provider");
        metrics::counter!(
            "ai_provider_fallbacks_total",
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);

        self.event_bus.publish_ai_event(AiEvent::ProviderFallback {
            request_id,
            capability,
            from,
            to,
            reason: error.kind,
            occurred_at: Utc::now(),
        });
    }

    fn complete<T>(
        &self,
        request_id: Uuid,
        capability: Capability,
        started: Instant,
        dispatched: Dispatched<T>,
    ) -> Result<T, GatewayError> {
        let latency_ms = started.elapsed().as_millis() as u64;
        let provider_label = dispatched.provider.map(|p| p.as_str()).unwrap_or("none");

        let (outcome, error_code) = match &dispatched.result {
            Ok(_) => (RequestOutcome::Succeeded, None),
            Err(e) => (RequestOutcome::Failed, Some(e.code().to_string())),
        };

        match &dispatched.result {
            Ok(_) => info!(
                %request_id,
                capability = %capability,
                provider = provider_label,
                attempts = dispatched.attempts,
                latency_ms,
                stage = "Succeeded",
                "AI request completed"
            ),
            Err(e) => warn!(
                %request_id,
                capability = %capability,
                provider = provider_label,
                attempts = dispatched.attempts,
                latency_ms,
                stage = "Failed",
                error_code = e.code(),
                "AI request failed: {}",
                e
            ),
        }

        metrics::counter!(
            "ai_requests_total",
            "capability" => capability.as_str(),
            "provider" => provider_label,
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!("ai_request_latency_ms", "capability" => capability.as_str())
            .record(latency_ms as f64);

        self.event_bus.publish_ai_event(AiEvent::RequestCompleted {
            request_id,
            capability,
            provider: dispatched.provider,
            attempts: dispatched.attempts,
            latency_ms,
            outcome,
            error_code,
            completed_at: Utc::now(),
        });

        dispatched.result
    }
}
