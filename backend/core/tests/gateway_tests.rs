// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AI gateway behavior against scripted providers (no network).

use async_trait::async_trait;
use resume_backend_core::application::ai_gateway::{AiGateway, GatewaySettings};
use resume_backend_core::domain::errors::GatewayError;
use resume_backend_core::domain::events::{AiEvent, RequestOutcome};
use resume_backend_core::domain::llm::{
    Capability, ChatMessage, ChatRequest, ClassificationResult, LLMProvider, NormalizedResponse,
    ProviderError, ProviderErrorKind, ProviderId,
};
use resume_backend_core::infrastructure::event_bus::{DomainEvent, EventBus};
use resume_backend_core::infrastructure::llm::ProviderRegistry;
use resume_backend_core::infrastructure::prompt_catalog::{BundledPromptSource, PromptCatalog};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
enum Script {
    Reply(&'static str),
    Fail(ProviderErrorKind),
    Hang,
}

struct ScriptedProvider {
    id: ProviderId,
    script: Script,
    calls: AtomicU32,
}

impl ScriptedProvider {
    fn new(id: ProviderId, script: Script) -> Arc<Self> {
        Arc::new(Self { id, script, calls: AtomicU32::new(0) })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn run(&self) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(text) => Ok(text.to_string()),
            Script::Fail(kind) => Err(ProviderError::new(*kind, "scripted failure")),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too late".to_string())
            }
        }
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        "scripted"
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    async fn invoke(
        &self,
        _prompt: &str,
        _history: &[ChatMessage],
    ) -> Result<NormalizedResponse, ProviderError> {
        let text = self.run().await?;
        Ok(NormalizedResponse { provider_id: self.id, text, tokens_used: Some(5), latency_ms: 1 })
    }

    async fn classify(&self, _prompt: &str) -> Result<ClassificationResult, ProviderError> {
        let text = self.run().await?;
        ClassificationResult::from_model_output(&text)
    }
}

fn gateway_with(
    providers: Vec<Arc<ScriptedProvider>>,
    timeout: Duration,
) -> (AiGateway, Arc<EventBus>) {
    let event_bus = Arc::new(EventBus::new(64));
    let providers: Vec<Arc<dyn LLMProvider>> =
        providers.into_iter().map(|p| p as Arc<dyn LLMProvider>).collect();

    let settings = GatewaySettings { attempt_timeout: timeout, ..GatewaySettings::default() };
    let gateway = AiGateway::new(
        Arc::new(PromptCatalog::load(&BundledPromptSource).unwrap()),
        Arc::new(ProviderRegistry::from_providers(providers)),
        event_bus.clone(),
        settings,
    );
    (gateway, event_bus)
}

fn chat(message: &str) -> ChatRequest {
    ChatRequest::new(message, "chat")
}

fn ai_events(events: Vec<DomainEvent>) -> Vec<AiEvent> {
    events
        .into_iter()
        .filter_map(|e| match e {
            DomainEvent::Ai(event) => Some(event),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn rate_limited_primary_falls_back_to_secondary() {
    let primary = ScriptedProvider::new(ProviderId::Groq, Script::Fail(ProviderErrorKind::RateLimited));
    let secondary = ScriptedProvider::new(ProviderId::OpenAI, Script::Reply("from openai"));
    let (gateway, bus) = gateway_with(vec![primary.clone(), secondary.clone()], Duration::from_secs(5));
    let mut receiver = bus.subscribe();

    let response = gateway.chat(chat("Hello"), None).await.unwrap();
    assert_eq!(response.provider_id, ProviderId::OpenAI);
    assert_eq!(response.text, "from openai");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);

    let events = ai_events(receiver.drain());
    let fallbacks: Vec<&AiEvent> = events
        .iter()
        .filter(|e| matches!(e, AiEvent::ProviderFallback { .. }))
        .collect();
    assert_eq!(fallbacks.len(), 1);
    match fallbacks[0] {
        AiEvent::ProviderFallback { from, to, reason, .. } => {
            assert_eq!(*from, ProviderId::Groq);
            assert_eq!(*to, ProviderId::OpenAI);
            assert_eq!(*reason, ProviderErrorKind::RateLimited);
        }
        _ => unreachable!(),
    }

    let completed: Vec<&AiEvent> = events
        .iter()
        .filter(|e| matches!(e, AiEvent::RequestCompleted { .. }))
        .collect();
    assert_eq!(completed.len(), 1);
    match completed[0] {
        AiEvent::RequestCompleted { provider, attempts, outcome, .. } => {
            assert_eq!(*provider, Some(ProviderId::OpenAI));
            assert_eq!(*attempts, 2);
            assert_eq!(*outcome, RequestOutcome::Succeeded);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn auth_failure_does_not_fall_back() {
    let primary = ScriptedProvider::new(ProviderId::Groq, Script::Fail(ProviderErrorKind::AuthFailure));
    let secondary = ScriptedProvider::new(ProviderId::OpenAI, Script::Reply("unused"));
    let (gateway, _bus) = gateway_with(vec![primary.clone(), secondary.clone()], Duration::from_secs(5));

    let err = gateway.chat(chat("Hello"), None).await.unwrap_err();
    assert_eq!(err.code(), "PROVIDER_AUTH_FAILURE");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn malformed_response_does_not_fall_back() {
    let primary = ScriptedProvider::new(ProviderId::OpenAI, Script::Fail(ProviderErrorKind::Malformed));
    let secondary = ScriptedProvider::new(ProviderId::Anthropic, Script::Reply("unused"));
    let (gateway, _bus) = gateway_with(vec![primary, secondary.clone()], Duration::from_secs(5));

    let err = gateway.chat(chat("Hello"), None).await.unwrap_err();
    assert_eq!(err.code(), "PROVIDER_MALFORMED_RESPONSE");
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn every_candidate_tried_once_then_last_error_surfaces() {
    let providers = vec![
        ScriptedProvider::new(ProviderId::Groq, Script::Fail(ProviderErrorKind::Unavailable)),
        ScriptedProvider::new(ProviderId::OpenAI, Script::Fail(ProviderErrorKind::Timeout)),
        ScriptedProvider::new(ProviderId::Anthropic, Script::Fail(ProviderErrorKind::RateLimited)),
    ];
    let (gateway, bus) = gateway_with(providers.clone(), Duration::from_secs(5));
    let mut receiver = bus.subscribe();

    let err = gateway.chat(chat("Hello"), None).await.unwrap_err();
    assert_eq!(err.code(), "PROVIDER_RATE_LIMITED");
    assert!(providers.iter().all(|p| p.calls() == 1));

    let events = ai_events(receiver.drain());
    let fallbacks = events.iter().filter(|e| matches!(e, AiEvent::ProviderFallback { .. })).count();
    assert_eq!(fallbacks, 2);
}

#[tokio::test]
async fn zero_providers_fail_without_dispatch() {
    let (gateway, bus) = gateway_with(vec![], Duration::from_secs(5));
    let mut receiver = bus.subscribe();

    let err = gateway.chat(chat("Hello"), None).await.unwrap_err();
    assert!(matches!(err, GatewayError::NoProviderAvailable(Capability::Chat)));

    let events = ai_events(receiver.drain());
    assert_eq!(events.len(), 1);
    match &events[0] {
        AiEvent::RequestCompleted { provider, attempts, outcome, error_code, .. } => {
            assert_eq!(*provider, None);
            assert_eq!(*attempts, 0);
            assert_eq!(*outcome, RequestOutcome::Failed);
            assert_eq!(error_code.as_deref(), Some("NO_PROVIDER_AVAILABLE"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn slow_provider_times_out_within_margin() {
    let slow = ScriptedProvider::new(ProviderId::Groq, Script::Hang);
    let (gateway, _bus) = gateway_with(vec![slow], Duration::from_millis(100));

    let started = Instant::now();
    let err = gateway.chat(chat("Hello"), None).await.unwrap_err();
    assert_eq!(err.code(), "PROVIDER_TIMEOUT");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn timeout_on_primary_falls_back() {
    let slow = ScriptedProvider::new(ProviderId::Groq, Script::Hang);
    let fast = ScriptedProvider::new(ProviderId::OpenAI, Script::Reply("fast"));
    let (gateway, _bus) = gateway_with(vec![slow, fast], Duration::from_millis(100));

    let response = gateway.chat(chat("Hello"), None).await.unwrap();
    assert_eq!(response.provider_id, ProviderId::OpenAI);
}

#[tokio::test]
async fn caller_deadline_bounds_the_whole_request() {
    let slow = ScriptedProvider::new(ProviderId::Groq, Script::Hang);
    let never_reached = ScriptedProvider::new(ProviderId::OpenAI, Script::Reply("late"));
    let (gateway, _bus) =
        gateway_with(vec![slow, never_reached.clone()], Duration::from_secs(10));

    let started = Instant::now();
    let err = gateway
        .chat(chat("Hello"), Some(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PROVIDER_TIMEOUT");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(never_reached.calls(), 0);
}

#[tokio::test]
async fn classification_uses_capable_provider() {
    let provider = ScriptedProvider::new(
        ProviderId::Groq,
        Script::Reply(r#"{"label": "search", "confidence": 0.75}"#),
    );
    let (gateway, _bus) = gateway_with(vec![provider], Duration::from_secs(5));

    let result = gateway.classify("find rust projects", None, None).await.unwrap();
    assert_eq!(result.label, "search");
    assert_eq!(result.confidence, Some(0.75));
}

#[tokio::test]
async fn response_text_is_preserved() {
    let text = "Line one\n  indented ✓ «quoted» {{not a slot}}\ttab";
    let provider = ScriptedProvider::new(ProviderId::OpenAI, Script::Reply(text));
    let (gateway, _bus) = gateway_with(vec![provider], Duration::from_secs(5));

    let response = gateway.chat(chat("Hello"), None).await.unwrap();
    assert_eq!(response.text, text);
}

#[tokio::test]
async fn concurrent_requests_do_not_serialize() {
    let slowish = ScriptedProvider::new(ProviderId::Groq, Script::Hang);
    let (gateway, _bus) = gateway_with(vec![slowish], Duration::from_millis(200));
    let gateway = Arc::new(gateway);

    let started = Instant::now();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.chat(chat(&format!("msg {}", i)), None).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_err());
    }
    // Eight sequential timeouts would take at least 1.6s
    assert!(started.elapsed() < Duration::from_millis(1500));
}
