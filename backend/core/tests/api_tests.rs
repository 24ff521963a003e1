// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface exercised in-process with `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use resume_backend_core::domain::config::PortfolioConfig;
use resume_backend_core::domain::llm::{
    Capability, ChatMessage, ClassificationResult, LLMProvider, NormalizedResponse, ProviderError,
    ProviderId,
};
use resume_backend_core::infrastructure::event_bus::EventBus;
use resume_backend_core::infrastructure::llm::ProviderRegistry;
use resume_backend_core::infrastructure::prompt_catalog::{BundledPromptSource, PromptCatalog};
use resume_backend_core::presentation::api::{app, AppState};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

struct FixedProvider {
    id: ProviderId,
    outcome: Result<&'static str, ProviderError>,
}

#[async_trait]
impl LLMProvider for FixedProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        "fixed"
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    async fn invoke(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<NormalizedResponse, ProviderError> {
        let text = self.outcome.clone()?;
        Ok(NormalizedResponse {
            provider_id: self.id,
            text: format!("{} [{} turns] {}", text, history.len(), prompt.lines().last().unwrap_or("")),
            tokens_used: Some(42),
            latency_ms: 3,
        })
    }

    async fn classify(&self, _prompt: &str) -> Result<ClassificationResult, ProviderError> {
        Ok(ClassificationResult { label: "question".into(), confidence: Some(0.9) })
    }
}

fn seed_data(dir: &Path) {
    std::fs::write(dir.join("page.json"), json!({"name": "Ada Lovelace"}).to_string()).unwrap();
    std::fs::write(
        dir.join("projects.json"),
        json!([
            {"id": "engine", "title": "Analytical Engine", "category": "Hardware", "featured": true},
            {"id": "notes", "title": "Notes", "category": "Writing"}
        ])
        .to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("jobs.json"), json!([{"company": "Babbage & Co"}]).to_string()).unwrap();
}

fn router(data_dir: &Path, providers: Vec<Arc<dyn LLMProvider>>) -> Router {
    let mut config = PortfolioConfig::default();
    config.spec.data.data_dir = data_dir.to_path_buf();
    router_with_config(config, providers)
}

fn router_with_config(config: PortfolioConfig, providers: Vec<Arc<dyn LLMProvider>>) -> Router {
    let state = AppState::assemble(
        Arc::new(config),
        Arc::new(PromptCatalog::load(&BundledPromptSource).unwrap()),
        Arc::new(ProviderRegistry::from_providers(providers)),
        Arc::new(EventBus::new(32)),
    );
    app(Arc::new(state))
}

fn openai_ok() -> Vec<Arc<dyn LLMProvider>> {
    vec![Arc::new(FixedProvider { id: ProviderId::OpenAI, outcome: Ok("answer") })]
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_and_health() {
    let dir = tempfile::tempdir().unwrap();

    let (status, body) = send(router(dir.path(), vec![]), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to Resume Backend API");
    assert_eq!(body["status"], "running");

    let (status, body) = send(router(dir.path(), vec![]), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (_, body) = send(router(dir.path(), vec![]), get("/api/v1/health")).await;
    assert!(body["uptime"].is_number());

    let (_, body) = send(router(dir.path(), vec![]), get("/api/v1/status")).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["port"], 8000);
}

#[tokio::test]
async fn config_route_has_no_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(router(dir.path(), openai_ok()), get("/api/v1/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ai_providers_configured"], 1);
    assert!(!body.to_string().contains("api_key"));
}

#[tokio::test]
async fn chat_returns_normalized_response() {
    let dir = tempfile::tempdir().unwrap();
    let request = post_json(
        "/api/v1/ai/chat",
        json!({
            "message": "What did you build?",
            "history": [{"role": "user", "content": "hi"}, {"role": "assistant", "content": "hello"}]
        }),
    );

    let (status, body) = send(router(dir.path(), openai_ok()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providerId"], "openai");
    assert_eq!(body["tokensUsed"], 42);
    assert!(body["latencyMs"].is_number());
    assert!(body["text"].as_str().unwrap().starts_with("answer [2 turns]"));
}

#[tokio::test]
async fn chat_template_errors_are_bad_requests() {
    let dir = tempfile::tempdir().unwrap();

    let unknown = post_json("/api/v1/ai/chat", json!({"message": "hi", "template": "missing"}));
    let (status, body) = send(router(dir.path(), openai_ok()), unknown).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "UNKNOWN_TEMPLATE");
    assert_eq!(body["success"], false);

    let empty = post_json("/api/v1/ai/chat", json!({"message": "  "}));
    let (status, body) = send(router(dir.path(), openai_ok()), empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_REQUEST");

    let malformed = post_json("/api/v1/ai/chat", json!({"text": "wrong field"}));
    let (status, body) = send(router(dir.path(), openai_ok()), malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn provider_failures_map_to_gateway_statuses() {
    let dir = tempfile::tempdir().unwrap();

    let timeout: Vec<Arc<dyn LLMProvider>> = vec![Arc::new(FixedProvider {
        id: ProviderId::Groq,
        outcome: Err(ProviderError::timeout("upstream body with secrets")),
    })];
    let (status, body) =
        send(router(dir.path(), timeout), post_json("/api/v1/ai/chat", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error_code"], "PROVIDER_TIMEOUT");
    assert!(!body.to_string().contains("secrets"));

    let auth: Vec<Arc<dyn LLMProvider>> = vec![Arc::new(FixedProvider {
        id: ProviderId::Groq,
        outcome: Err(ProviderError::auth("bad key")),
    })];
    let (status, body) =
        send(router(dir.path(), auth), post_json("/api/v1/ai/chat", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_code"], "PROVIDER_AUTH_FAILURE");
}

#[tokio::test]
async fn no_providers_is_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) =
        send(router(dir.path(), vec![]), post_json("/api/v1/ai/chat", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_code"], "NO_PROVIDER_AVAILABLE");

    let (status, body) = send(router(dir.path(), vec![]), get("/api/v1/ai/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["providers"]["groq"], false);
}

#[tokio::test]
async fn classify_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        router(dir.path(), openai_ok()),
        post_json("/api/v1/ai/classify", json!({"text": "where is the source?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "question");

    let (_, body) = send(router(dir.path(), openai_ok()), get("/api/v1/ai/status")).await;
    assert_eq!(body["status"], "operational");
    assert_eq!(body["providers"]["openai"], true);
    assert_eq!(body["priority"], json!(["groq", "openai", "anthropic"]));
}

#[tokio::test]
async fn content_routes() {
    let dir = tempfile::tempdir().unwrap();
    seed_data(dir.path());

    let (status, body) = send(router(dir.path(), vec![]), get("/api/v1/data/profile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ada Lovelace");

    let (status, body) =
        send(router(dir.path(), vec![]), get("/api/v1/data/projects?category=hardware")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Retrieved 1 projects");

    let (_, body) = send(router(dir.path(), vec![]), get("/api/v1/data/projects?featured=false")).await;
    assert_eq!(body["data"][0]["id"], "notes");

    let (status, body) = send(router(dir.path(), vec![]), get("/api/v1/data/projects/engine")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Analytical Engine");

    let (status, body) = send(router(dir.path(), vec![]), get("/api/v1/data/projects/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");

    let (status, body) = send(router(dir.path(), vec![]), get("/api/v1/data/certificates")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");

    let (_, body) = send(router(dir.path(), vec![]), get("/api/v1/data/stats")).await;
    assert_eq!(body["data"]["projects_count"], 2);
    assert_eq!(body["data"]["experience_count"], 1);
}

#[tokio::test]
async fn cache_clear_route() {
    let dir = tempfile::tempdir().unwrap();
    seed_data(dir.path());
    let router = router(dir.path(), vec![]);

    let (status, _) = send(router.clone(), get("/api/v1/data/profile")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(router, post_json("/api/v1/data/cache/clear", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entries_cleared"], 1);
}

#[tokio::test]
async fn diagnostics_route() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(router(dir.path(), vec![]), get("/api/v1/diagnostics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_status"], "pass");
    assert!(body["checks"].as_array().unwrap().len() >= 4);
}

#[tokio::test]
async fn wildcard_cors_allows_any_origin() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://portfolio.example")
        .body(Body::empty())
        .unwrap();

    let response = router(dir.path(), vec![]).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/ai/chat")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn explicit_cors_origins_allow_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PortfolioConfig::default();
    config.spec.data.data_dir = dir.path().to_path_buf();
    config.spec.server.cors_origins = vec!["https://example.dev".to_string()];
    let router = router_with_config(config, vec![]);

    let response = router.clone().oneshot(preflight("https://example.dev")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://example.dev");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "POST");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "content-type");

    let response = router.oneshot(preflight("https://elsewhere.example")).await.unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
