// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP API
//
// Axum router for the whole backend. Handlers only translate between JSON
// and application services; failures go through ApiError.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::application::ai_gateway::{AiGateway, AiStatusReport, GatewaySettings};
use crate::application::data_service::{DataStats, PortfolioDataService, ProjectQuery};
use crate::application::health_service::{
    ConfigStatus, Diagnostics, HealthReport, HealthService, SystemStatus,
};
use crate::domain::config::PortfolioConfig;
use crate::domain::errors::{ConfigError, DataError};
use crate::domain::llm::{ChatMessage, ChatRequest, ClassificationResult, NormalizedResponse};
use crate::infrastructure::data_store::JsonFileStore;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::llm::ProviderRegistry;
use crate::infrastructure::prompt_catalog::PromptCatalog;
use crate::presentation::error::ApiError;

pub struct AppState {
    pub config: Arc<PortfolioConfig>,
    pub gateway: Arc<AiGateway>,
    pub data: Arc<PortfolioDataService>,
    pub health: Arc<HealthService>,
}

impl AppState {
    /// Build every service from a loaded configuration
    pub fn from_config(config: PortfolioConfig) -> Result<Self, ConfigError> {
        let config = Arc::new(config);
        let event_bus = Arc::new(EventBus::with_default_capacity());
        let ai = &config.spec.ai;

        let catalog = Arc::new(PromptCatalog::load_configured(ai.prompts_path.as_deref())?);
        let registry = Arc::new(ProviderRegistry::from_config(ai)?);
        Ok(Self::assemble(config, catalog, registry, event_bus))
    }

    /// Build from prepared parts; tests use this to inject providers
    pub fn assemble(
        config: Arc<PortfolioConfig>,
        catalog: Arc<PromptCatalog>,
        registry: Arc<ProviderRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let gateway = Arc::new(AiGateway::new(
            catalog,
            registry,
            event_bus.clone(),
            GatewaySettings::from_config(&config.spec.ai),
        ));
        let data = Arc::new(PortfolioDataService::new(
            JsonFileStore::new(&config.spec.data.data_dir),
            config.spec.data.cache_enabled,
            event_bus,
        ));
        let health = Arc::new(HealthService::new(config.clone(), data.clone(), gateway.clone()));

        Self { config, gateway, data, health }
    }
}

type SharedState = State<Arc<AppState>>;

/// Standard success envelope used by status and content routes
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
            timestamp: Utc::now(),
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.spec.server.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Main
        .route("/api/v1/health", get(detailed_health))
        .route("/api/v1/status", get(system_status))
        .route("/api/v1/config", get(config_status))
        .route("/api/v1/diagnostics", get(diagnostics))
        // Portfolio content
        .route("/api/v1/data/profile", get(profile))
        .route("/api/v1/data/intro", get(intro))
        .route("/api/v1/data/layout", get(layout))
        .route("/api/v1/data/projects", get(projects))
        .route("/api/v1/data/projects/{project_id}", get(project_by_id))
        .route("/api/v1/data/experience", get(experience))
        .route("/api/v1/data/certificates", get(certificates))
        .route("/api/v1/data/stats", get(data_stats))
        .route("/api/v1/data/cache/clear", post(clear_cache))
        // AI
        .route("/api/v1/ai/chat", post(ai_chat))
        .route("/api/v1/ai/classify", post(ai_classify))
        .route("/api/v1/ai/status", get(ai_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `["*"]` allows any origin without credentials; an explicit list allows
/// credentials and mirrors the requested methods and headers.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

// ============================================================================
// Root and health
// ============================================================================

async fn root(State(state): SharedState) -> Json<Value> {
    Json(json!({
        "message": "Welcome to Resume Backend API",
        "version": state.health.version(),
        "status": "running",
    }))
}

async fn health(State(state): SharedState) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": state.health.version(),
    }))
}

async fn detailed_health(State(state): SharedState) -> Json<HealthReport> {
    Json(state.health.health())
}

async fn system_status(State(state): SharedState) -> Json<ApiResponse<SystemStatus>> {
    ApiResponse::ok("Application is running", state.health.system_status())
}

async fn config_status(State(state): SharedState) -> Json<ApiResponse<ConfigStatus>> {
    ApiResponse::ok("Configuration retrieved", state.health.config_status())
}

async fn diagnostics(State(state): SharedState) -> Json<Diagnostics> {
    Json(state.health.diagnostics().await)
}

// ============================================================================
// Portfolio content
// ============================================================================

fn content<T: Serialize>(
    resource: &str,
    message: &str,
    result: Result<T, DataError>,
) -> Result<Json<ApiResponse<T>>, ApiError> {
    result
        .map(|data| ApiResponse::ok(message, data))
        .map_err(|e| ApiError::from_data(resource, &e))
}

async fn profile(State(state): SharedState) -> Result<Json<ApiResponse<Value>>, ApiError> {
    content("Profile", "Profile retrieved successfully", state.data.profile().await)
}

async fn intro(State(state): SharedState) -> Result<Json<ApiResponse<Value>>, ApiError> {
    content("Intro", "Introduction retrieved successfully", state.data.intro().await)
}

async fn layout(State(state): SharedState) -> Result<Json<ApiResponse<Value>>, ApiError> {
    content("Layout", "Layout retrieved successfully", state.data.layout().await)
}

async fn experience(State(state): SharedState) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    content("Experience", "Experience data retrieved successfully", state.data.experience().await)
}

async fn certificates(
    State(state): SharedState,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    content("Certificates", "Certificates retrieved successfully", state.data.certificates().await)
}

#[derive(Debug, Deserialize)]
pub struct ProjectsParams {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<usize>,
}

async fn projects(
    State(state): SharedState,
    params: Result<Query<ProjectsParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let Query(params) = params?;
    let query = ProjectQuery {
        category: params.category,
        featured: params.featured,
        limit: params.limit,
    };

    let projects = state
        .data
        .projects(&query)
        .await
        .map_err(|e| ApiError::from_data("Projects", &e))?;
    let message = format!("Retrieved {} projects", projects.len());
    Ok(ApiResponse::ok(message, projects))
}

async fn project_by_id(
    State(state): SharedState,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    content("Project", "Project retrieved successfully", state.data.project_by_id(&project_id).await)
}

async fn data_stats(State(state): SharedState) -> Json<ApiResponse<DataStats>> {
    ApiResponse::ok("Data statistics retrieved", state.data.stats().await)
}

async fn clear_cache(State(state): SharedState) -> Json<ApiResponse<Value>> {
    let entries = state.data.clear_cache();
    ApiResponse::ok("Cache cleared successfully", json!({ "entries_cleared": entries }))
}

// ============================================================================
// AI
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub template: Option<String>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    pub deadline_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyBody {
    pub text: String,
    pub template: Option<String>,
    pub deadline_ms: Option<u64>,
}

async fn ai_chat(
    State(state): SharedState,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<NormalizedResponse>, ApiError> {
    let Json(body) = body?;
    let template = body
        .template
        .unwrap_or_else(|| state.gateway.settings().chat_template.clone());

    let mut request = ChatRequest::new(body.message, template).with_history(body.history);
    request.variables = body.variables;

    let response = state
        .gateway
        .chat(request, body.deadline_ms.map(Duration::from_millis))
        .await?;
    Ok(Json(response))
}

async fn ai_classify(
    State(state): SharedState,
    body: Result<Json<ClassifyBody>, JsonRejection>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let Json(body) = body?;
    let result = state
        .gateway
        .classify(
            &body.text,
            body.template.as_deref(),
            body.deadline_ms.map(Duration::from_millis),
        )
        .await?;
    Ok(Json(result))
}

async fn ai_status(State(state): SharedState) -> Json<AiStatusReport> {
    Json(state.gateway.status(state.data.cache_enabled()))
}
