// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Portfolio Backend Configuration
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) covering:
// - Application identity and HTTP binding
// - Static content directory
// - LLM provider credentials, models and priority order
// - Logging and metrics
//
// Built once at startup and shared read-only afterwards.

use crate::domain::errors::ConfigError;
use crate::domain::llm::{ApiKey, ProviderCredential, ProviderId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "PortfolioConfig";
pub const CONFIG_PATH_ENV: &str = "RESUME_BACKEND_CONFIG";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PortfolioConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: PortfolioConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioConfigSpec {
    #[serde(default)]
    pub app: AppSettings,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,

    #[serde(default)]
    pub debug: bool,

    /// Free-form deployment label reported by /api/v1/status
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
            debug: false,
            environment: default_environment(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins; "*" allows any origin without credentials
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding page.json, projects.json, jobs.json, ...
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Keep parsed content files in memory after first read
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider priority, highest first. Unlisted providers are appended in default order.
    #[serde(default = "default_priority")]
    pub priority: Vec<ProviderId>,

    /// Per-attempt provider timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Optional YAML prompt catalog; the bundled catalog is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts_path: Option<PathBuf>,

    #[serde(default = "default_chat_template")]
    pub chat_template: String,

    #[serde(default = "default_classify_template")]
    pub classify_template: String,

    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            timeout_ms: default_timeout_ms(),
            prompts_path: None,
            chat_template: default_chat_template(),
            classify_template: default_classify_template(),
            providers: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderId,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKey>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Base URL override, mostly for proxies and tests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ProviderConfig {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            api_key: None,
            model: None,
            endpoint: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            enabled: true,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(ApiKey::new(key));
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Upper temperature bound the vendor API accepts
    pub fn max_temperature(&self) -> f32 {
        match self.provider {
            ProviderId::Anthropic => 1.0,
            ProviderId::Groq | ProviderId::OpenAI => 2.0,
        }
    }

    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderId::Groq => "llama-3.1-8b-instant",
                ProviderId::OpenAI => "gpt-4o-mini",
                ProviderId::Anthropic => "claude-3-5-haiku-latest",
            }
            .to_string()
        })
    }

    pub fn endpoint_or_default(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderId::Groq => "https://api.groq.com/openai/v1",
                ProviderId::OpenAI => "https://api.openai.com/v1",
                ProviderId::Anthropic => "https://api.anthropic.com/v1",
            }
            .to_string()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// File output in addition to stdout; absent means stdout only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<LogFileConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

/// Every record goes to `dir/complete_file` (appended across runs) and to a
/// fresh `dir/<session_prefix>_<YYYYmmdd_HHMMSS>.log` per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_log_complete_file")]
    pub complete_file: String,

    #[serde(default = "default_log_session_prefix")]
    pub session_prefix: String,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            complete_file: default_log_complete_file(),
            session_prefix: default_log_session_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_app_name() -> String {
    "Resume Backend API".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_priority() -> Vec<ProviderId> {
    ProviderId::ALL.to_vec()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_chat_template() -> String {
    "chat".to_string()
}

fn default_classify_template() -> String {
    "classify".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_log_complete_file() -> String {
    "complete.log".to_string()
}

fn default_log_session_prefix() -> String {
    "session".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl AiConfig {
    /// Enabled settings for one provider, if any
    pub fn provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.provider == id && p.enabled)
    }

    /// Resolved credential for `id`; absent when unset, empty or pointing at an unset variable
    pub fn credential(&self, id: ProviderId) -> Option<ApiKey> {
        self.credential_with(id, |name| std::env::var(name).ok())
    }

    pub fn credential_with(
        &self,
        id: ProviderId,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<ApiKey> {
        let key = self.provider(id)?.api_key.as_ref()?;
        let resolved = resolve_api_key(key, lookup)?;
        (!resolved.is_empty()).then_some(resolved)
    }

    /// Enabled providers whose key is absent, empty or an unset `env:` reference
    pub fn missing_credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<ProviderId> {
        self.priority_order()
            .into_iter()
            .filter(|id| self.provider(*id).is_some() && self.credential_with(*id, &lookup).is_none())
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured priority with duplicates removed and missing providers appended
    pub fn priority_order(&self) -> Vec<ProviderId> {
        let mut order = Vec::with_capacity(ProviderId::ALL.len());
        for id in self.priority.iter().chain(ProviderId::ALL.iter()) {
            if !order.contains(id) {
                order.push(*id);
            }
        }
        order
    }

    /// Usable credentials in priority order
    pub fn credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<ProviderCredential> {
        self.priority_order()
            .into_iter()
            .filter_map(|provider_id| {
                self.credential_with(provider_id, &lookup)
                    .map(|api_key| ProviderCredential { provider_id, api_key })
            })
            .collect()
    }
}

/// Resolve "env:VAR_NAME" references through `lookup`
pub fn resolve_api_key(key: &ApiKey, lookup: impl Fn(&str) -> Option<String>) -> Option<ApiKey> {
    match key.expose().strip_prefix("env:") {
        Some(var_name) => lookup(var_name.trim()).map(ApiKey::new),
        None => Some(key.clone()),
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "resume-backend".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some(default_app_version()),
            },
            spec: PortfolioConfigSpec::default(),
        }
    }
}

impl PortfolioConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Discover configuration file using precedence order
    /// 1. RESUME_BACKEND_CONFIG environment variable
    /// 2. ./resume-backend.yaml (working directory)
    /// 3. ~/.resume-backend/config.yaml (user home)
    /// 4. /etc/resume-backend/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        Self::candidate_paths().into_iter().find(|p| p.exists())
    }

    /// Every location checked by discovery, in order
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("./resume-backend.yaml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".resume-backend").join("config.yaml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/resume-backend/config.yaml"));

        paths
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Explicit CLI path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::warn!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for id in ProviderId::ALL {
            let Some(key) = lookup(id.api_key_env()).filter(|k| !k.trim().is_empty()) else {
                continue;
            };
            tracing::info!("Environment override: {} set", id.api_key_env());
            match self.spec.ai.providers.iter_mut().find(|p| p.provider == id) {
                Some(existing) => existing.api_key = Some(ApiKey::new(key)),
                None => self.spec.ai.providers.push(ProviderConfig::new(id).with_api_key(key)),
            }
        }

        if let Some(host) = lookup("RESUME_BACKEND_HOST") {
            tracing::info!("Environment override: RESUME_BACKEND_HOST={}", host);
            self.spec.server.bind_address = host;
        }

        if let Some(val) = lookup("RESUME_BACKEND_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.spec.server.port = port,
                Err(_) => tracing::warn!(
                    "Invalid value for RESUME_BACKEND_PORT: '{}'. Expected a port number. Ignoring.",
                    val
                ),
            }
        }

        if let Some(dir) = lookup("DATA_DIR") {
            tracing::info!("Environment override: DATA_DIR={}", dir);
            self.spec.data.data_dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup("RESUME_BACKEND_LOG_LEVEL") {
            self.spec.logging.level = level;
        }

        if let Some(val) = lookup("RESUME_BACKEND_AI_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => self.spec.ai.timeout_ms = ms,
                Err(_) => tracing::warn!(
                    "Invalid value for RESUME_BACKEND_AI_TIMEOUT_MS: '{}'. Expected milliseconds. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_version != API_VERSION {
            return Err(ConfigError::Invalid(format!(
                "apiVersion '{}' must be '{}'",
                self.api_version, API_VERSION
            )));
        }

        if self.kind != KIND {
            return Err(ConfigError::Invalid(format!("kind '{}' must be '{}'", self.kind, KIND)));
        }

        if self.metadata.name.is_empty() {
            return Err(ConfigError::Invalid("metadata.name cannot be empty".into()));
        }

        if self.spec.server.port == 0 {
            return Err(ConfigError::Invalid("spec.server.port cannot be 0".into()));
        }

        let ai = &self.spec.ai;
        if ai.timeout_ms == 0 {
            return Err(ConfigError::Invalid("spec.ai.timeout_ms must be greater than 0".into()));
        }

        let mut seen = HashSet::new();
        for id in &ai.priority {
            if !seen.insert(*id) {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' listed twice in spec.ai.priority",
                    id
                )));
            }
        }

        let mut seen = HashSet::new();
        for provider in &ai.providers {
            if !seen.insert(provider.provider) {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' configured more than once",
                    provider.provider
                )));
            }

            if provider.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "model cannot be empty for provider: {}",
                    provider.provider
                )));
            }

            let max_temperature = provider.max_temperature();
            if !(0.0..=max_temperature).contains(&provider.temperature) {
                return Err(ConfigError::Invalid(format!(
                    "temperature {} for provider {} must be within [0, {}]",
                    provider.temperature, provider.provider, max_temperature
                )));
            }

            if provider.max_tokens == 0 {
                return Err(ConfigError::Invalid(format!(
                    "max_tokens must be greater than 0 for provider: {}",
                    provider.provider
                )));
            }
        }

        if ai.chat_template.trim().is_empty() || ai.classify_template.trim().is_empty() {
            return Err(ConfigError::Invalid("spec.ai template names cannot be empty".into()));
        }

        Ok(())
    }
}
