// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Health Service - liveness, status, configuration summary and diagnostics
//
// Everything here is derived from in-process state. No host resource
// probing and no provider network calls.

use crate::application::ai_gateway::AiGateway;
use crate::application::data_service::PortfolioDataService;
use crate::domain::config::PortfolioConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub uptime: f64,
    pub environment: String,
}

/// Configuration summary; never carries credentials
#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub app_name: String,
    pub version: String,
    pub debug: bool,
    pub cors_origins: Vec<String>,
    pub data_directory: String,
    pub log_level: String,
    pub cache_enabled: bool,
    pub ai_providers_configured: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub timestamp: DateTime<Utc>,
    pub checks: Vec<DiagnosticCheck>,
    pub overall_status: CheckStatus,
}

pub struct HealthService {
    config: Arc<PortfolioConfig>,
    data: Arc<PortfolioDataService>,
    gateway: Arc<AiGateway>,
    started: Instant,
}

impl HealthService {
    pub fn new(
        config: Arc<PortfolioConfig>,
        data: Arc<PortfolioDataService>,
        gateway: Arc<AiGateway>,
    ) -> Self {
        Self { config, data, gateway, started: Instant::now() }
    }

    pub fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn version(&self) -> &str {
        &self.config.spec.app.version
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            timestamp: Utc::now(),
            version: self.version().to_string(),
            uptime: self.uptime(),
        }
    }

    pub fn system_status(&self) -> SystemStatus {
        let spec = &self.config.spec;
        SystemStatus {
            version: spec.app.version.clone(),
            debug: spec.app.debug,
            host: spec.server.bind_address.clone(),
            port: spec.server.port,
            uptime: self.uptime(),
            environment: spec.app.environment.clone(),
        }
    }

    pub fn config_status(&self) -> ConfigStatus {
        let spec = &self.config.spec;
        ConfigStatus {
            app_name: spec.app.name.clone(),
            version: spec.app.version.clone(),
            debug: spec.app.debug,
            cors_origins: spec.server.cors_origins.clone(),
            data_directory: spec.data.data_dir.display().to_string(),
            log_level: spec.logging.level.clone(),
            cache_enabled: spec.data.cache_enabled,
            ai_providers_configured: self.gateway.registry().len(),
        }
    }

    fn service_states(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("data_service", "operational"),
            ("ai_service", self.gateway.status(self.data.cache_enabled()).status),
            ("database", "not_configured"),
            ("cache", if self.data.cache_enabled() { "operational" } else { "disabled" }),
        ]
    }

    pub async fn diagnostics(&self) -> Diagnostics {
        let mut checks = Vec::new();

        let data_dir = self.data.store().root().display().to_string();
        checks.push(DiagnosticCheck {
            name: "Data Directory",
            status: if self.data.store().root_exists().await {
                CheckStatus::Pass
            } else {
                CheckStatus::Fail
            },
            details: format!("Directory: {}", data_dir),
        });

        let app = &self.config.spec.app;
        checks.push(DiagnosticCheck {
            name: "Configuration",
            status: match self.config.validate() {
                Ok(()) => CheckStatus::Pass,
                Err(_) => CheckStatus::Fail,
            },
            details: format!("App: {} v{}", app.name, app.version),
        });

        let providers = self.gateway.registry().len();
        checks.push(DiagnosticCheck {
            name: "AI Providers",
            status: if providers > 0 { CheckStatus::Pass } else { CheckStatus::Warning },
            details: format!("Configured providers: {}", providers),
        });

        let catalog = self.gateway.catalog();
        let settings = self.gateway.settings();
        let templates_present =
            catalog.contains(&settings.chat_template) && catalog.contains(&settings.classify_template);
        checks.push(DiagnosticCheck {
            name: "Prompt Templates",
            status: if templates_present { CheckStatus::Pass } else { CheckStatus::Warning },
            details: format!("Loaded templates: {}", catalog.names().join(", ")),
        });

        let services = self.service_states();
        let operational = services.iter().filter(|(_, state)| *state == "operational").count();
        checks.push(DiagnosticCheck {
            name: "Services",
            status: if operational > 0 { CheckStatus::Pass } else { CheckStatus::Warning },
            details: format!("Operational services: {}/{}", operational, services.len()),
        });

        let overall_status = if checks.iter().any(|c| c.status == CheckStatus::Fail) {
            CheckStatus::Fail
        } else {
            CheckStatus::Pass
        };

        Diagnostics { timestamp: Utc::now(), checks, overall_status }
    }
}
