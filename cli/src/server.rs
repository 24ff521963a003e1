// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server lifecycle
//!
//! Builds the application state from configuration, installs the optional
//! Prometheus exporter and serves the API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use resume_backend_core::domain::config::PortfolioConfig;
use resume_backend_core::presentation::api::{app, AppState};

pub async fn start_server(config: PortfolioConfig) -> Result<()> {
    let server = config.spec.server.clone();
    let metrics = config.spec.metrics.clone();

    let state = AppState::from_config(config).context("Failed to initialize services")?;
    info!(
        "Configured AI providers: [{}]",
        state
            .gateway
            .registry()
            .provider_ids()
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if metrics.enabled {
        let addr: SocketAddr = ([0, 0, 0, 0], metrics.port).into();
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", addr);
    }

    let router = app(Arc::new(state));

    let bind = format!("{}:{}", server.bind_address, server.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    info!("HTTP server listening on {}", bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerStatus {
    Running {
        version: Option<String>,
        ai: Option<Value>,
    },
    Stopped,
    Unhealthy {
        error: String,
    },
}

pub fn base_url(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host.trim_end_matches('/'), port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Check a running server via `/health`, then fetch `/api/v1/ai/status`
pub async fn check_server_running(host: &str, port: u16) -> Result<ServerStatus> {
    fetch_status(&base_url(host, port)).await
}

pub async fn fetch_status(base_url: &str) -> Result<ServerStatus> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(1500))
        .build()?;

    let health = match client.get(format!("{}/health", base_url)).send().await {
        Ok(resp) if resp.status().is_success() => resp.json::<Value>().await.ok(),
        Ok(resp) => {
            return Ok(ServerStatus::Unhealthy {
                error: format!("HTTP {}", resp.status()),
            })
        }
        Err(e) if e.is_connect() || e.is_timeout() => return Ok(ServerStatus::Stopped),
        Err(e) => return Ok(ServerStatus::Unhealthy { error: e.to_string() }),
    };

    let version = health
        .as_ref()
        .and_then(|h| h.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    // AI status is informative only; a missing route still counts as running
    let ai = match client.get(format!("{}/api/v1/ai/status", base_url)).send().await {
        Ok(resp) if resp.status().is_success() => resp.json::<Value>().await.ok(),
        _ => None,
    };

    Ok(ServerStatus::Running { version, ai })
}
