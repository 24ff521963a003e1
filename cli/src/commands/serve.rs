// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `resume-backend serve`

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use resume_backend_core::domain::config::PortfolioConfig;

use crate::logging::init_server_logging;
use crate::server::start_server;

pub async fn run(
    config_path: Option<PathBuf>,
    log_level: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config =
        PortfolioConfig::load_or_default(config_path).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, host, port);

    init_server_logging(&config.spec.logging, log_level.as_deref())?;

    config.validate().context("Configuration validation failed")?;

    info!(
        "Starting {} v{} ({})",
        config.spec.app.name, config.spec.app.version, config.spec.app.environment
    );

    start_server(config).await
}

fn apply_cli_overrides(config: &mut PortfolioConfig, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        config.spec.server.bind_address = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }
}
