// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `resume-backend diagnose` - the `/api/v1/diagnostics` checks, run locally

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use resume_backend_core::application::health_service::{CheckStatus, Diagnostics};
use resume_backend_core::domain::config::PortfolioConfig;
use resume_backend_core::presentation::api::AppState;

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config =
        PortfolioConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let state = AppState::from_config(config).context("Failed to initialize services")?;

    let diagnostics = state.health.diagnostics().await;
    print_diagnostics(&diagnostics);

    if diagnostics.overall_status == CheckStatus::Fail {
        bail!("Diagnostics failed");
    }
    Ok(())
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    println!("{}", "Diagnostics:".bold());
    for check in &diagnostics.checks {
        let mark = match check.status {
            CheckStatus::Pass => "✓".green(),
            CheckStatus::Warning => "⚠".yellow(),
            CheckStatus::Fail => "✗".red(),
        };
        println!("  {} {:<18} {}", mark, check.name, check.details.dimmed());
    }
    println!();

    match diagnostics.overall_status {
        CheckStatus::Fail => println!("{}", "Overall: fail".red()),
        _ => println!("{}", "Overall: pass".green()),
    }
}
