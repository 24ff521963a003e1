// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use resume_backend_core::domain::config::{PortfolioConfig, CONFIG_PATH_ENV};
use resume_backend_core::infrastructure::prompt_catalog::PromptCatalog;

const SAMPLE_CONFIG: &str = include_str!("../../templates/config-sample.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file and prompt templates
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./resume-backend.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, force } => generate(&output, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  --config flag: {}", path.display()),
            None => println!("  --config flag: {}", "(not set)".dimmed()),
        }
        if std::env::var(CONFIG_PATH_ENV).is_err() {
            println!("  {}: {}", CONFIG_PATH_ENV, "(not set)".dimmed());
        }
        for (i, path) in PortfolioConfig::candidate_paths().iter().enumerate() {
            let found = if path.exists() { "found".green() } else { "missing".dimmed() };
            println!("  {}. {} ({})", i + 1, path.display(), found);
        }
        println!();
    }

    let config = PortfolioConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let spec = &config.spec;

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Application:".bold());
    println!("  Name: {} v{}", spec.app.name, spec.app.version);
    println!("  Environment: {}", spec.app.environment);
    println!("  Debug: {}", spec.app.debug);
    println!();

    println!("{}", "Server:".bold());
    println!("  Bind: {}:{}", spec.server.bind_address, spec.server.port);
    println!("  CORS origins: {}", spec.server.cors_origins.join(", "));
    println!();

    println!("{}", "Content:".bold());
    println!("  Data directory: {}", spec.data.data_dir.display());
    println!("  Cache: {}", if spec.data.cache_enabled { "enabled" } else { "disabled" });
    println!();

    // Credentials are reported as present or absent, never printed
    println!("{}", "AI Providers:".bold());
    println!("  Timeout: {}ms", spec.ai.timeout_ms);
    for id in spec.ai.priority_order() {
        let model = spec
            .ai
            .provider(id)
            .map(|p| p.model_or_default())
            .unwrap_or_else(|| "-".to_string());
        let credential = if spec.ai.credential(id).is_some() {
            "credential set".green()
        } else {
            "no credential".dimmed()
        };
        println!("  {} ({}) - {}", id.as_str().bold(), model, credential);
    }
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", spec.logging.level);
    println!("  Format: {:?}", spec.logging.format);
    if let Some(file) = &spec.logging.file {
        println!(
            "  Files: {} ({}, {}_*.log)",
            file.dir.display(),
            file.complete_file,
            file.session_prefix
        );
    }
    if spec.metrics.enabled {
        println!("  Metrics: port {}", spec.metrics.port);
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = PortfolioConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let catalog = PromptCatalog::load_configured(config.spec.ai.prompts_path.as_deref())
        .context("Prompt templates failed to load")?;
    for name in [&config.spec.ai.chat_template, &config.spec.ai.classify_template] {
        if !catalog.contains(name) {
            bail!("Prompt template '{}' is not defined", name);
        }
    }

    println!("{}", "✓ Configuration is valid".green());
    println!("  Prompt templates: {}", catalog.names().join(", "));

    Ok(())
}

fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    std::fs::write(output, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
