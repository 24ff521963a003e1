// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Resume Backend
//!
//! The `resume-backend` binary serves the portfolio API and manages its
//! configuration.
//!
//! ## Commands
//!
//! - `resume-backend serve` - Run the HTTP server until Ctrl+C / SIGTERM
//! - `resume-backend config show|validate|generate` - Configuration management
//! - `resume-backend status` - Query a running server
//! - `resume-backend diagnose` - Run the diagnostics checks locally

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use resume_backend::commands::{self, ConfigCommand};
use resume_backend::logging::init_logging;
use resume_backend_core::domain::config::{LogFormat, CONFIG_PATH_ENV};

/// Resume Backend - portfolio content and AI gateway
#[derive(Parser)]
#[command(name = "resume-backend")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    #[command(name = "serve")]
    Serve {
        /// Bind address (overrides spec.server.bind_address)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides spec.server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Check a running server
    #[command(name = "status")]
    Status {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8000")]
        port: u16,
    },

    /// Run diagnostics against the local configuration
    #[command(name = "diagnose")]
    Diagnose,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Same precedence as the process environment: .env.local wins over .env
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve::run(cli.config, cli.log_level, host, port).await
        }
        Commands::Config { command } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), LogFormat::Text)?;
            commands::config::handle_command(command, cli.config).await
        }
        Commands::Status { host, port } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), LogFormat::Text)?;
            commands::status::run(&host, port).await
        }
        Commands::Diagnose => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), LogFormat::Text)?;
            commands::diagnose::run(cli.config).await
        }
    }
}
