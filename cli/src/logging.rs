// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tracing subscriber setup shared by every command
//!
//! Stdout always gets a compact or JSON formatter. With `logging.file`
//! configured, plain-text copies also go to the complete log (appended
//! across runs) and to a per-session log file.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use resume_backend_core::domain::config::{LogFileConfig, LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Stdout-only logging, used by the short-lived commands
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    init_with_layers(level, vec![stdout_layer(format)])
}

/// Logging for `serve`: stdout plus the configured log files. `level` overrides `config.level`.
pub fn init_server_logging(config: &LoggingConfig, level: Option<&str>) -> Result<()> {
    let mut layers = vec![stdout_layer(config.format)];
    let mut session_file = None;

    if let Some(file) = &config.file {
        let (file_layers, session) = file_layers(file, Local::now())?;
        layers.extend(file_layers);
        session_file = Some(session);
    }

    init_with_layers(level.unwrap_or(config.level.as_str()), layers)?;

    if let Some(session) = session_file {
        tracing::info!("Session log: {}", session.display());
    }
    Ok(())
}

fn init_with_layers(level: &str, layers: Vec<BoxedLayer>) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer().json().with_target(false).boxed(),
        LogFormat::Text => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
    }
}

pub fn session_file_name(prefix: &str, started: DateTime<Local>) -> String {
    format!("{}_{}.log", prefix, started.format("%Y%m%d_%H%M%S"))
}

/// Writers for the complete log and this process's session log
fn file_layers(config: &LogFileConfig, started: DateTime<Local>) -> Result<(Vec<BoxedLayer>, PathBuf)> {
    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create log directory {}", config.dir.display()))?;

    let session = session_file_name(&config.session_prefix, started);
    let session_path = config.dir.join(&session);

    let complete = rolling::never(&config.dir, &config.complete_file);
    let per_session = rolling::never(&config.dir, &session);

    let layers: Vec<BoxedLayer> = vec![
        fmt::layer().with_writer(complete).with_ansi(false).with_target(true).boxed(),
        fmt::layer().with_writer(per_session).with_ansi(false).with_target(true).boxed(),
    ];
    Ok((layers, session_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_file_name() {
        let started = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(session_file_name("session", started), "session_20260304_050607.log");
    }

    #[test]
    fn test_records_reach_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogFileConfig {
            dir: dir.path().join("logs"),
            ..LogFileConfig::default()
        };
        let complete_path = config.dir.join(&config.complete_file);
        std::fs::create_dir_all(&config.dir).unwrap();
        std::fs::write(&complete_path, "earlier run\n").unwrap();

        let (layers, session_path) = file_layers(&config, Local::now()).unwrap();
        let subscriber = tracing_subscriber::registry().with(layers);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("portfolio request served");
        });

        let complete = std::fs::read_to_string(&complete_path).unwrap();
        assert!(complete.starts_with("earlier run\n"));
        assert!(complete.contains("portfolio request served"));

        let session = std::fs::read_to_string(&session_path).unwrap();
        assert!(!session.contains("earlier run"));
        assert!(session.contains("portfolio request served"));
    }
}
