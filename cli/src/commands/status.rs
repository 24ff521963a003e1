// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `resume-backend status`

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use crate::server::{base_url, check_server_running, ServerStatus};

pub async fn run(host: &str, port: u16) -> Result<()> {
    let url = base_url(host, port);

    match check_server_running(host, port).await? {
        ServerStatus::Running { version, ai } => {
            println!(
                "{} {} (v{})",
                "✓ Server running at".green(),
                url,
                version.as_deref().unwrap_or("unknown")
            );
            if let Some(ai) = ai {
                print_ai_status(&ai);
            }
        }
        ServerStatus::Stopped => {
            println!("{} {}", "✗ Server not reachable at".red(), url);
        }
        ServerStatus::Unhealthy { error } => {
            println!("{} {}: {}", "⚠ Server unhealthy at".yellow(), url, error);
        }
    }

    Ok(())
}

fn print_ai_status(ai: &Value) {
    let status = ai.get("status").and_then(Value::as_str).unwrap_or("unknown");
    println!("  AI service: {}", status);

    if let Some(providers) = ai.get("providers").and_then(Value::as_object) {
        for (name, configured) in providers {
            let mark = if configured.as_bool().unwrap_or(false) {
                "configured".green()
            } else {
                "not configured".dimmed()
            };
            println!("    {}: {}", name, mark);
        }
    }
}
