// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::llm::{Capability, ProviderErrorKind, ProviderId};

/// Final state of one gateway request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    Succeeded,
    Failed,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Succeeded => "succeeded",
            RequestOutcome::Failed => "failed",
        }
    }
}

/// Observability records emitted by the AI gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AiEvent {
    /// Exactly one per request, whatever the outcome
    RequestCompleted {
        request_id: Uuid,
        capability: Capability,
        /// Provider that produced the final result or error; None if none was tried
        provider: Option<ProviderId>,
        attempts: u32,
        latency_ms: u64,
        outcome: RequestOutcome,
        /// Stable error code when the request failed
        error_code: Option<String>,
        completed_at: DateTime<Utc>,
    },
    /// A transient failure moved the request to the next provider
    ProviderFallback {
        request_id: Uuid,
        capability: Capability,
        from: ProviderId,
        to: ProviderId,
        reason: ProviderErrorKind,
        occurred_at: DateTime<Utc>,
    },
}

impl AiEvent {
    pub fn request_id(&self) -> Uuid {
        match self {
            AiEvent::RequestCompleted { request_id, .. } => *request_id,
            AiEvent::ProviderFallback { request_id, .. } => *request_id,
        }
    }
}

/// Static content lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContentEvent {
    CacheCleared {
        entries: usize,
        cleared_at: DateTime<Utc>,
    },
}
