// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Error taxonomy
//
// ConfigError is fatal at startup, TemplateError is a client fault,
// GatewayError is what the AI routes surface, DataError covers static content.
// ProviderError lives in domain::llm next to the adapter trait.

use crate::domain::llm::{Capability, ProviderError};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Malformed(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("duplicate prompt template '{0}'")]
    DuplicateTemplate(String),

    #[error("prompt template '{template}' references undeclared variable '{variable}'")]
    UndeclaredVariable { template: String, variable: String },

    #[error("prompt template '{template}' contains unsupported expression '{{{{{expression}}}}}'")]
    UnsupportedExpression { template: String, expression: String },

    #[error("prompt template '{template}' failed to compile: {reason}")]
    TemplateSyntax { template: String, reason: String },

    #[error("failed to build HTTP client for {provider}: {reason}")]
    HttpClient { provider: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown prompt template '{0}'")]
    UnknownTemplate(String),

    #[error("prompt template '{template}' is missing variables: {}", .missing.join(", "))]
    MissingVariables { template: String, missing: Vec<String> },

    #[error("prompt template '{template}' failed to render: {reason}")]
    Render { template: String, reason: String },
}

impl TemplateError {
    pub fn code(&self) -> &'static str {
        match self {
            TemplateError::UnknownTemplate(_) => "UNKNOWN_TEMPLATE",
            TemplateError::MissingVariables { .. } => "MISSING_TEMPLATE_VARIABLE",
            TemplateError::Render { .. } => "TEMPLATE_RENDER_FAILED",
        }
    }
}

/// Everything an AI request can fail with once it reaches the gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("provider failure: {0}")]
    Provider(#[from] ProviderError),

    #[error("no configured provider supports {0}")]
    NoProviderAvailable(Capability),
}

impl GatewayError {
    /// Stable, provider-agnostic error code
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "INVALID_REQUEST",
            GatewayError::Template(e) => e.code(),
            GatewayError::Provider(e) => e.kind.code(),
            GatewayError::NoProviderAvailable(_) => "NO_PROVIDER_AVAILABLE",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("data file not found: {0}")]
    Missing(String),

    #[error("failed to read data file {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse data file {file}: {reason}")]
    Malformed { file: String, reason: String },

    #[error("data file {0} is not a JSON array")]
    NotAList(String),

    #[error("project '{0}' not found")]
    ProjectNotFound(String),
}
