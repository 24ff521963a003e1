// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain LLMProvider interface and one
// vendor API. Everything vendor specific (status codes, error bodies, JSON
// shapes) stops here and leaves as a ProviderError kind.

pub mod anthropic;
pub mod groq;
pub mod openai;
pub mod registry;

pub use anthropic::AnthropicAdapter;
pub use groq::GroqAdapter;
pub use openai::OpenAIAdapter;
pub use registry::ProviderRegistry;

use crate::domain::errors::ConfigError;
use crate::domain::llm::{ProviderError, ProviderErrorKind, ProviderId};
use reqwest::StatusCode;
use std::time::Duration;

/// Upper bound on a provider response body; anything larger is treated as malformed
pub const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Upstream error text kept in log details is clipped to this many characters
const MAX_ERROR_DETAIL_CHARS: usize = 512;

pub(crate) fn build_http_client(
    provider: ProviderId,
    timeout: Duration,
) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient {
            provider: provider.to_string(),
            reason: e.to_string(),
        })
}

/// Status mapping shared by every vendor. Adapters handle their own extra codes first.
pub(crate) fn kind_for_status(status: StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        401 | 403 => ProviderErrorKind::AuthFailure,
        408 => ProviderErrorKind::Timeout,
        429 => ProviderErrorKind::RateLimited,
        500 | 502 | 503 | 504 => ProviderErrorKind::Unavailable,
        s if s >= 500 => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::Malformed,
    }
}

pub(crate) fn map_transport_error(provider: ProviderId, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("{} request timed out", provider))
    } else if e.is_connect() {
        ProviderError::unavailable(format!("{} connection failed: {}", provider, e))
    } else if e.is_decode() {
        ProviderError::malformed(format!("{} response could not be decoded: {}", provider, e))
    } else {
        ProviderError::unavailable(format!("{} request failed: {}", provider, e))
    }
}

/// Read the body of a response with the size cap enforced.
/// Chunked bodies are read incrementally and abandoned once over the cap.
pub(crate) async fn read_body(
    provider: ProviderId,
    mut response: reqwest::Response,
) -> Result<Vec<u8>, ProviderError> {
    let too_large = |size: u64| {
        ProviderError::malformed(format!("{} response of {} bytes exceeds limit", provider, size))
    };

    if let Some(length) = response.content_length() {
        if length > MAX_RESPONSE_BYTES as u64 {
            return Err(too_large(length));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| map_transport_error(provider, e))?
    {
        if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
            return Err(too_large((body.len() + chunk.len()) as u64));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Turn a non-success response into a ProviderError using `classify_status`
pub(crate) async fn error_from_response(
    provider: ProviderId,
    response: reqwest::Response,
    classify_status: fn(StatusCode) -> ProviderErrorKind,
) -> ProviderError {
    let status = response.status();
    let body = read_body(provider, response)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    let detail: String = body.chars().take(MAX_ERROR_DETAIL_CHARS).collect();

    ProviderError::new(
        classify_status(status),
        format!("{} returned HTTP {}: {}", provider, status, detail),
    )
}

/// Parse a JSON body, mapping decode failures to Malformed
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    provider: ProviderId,
    bytes: &[u8],
) -> Result<T, ProviderError> {
    serde_json::from_slice(bytes).map_err(|e| {
        ProviderError::malformed(format!("{} returned an unexpected body: {}", provider, e))
    })
}
