// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP error mapping
//
// Every failure leaves the API as
// `{ "success": false, "error", "error_code", "timestamp" }`.
// Provider detail text is logged by the gateway and never copied here.

use crate::domain::errors::{DataError, GatewayError};
use crate::domain::llm::ProviderErrorKind;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    error_code: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Map a content error; `resource` names what the caller asked for
    pub fn from_data(resource: &str, error: &DataError) -> Self {
        match error {
            DataError::ProjectNotFound(_) => Self::not_found("Project not found"),
            _ => Self::not_found(format!("{} data not found", resource)),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        let status = match &error {
            GatewayError::InvalidRequest(_) | GatewayError::Template(_) => StatusCode::BAD_REQUEST,
            GatewayError::Provider(e) if e.kind == ProviderErrorKind::Timeout => {
                StatusCode::GATEWAY_TIMEOUT
            }
            GatewayError::Provider(_) => StatusCode::BAD_GATEWAY,
            GatewayError::NoProviderAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let message = match &error {
            GatewayError::Provider(e) => e.kind.public_message().to_string(),
            other => other.to_string(),
        };

        Self::new(status, error.code(), message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
            error_code: self.code,
            timestamp: chrono::Utc::now(),
        };
        (self.status, Json(body)).into_response()
    }
}
