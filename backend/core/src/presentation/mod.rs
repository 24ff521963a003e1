// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`resume-backend-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. **No business logic lives here**; all real work is delegated to
//! application services in `crate::application`.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Axum router: root, health, static content and AI routes |
//! | [`error`] | `ApiError`, the single mapping from domain errors to HTTP responses |

pub mod api;
pub mod error;
