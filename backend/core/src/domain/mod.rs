// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Domain types shared by every layer of the backend.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Declares the domain modules

pub mod config;
pub mod errors;
pub mod events;
pub mod llm;
pub mod prompt;
