// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod data_store;
pub mod event_bus;
pub mod llm;
pub mod prompt_catalog;
