// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod ai_gateway;
pub mod data_service;
pub mod health_service;

pub use ai_gateway::{AiGateway, AiStatusReport, GatewaySettings};
pub use data_service::{DataStats, PortfolioDataService, ProjectQuery};
pub use health_service::HealthService;
