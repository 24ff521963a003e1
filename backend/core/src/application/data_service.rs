// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Portfolio Data Service
//
// Serves the static portfolio content (profile, projects, experience,
// certificates) from JSON files with an in-memory cache. Only successfully
// parsed files are cached; a missing or broken file is retried on the next
// request.

use crate::domain::errors::DataError;
use crate::domain::events::ContentEvent;
use crate::infrastructure::data_store::JsonFileStore;
use crate::infrastructure::event_bus::EventBus;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

pub const PROFILE_FILE: &str = "page.json";
pub const INTRO_FILE: &str = "intro.json";
pub const LAYOUT_FILE: &str = "layout.json";
pub const PROJECTS_FILE: &str = "projects.json";
pub const EXPERIENCE_FILE: &str = "jobs.json";
pub const CERTIFICATES_FILE: &str = "certificates.json";

pub const DEFAULT_PROJECT_LIMIT: usize = 50;

/// Filters for the project listing
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataStats {
    pub data_directory: String,
    pub cached_files: Vec<String>,
    pub cache_size: usize,
    pub projects_count: usize,
    pub experience_count: usize,
    pub certificates_count: usize,
}

pub struct PortfolioDataService {
    store: JsonFileStore,
    cache: DashMap<String, Arc<Value>>,
    cache_enabled: bool,
    event_bus: Arc<EventBus>,
}

impl PortfolioDataService {
    pub fn new(store: JsonFileStore, cache_enabled: bool, event_bus: Arc<EventBus>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            cache_enabled,
            event_bus,
        }
    }

    pub fn store(&self) -> &JsonFileStore {
        &self.store
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    async fn load(&self, file: &str) -> Result<Arc<Value>, DataError> {
        if let Some(cached) = self.cache.get(file) {
            return Ok(cached.value().clone());
        }

        let value = match self.store.read(file).await {
            Ok(value) => Arc::new(value),
            Err(e) => {
                error!("Failed to load {}: {}", file, e);
                return Err(e);
            }
        };

        if self.cache_enabled {
            self.cache.insert(file.to_string(), value.clone());
        }
        Ok(value)
    }

    async fn load_list(&self, file: &str) -> Result<Vec<Value>, DataError> {
        match self.load(file).await?.as_ref() {
            Value::Array(items) => Ok(items.clone()),
            _ => {
                error!("{} is not a list", file);
                Err(DataError::NotAList(file.to_string()))
            }
        }
    }

    pub async fn profile(&self) -> Result<Value, DataError> {
        Ok(self.load(PROFILE_FILE).await?.as_ref().clone())
    }

    pub async fn intro(&self) -> Result<Value, DataError> {
        Ok(self.load(INTRO_FILE).await?.as_ref().clone())
    }

    pub async fn layout(&self) -> Result<Value, DataError> {
        Ok(self.load(LAYOUT_FILE).await?.as_ref().clone())
    }

    pub async fn experience(&self) -> Result<Vec<Value>, DataError> {
        self.load_list(EXPERIENCE_FILE).await
    }

    pub async fn certificates(&self) -> Result<Vec<Value>, DataError> {
        self.load_list(CERTIFICATES_FILE).await
    }

    /// Projects filtered by category (case-insensitive) and featured flag, then truncated
    pub async fn projects(&self, query: &ProjectQuery) -> Result<Vec<Value>, DataError> {
        let limit = query.limit.unwrap_or(DEFAULT_PROJECT_LIMIT);

        let projects = self
            .load_list(PROJECTS_FILE)
            .await?
            .into_iter()
            .filter(|project| match &query.category {
                Some(category) => project
                    .get("category")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .eq_ignore_ascii_case(category),
                None => true,
            })
            .filter(|project| match query.featured {
                Some(featured) => {
                    project.get("featured").and_then(Value::as_bool).unwrap_or(false) == featured
                }
                None => true,
            })
            .take(limit)
            .collect();

        Ok(projects)
    }

    pub async fn project_by_id(&self, project_id: &str) -> Result<Value, DataError> {
        self.load_list(PROJECTS_FILE)
            .await?
            .into_iter()
            .find(|project| match project.get("id") {
                Some(Value::String(id)) => id == project_id,
                Some(Value::Number(id)) => id.to_string() == project_id,
                _ => false,
            })
            .ok_or_else(|| DataError::ProjectNotFound(project_id.to_string()))
    }

    /// Drop every cached file; returns how many entries were removed
    pub fn clear_cache(&self) -> usize {
        let entries = self.cache.len();
        self.cache.clear();
        info!("Data cache cleared ({} entries)", entries);

        self.event_bus.publish_content_event(ContentEvent::CacheCleared {
            entries,
            cleared_at: chrono::Utc::now(),
        });
        entries
    }

    pub fn cached_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.cache.iter().map(|entry| entry.key().clone()).collect();
        files.sort();
        files
    }

    pub async fn stats(&self) -> DataStats {
        let projects_count = self.load_list(PROJECTS_FILE).await.map(|p| p.len()).unwrap_or(0);
        let experience_count = self.experience().await.map(|e| e.len()).unwrap_or(0);
        let certificates_count = self.certificates().await.map(|c| c.len()).unwrap_or(0);

        let cached_files = self.cached_files();
        DataStats {
            data_directory: self.store.root().display().to_string(),
            cache_size: cached_files.len(),
            cached_files,
            projects_count,
            experience_count,
            certificates_count,
        }
    }
}
