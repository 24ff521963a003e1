// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// JSON File Store - Static portfolio content on disk
//
// Thin async wrapper over tokio::fs. Caching lives one layer up in
// PortfolioDataService; this type always touches the filesystem.

use crate::domain::errors::DataError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn root_exists(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Read and parse `file` relative to the root directory
    pub async fn read(&self, file: &str) -> Result<Value, DataError> {
        let path = self.root.join(file);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::Missing(path.display().to_string()));
            }
            Err(source) => {
                return Err(DataError::Io { file: path.display().to_string(), source });
            }
        };

        let value = serde_json::from_slice(&bytes).map_err(|e| DataError::Malformed {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!("Loaded data from {}", file);
        Ok(value)
    }
}
