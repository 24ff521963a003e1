// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Catalog
//!
//! Named prompt templates loaded once at startup and rendered with Handlebars.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn a template name plus visitor input into the final prompt
//! - **Integration:** AiGateway → PromptCatalog::render → LLM adapter
//!
//! # Template Rules
//!
//! - Bodies only contain plain `{{variable}}` slots
//! - Every slot is declared in the template's `variables` list (checked at load)
//! - Rendering fails before any substitution when a declared variable is missing
//! - Values are inserted verbatim (no HTML escaping)
//!
//! # Usage
//!
//! ```ignore
//! let catalog = PromptCatalog::load(&BundledPromptSource)?;
//! let vars = HashMap::from([("message".to_string(), "Hi!".to_string())]);
//! let prompt = catalog.render("chat", &vars)?;
//! ```

use crate::domain::errors::{ConfigError, TemplateError};
use crate::domain::prompt::{PromptTemplate, RawTemplate};
use handlebars::Handlebars;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const BUNDLED_CATALOG: &str = include_str!("../../prompts/default.yaml");

// ============================================================================
// Prompt Sources
// ============================================================================

/// Supplies raw template records; the only I/O the catalog performs
pub trait PromptSource {
    fn read_templates(&self) -> Result<Vec<RawTemplate>, ConfigError>;

    /// Human-readable origin used in logs
    fn describe(&self) -> String;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    templates: Vec<RawTemplate>,
}

fn parse_catalog_yaml(origin: &str, content: &str) -> Result<Vec<RawTemplate>, ConfigError> {
    let file: CatalogFile = serde_yaml::from_str(content)
        .map_err(|e| ConfigError::Malformed(format!("prompt catalog {}: {}", origin, e)))?;
    Ok(file.templates)
}

/// Catalog compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledPromptSource;

impl PromptSource for BundledPromptSource {
    fn read_templates(&self) -> Result<Vec<RawTemplate>, ConfigError> {
        parse_catalog_yaml("<bundled>", BUNDLED_CATALOG)
    }

    fn describe(&self) -> String {
        "bundled catalog".to_string()
    }
}

/// Catalog read from a YAML file on disk
#[derive(Debug, Clone)]
pub struct YamlFilePromptSource {
    path: PathBuf,
}

impl YamlFilePromptSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl PromptSource for YamlFilePromptSource {
    fn read_templates(&self) -> Result<Vec<RawTemplate>, ConfigError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_catalog_yaml(&self.path.display().to_string(), &content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory records, mainly for tests
impl PromptSource for Vec<RawTemplate> {
    fn read_templates(&self) -> Result<Vec<RawTemplate>, ConfigError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory templates", self.len())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Immutable set of validated templates, shared read-only across requests
pub struct PromptCatalog {
    templates: BTreeMap<String, PromptTemplate>,
    handlebars: Handlebars<'static>,
}

impl std::fmt::Debug for PromptCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptCatalog")
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PromptCatalog {
    /// Load and validate every template from `source`
    pub fn load<S: PromptSource + ?Sized>(source: &S) -> Result<Self, ConfigError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        let mut templates = BTreeMap::new();
        for raw in source.read_templates()? {
            let template = PromptTemplate::from_raw(raw)?;
            let name = template.name().to_string();

            if templates.contains_key(&name) {
                return Err(ConfigError::DuplicateTemplate(name));
            }

            handlebars
                .register_template_string(&name, template.body())
                .map_err(|e| ConfigError::TemplateSyntax {
                    template: name.clone(),
                    reason: e.to_string(),
                })?;

            templates.insert(name, template);
        }

        tracing::info!(
            "Loaded {} prompt templates from {}",
            templates.len(),
            source.describe()
        );

        Ok(Self { templates, handlebars })
    }

    /// Load from `path` when given, otherwise the bundled catalog
    pub fn load_configured(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(&YamlFilePromptSource::new(path)),
            None => Self::load(&BundledPromptSource),
        }
    }

    /// Render `name` with `variables`. Missing variables are an error, never a blank.
    pub fn render(
        &self,
        name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))?;

        let missing: Vec<String> = template
            .required_variables()
            .iter()
            .filter(|v| !variables.contains_key(v.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(TemplateError::MissingVariables {
                template: name.to_string(),
                missing,
            });
        }

        self.handlebars
            .render(name, variables)
            .map_err(|e| TemplateError::Render {
                template: name.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
