// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Prompt Template Domain Types
//
// A template body may only contain plain `{{variable}}` slots. Every slot must
// be declared in the template's variable list; this is checked once at load.

use crate::domain::errors::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("static regex"));
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

/// Raw template record as read from a prompt source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTemplate {
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub variables: Vec<String>,
}

impl RawTemplate {
    pub fn new(name: impl Into<String>, body: impl Into<String>, variables: &[&str]) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Validated, immutable prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    body: String,
    required_variables: BTreeSet<String>,
}

impl PromptTemplate {
    pub fn from_raw(raw: RawTemplate) -> Result<Self, ConfigError> {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::Invalid("prompt template name cannot be empty".into()));
        }

        let mut required_variables = BTreeSet::new();
        for variable in raw.variables {
            let variable = variable.trim().to_string();
            if !IDENTIFIER.is_match(&variable) {
                return Err(ConfigError::Invalid(format!(
                    "prompt template '{}' declares invalid variable name '{}'",
                    name, variable
                )));
            }
            required_variables.insert(variable);
        }

        for slot in referenced_slots(&name, &raw.body)? {
            if !required_variables.contains(&slot) {
                return Err(ConfigError::UndeclaredVariable { template: name, variable: slot });
            }
        }

        Ok(Self { name, body: raw.body, required_variables })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn required_variables(&self) -> &BTreeSet<String> {
        &self.required_variables
    }
}

/// Collect the slot names a body references, rejecting anything that is not a
/// plain identifier (helpers, partials, triple-stash, paths).
pub fn referenced_slots(template: &str, body: &str) -> Result<BTreeSet<String>, ConfigError> {
    let mut slots = BTreeSet::new();
    for capture in EXPRESSION.captures_iter(body) {
        let expression = capture[1].trim();
        if !IDENTIFIER.is_match(expression) {
            return Err(ConfigError::UnsupportedExpression {
                template: template.to_string(),
                expression: capture[1].to_string(),
            });
        }
        slots.insert(expression.to_string());
    }
    Ok(slots)
}

/// True when `text` still contains a `{{...}}` marker
pub fn has_slot_markers(text: &str) -> bool {
    EXPRESSION.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_slots_are_accepted() {
        let raw = RawTemplate::new("chat", "Hi {{name}}, you said: {{ message }}", &["message", "name"]);
        let template = PromptTemplate::from_raw(raw).unwrap();
        assert_eq!(template.name(), "chat");
        assert_eq!(template.required_variables().len(), 2);
    }

    #[test]
    fn test_undeclared_slot_is_rejected() {
        let raw = RawTemplate::new("chat", "{{message}} from {{visitor}}", &["message"]);
        match PromptTemplate::from_raw(raw) {
            Err(ConfigError::UndeclaredVariable { template, variable }) => {
                assert_eq!(template, "chat");
                assert_eq!(variable, "visitor");
            }
            other => panic!("expected UndeclaredVariable, got {:?}", other),
        }
    }

    #[test]
    fn test_helpers_are_rejected() {
        let raw = RawTemplate::new("chat", "{{#if message}}{{message}}{{/if}}", &["message"]);
        assert!(matches!(
            PromptTemplate::from_raw(raw),
            Err(ConfigError::UnsupportedExpression { .. })
        ));

        let raw = RawTemplate::new("chat", "{{{message}}}", &["message"]);
        assert!(PromptTemplate::from_raw(raw).is_err());
    }

    #[test]
    fn test_invalid_names() {
        assert!(PromptTemplate::from_raw(RawTemplate::new("  ", "text", &[])).is_err());
        assert!(PromptTemplate::from_raw(RawTemplate::new("chat", "text", &["not valid"])).is_err());
    }

    #[test]
    fn test_declared_but_unused_variable_is_allowed() {
        let raw = RawTemplate::new("static", "No slots here", &["unused"]);
        let template = PromptTemplate::from_raw(raw).unwrap();
        assert!(template.required_variables().contains("unused"));
    }

    #[test]
    fn test_slot_spanning_lines_is_checked() {
        let raw = RawTemplate::new("chat", "Hi {{\nvisitor\n}} {{message}}", &["message"]);
        match PromptTemplate::from_raw(raw) {
            Err(ConfigError::UndeclaredVariable { variable, .. }) => assert_eq!(variable, "visitor"),
            other => panic!("expected UndeclaredVariable, got {:?}", other),
        }

        let raw = RawTemplate::new("chat", "Hi {{\n  message\n}}", &["message"]);
        assert!(PromptTemplate::from_raw(raw).is_ok());
    }

    #[test]
    fn test_slot_marker_detection() {
        assert!(has_slot_markers("hello {{name}}"));
        assert!(!has_slot_markers("hello { name }"));
    }
}
