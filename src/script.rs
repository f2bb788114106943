//! Dynamic value sources for `Script` hints
//!
//! A script is never executed as code. [`ScriptRegistry`] resolves it, in
//! order, as the name of a registered callback, a JSON array literal, or a
//! read-only resource expression such as `Computer.id` or
//! `Computer.id|Computer.eosDevice.id`.

use crate::parser::Node;
use crate::resources::{ResourceClass, ResourceIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("empty script")]
    Empty,

    #[error("unsupported script: {0}")]
    Unsupported(String),

    #[error("unknown resource class {0:?}")]
    UnknownClass(String),

    #[error("script {name:?} failed: {message}")]
    Callback { name: String, message: String },
}

/// A value produced by a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptValue {
    pub value: String,
    #[serde(default, rename = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScriptValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// What a script can see
#[derive(Clone, Copy)]
pub struct ScriptInput<'a> {
    /// The element being completed or validated
    pub node: Option<&'a Node>,
    pub resources: &'a ResourceIndex,
}

/// Evaluates `Script` hint content into allowed values
pub trait ScriptEvaluator: Send + Sync {
    fn evaluate(&self, script: &str, input: &ScriptInput<'_>) -> Result<Vec<ScriptValue>, ScriptError>;
}

type Callback = Box<dyn Fn(&ScriptInput<'_>) -> Result<Vec<ScriptValue>, ScriptError> + Send + Sync>;

/// Registry of named callbacks plus the built-in expression forms
#[derive(Default)]
pub struct ScriptRegistry {
    callbacks: HashMap<String, Callback>,
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.callbacks.keys().collect();
        names.sort();
        f.debug_struct("ScriptRegistry").field("callbacks", &names).finish()
    }
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked when a hint's script text equals `name`
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&ScriptInput<'_>) -> Result<Vec<ScriptValue>, ScriptError> + Send + Sync + 'static,
    {
        self.callbacks.insert(name.into(), Box::new(callback));
    }

    pub fn with<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&ScriptInput<'_>) -> Result<Vec<ScriptValue>, ScriptError> + Send + Sync + 'static,
    {
        self.register(name, callback);
        self
    }
}

impl ScriptEvaluator for ScriptRegistry {
    fn evaluate(&self, script: &str, input: &ScriptInput<'_>) -> Result<Vec<ScriptValue>, ScriptError> {
        let script = script.trim();
        if script.is_empty() {
            return Err(ScriptError::Empty);
        }
        if let Some(callback) = self.callbacks.get(script) {
            return callback(input);
        }
        if script.starts_with('[') {
            return parse_literal(script);
        }
        evaluate_expression(script, input.resources)
    }
}

/// `["a", "b"]` or `[{"value": "a", "desc": "..."}]`
fn parse_literal(script: &str) -> Result<Vec<ScriptValue>, ScriptError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Plain(String),
        Full(ScriptValue),
    }

    let entries: Vec<Entry> =
        serde_json::from_str(script).map_err(|e| ScriptError::Unsupported(e.to_string()))?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Plain(value) => ScriptValue::new(value),
            Entry::Full(value) => value,
        })
        .collect())
}

/// `Class.field[.field]`, alternatives separated by `|`
pub fn evaluate_expression(
    expression: &str,
    resources: &ResourceIndex,
) -> Result<Vec<ScriptValue>, ScriptError> {
    let mut values = Vec::new();
    for alternative in expression.split('|').map(str::trim) {
        let mut parts = alternative.split('.').filter(|p| !p.is_empty());
        let class_name = parts.next().ok_or(ScriptError::Empty)?;
        let class = ResourceClass::from_name(class_name)
            .ok_or_else(|| ScriptError::UnknownClass(class_name.to_string()))?;
        let fields: Vec<&str> = parts.collect();
        if fields.is_empty() || fields.len() > 2 {
            return Err(ScriptError::Unsupported(alternative.to_string()));
        }

        for record in resources.records(class) {
            let description = record.name().map(str::to_string);
            for value in record.field_values(&fields) {
                values.push(ScriptValue {
                    value: value.to_string(),
                    description: description.clone(),
                });
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn index() -> ResourceIndex {
        let mut index = ResourceIndex::new(None);
        index.index_source(
            Path::new("a.xml"),
            r#"<Computer id="a" name="Alpha"><eosDevice id="a_phone"/></Computer>"#,
        );
        index.index_source(Path::new("b.xml"), r#"<Computer id="b" name="Beta"/>"#);
        index
    }

    fn run(registry: &ScriptRegistry, script: &str) -> Result<Vec<String>, ScriptError> {
        let resources = index();
        let input = ScriptInput {
            node: None,
            resources: &resources,
        };
        registry
            .evaluate(script, &input)
            .map(|values| values.into_iter().map(|v| v.value).collect())
    }

    #[test]
    fn test_resource_expression() {
        let registry = ScriptRegistry::new();
        assert_eq!(run(&registry, "Computer.id").unwrap(), vec!["a", "b"]);
        assert_eq!(
            run(&registry, "Computer.id|Computer.eosDevice.id").unwrap(),
            vec!["a", "b", "a_phone"]
        );
    }

    #[test]
    fn test_literal_list() {
        let registry = ScriptRegistry::new();
        assert_eq!(
            run(&registry, r#"["x", {"value": "y", "desc": "why"}]"#).unwrap(),
            vec!["x", "y"]
        );
    }

    #[test]
    fn test_registered_callback() {
        let registry = ScriptRegistry::new().with("countComputers", |input| {
            let count = input.resources.computer_ids().len();
            Ok(vec![ScriptValue::new(count.to_string())])
        });
        assert_eq!(run(&registry, " countComputers ").unwrap(), vec!["2"]);
    }

    #[test]
    fn test_errors() {
        let registry = ScriptRegistry::new();
        assert_eq!(run(&registry, "  "), Err(ScriptError::Empty));
        assert!(matches!(
            run(&registry, "Planet.id"),
            Err(ScriptError::UnknownClass(_))
        ));
        assert!(matches!(
            run(&registry, "return hacknet.Computer.map(c => c.id)"),
            Err(ScriptError::UnknownClass(_)) | Err(ScriptError::Unsupported(_))
        ));
        assert!(matches!(
            run(&registry, "[1, 2"),
            Err(ScriptError::Unsupported(_))
        ));
    }
}
