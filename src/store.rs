//! Site configuration store
//!
//! The store is a nested YAML document. Lookups address it by path segments
//! (`["sites", "blog", "custom", "locale"]`) and always answer with strings;
//! typing happens later, in [`crate::coerce`].

use crate::error::{ProvisionError, Result};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Read-only access to the site configuration document
pub trait ConfigStore {
    /// Scalar at `path`, or `default` when missing, null, or empty
    fn get_value(&self, path: &[&str], default: &str) -> String;

    /// Key/value pairs of the mapping at `path`, in document order
    fn get_values(&self, path: &[&str]) -> Vec<(String, String)>;

    /// Items of the sequence at `path`; a scalar is split on whitespace
    fn get_list(&self, path: &[&str]) -> Vec<String>;
}

/// A [`ConfigStore`] backed by a parsed YAML document
#[derive(Debug, Clone)]
pub struct YamlStore {
    root: Value,
}

impl YamlStore {
    /// Load and parse the store at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProvisionError::config(format!("could not read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| ProvisionError::config(format!("{} is malformed: {e}", path.display())))
    }

    /// Parse a store from YAML text
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let root: Value = serde_yaml::from_str(content)?;
        Ok(Self { root })
    }

    fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path {
            node = untag(node);
            node = match node {
                Value::Mapping(map) => map.get(*segment)?,
                Value::Sequence(seq) => seq.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(untag(node))
    }
}

impl ConfigStore for YamlStore {
    fn get_value(&self, path: &[&str], default: &str) -> String {
        self.lookup(path)
            .and_then(scalar_to_string)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn get_values(&self, path: &[&str]) -> Vec<(String, String)> {
        let Some(Value::Mapping(map)) = self.lookup(path) else {
            return Vec::new();
        };

        map.iter()
            .filter_map(|(key, value)| {
                let key = scalar_to_string(untag(key))?;
                match untag(value) {
                    Value::Null => Some((key, String::new())),
                    other => match scalar_to_string(other) {
                        Some(v) => Some((key, v)),
                        None => {
                            log::warn!("Ignoring non-scalar value for '{}' under {}", key, path.join("."));
                            None
                        }
                    },
                }
            })
            .collect()
    }

    fn get_list(&self, path: &[&str]) -> Vec<String> {
        match self.lookup(path) {
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(|v| scalar_to_string(untag(v)))
                .filter(|v| !v.is_empty())
                .collect(),
            Some(other) => scalar_to_string(other)
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
