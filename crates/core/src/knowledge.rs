//! Knowledge base — an externally supplied key/value fact store.
//!
//! Loading replaces the whole map; entries are never merged. The only
//! in-place insert comes from a `scrape` action storing a page under its URL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::error::{Error, Result};

/// String keys to string values. Keys are unique; order is irrelevant, but a
/// sorted map keeps the rendered prompt deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase {
    entries: BTreeMap<String, String>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a knowledge base from an arbitrary JSON value.
    ///
    /// Fails with [`Error::Validation`] unless the value is an object whose
    /// values are all strings.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            Error::Validation(format!(
                "knowledge base must be a mapping, got {}",
                json_kind(value)
            ))
        })?;

        let mut entries = BTreeMap::new();
        for (key, value) in object {
            let text = value.as_str().ok_or_else(|| {
                Error::Validation(format!(
                    "knowledge base value for '{key}' must be a string, got {}",
                    json_kind(value)
                ))
            })?;
            entries.insert(key.clone(), text.to_string());
        }
        Ok(Self { entries })
    }

    /// Replace the whole map.
    pub fn replace(&mut self, other: KnowledgeBase) {
        self.entries = other.entries;
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// One `key: value` line per entry.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KnowledgeBase {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
