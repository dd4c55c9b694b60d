//! Form Record
//!
//! Live mapping of document key -> attached file reference. Values are kept
//! as raw JSON so a persisted snapshot with a malformed value can still be
//! loaded and then rejected field-by-field by the validation schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::DocumentCatalog;
use crate::file_ref::FileRef;

/// Mapping from slot key to uploaded-file reference (or empty/absent)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord {
    values: BTreeMap<String, Value>,
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON snapshot (an object of key -> reference string)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Attach a file reference to a key, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, file: &FileRef) {
        self.values
            .insert(key.into(), Value::String(file.to_string()));
    }

    /// Builder form of [`FormRecord::set`]
    pub fn with(mut self, key: impl Into<String>, file: &FileRef) -> Self {
        self.set(key, file);
        self
    }

    /// Remove the value for a key, returning it
    pub fn clear(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether the key holds a non-empty value
    pub fn is_filled(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !is_empty_value(v))
    }

    /// Parsed file reference for a key, if present and well formed
    pub fn file_ref(&self, key: &str) -> Option<FileRef> {
        match self.values.get(key) {
            Some(Value::String(s)) => FileRef::parse(s).ok(),
            _ => None,
        }
    }

    /// Value shown in the upload control; empty string when nothing is attached
    pub fn display_value(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Copy of this record holding only keys the catalog knows
    pub fn restricted_to(&self, catalog: &DocumentCatalog) -> Self {
        Self {
            values: self
                .values
                .iter()
                .filter(|(k, _)| catalog.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FormRecord {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Null and blank strings count as "nothing attached"
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
