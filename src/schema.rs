//! Validation Schema
//!
//! Rules derived from the document catalog that a [`FormRecord`] must satisfy
//! before it can be submitted. The schema is built from the catalog's
//! `required` flags and accept lists, so its key set is always exactly the
//! catalog key set.
//!
//! Validation collects every violation in one pass (catalog order) instead of
//! stopping at the first one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::catalog::{accepts, DocumentCatalog};
use crate::error::{FieldError, FieldErrors};
use crate::file_ref::FileRef;
use crate::record::{is_empty_value, FormRecord};

/// Presence rule for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Required,
    Optional,
}

/// Validation rule for one document slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub key: String,
    pub presence: Presence,
    /// Accepted extensions / content types; empty accepts any file
    #[serde(default)]
    pub accept: Vec<String>,
}

impl FieldRule {
    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// Check one value against this rule.
    ///
    /// Returns `Ok(None)` for an empty optional field, `Ok(Some(_))` for a
    /// valid file reference.
    pub fn check(&self, value: Option<&Value>) -> Result<Option<FileRef>, FieldError> {
        let value = match value {
            Some(v) if !is_empty_value(v) => v,
            _ if self.is_required() => {
                return Err(FieldError::MissingRequiredDocument(self.key.clone()))
            }
            _ => return Ok(None),
        };

        let Value::String(raw) = value else {
            return Err(FieldError::InvalidDocumentShape(
                self.key.clone(),
                format!("expected a file reference, found {}", json_type_name(value)),
            ));
        };

        let file = FileRef::parse(raw)
            .map_err(|e| FieldError::InvalidDocumentShape(self.key.clone(), e.to_string()))?;

        let extension = file.extension();
        if !accepts(&self.accept, extension.as_deref(), file.content_type()) {
            return Err(FieldError::InvalidDocumentShape(
                self.key.clone(),
                format!(
                    "file type '{}' is not accepted (allowed: {})",
                    extension.as_deref().unwrap_or("unknown"),
                    self.accept.join(", ")
                ),
            ));
        }

        Ok(Some(file))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Legal shape of a complete form record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSchema {
    rules: Vec<FieldRule>,
}

impl ValidationSchema {
    /// Derive the schema from a catalog: one rule per slot, in catalog order
    pub fn from_catalog(catalog: &DocumentCatalog) -> Self {
        let rules = catalog
            .slots()
            .iter()
            .map(|slot| FieldRule {
                key: slot.key.clone(),
                presence: if slot.required {
                    Presence::Required
                } else {
                    Presence::Optional
                },
                accept: slot.accept.clone(),
            })
            .collect();

        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, key: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.key.as_str())
    }

    /// Validate a record. Keys outside the schema are ignored.
    pub fn validate(&self, record: &FormRecord) -> Result<ValidRecord, FieldErrors> {
        let mut documents = BTreeMap::new();
        let mut errors = FieldErrors::new();

        for rule in &self.rules {
            match rule.check(record.get(&rule.key)) {
                Ok(Some(file)) => {
                    documents.insert(rule.key.clone(), file);
                }
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            debug!(documents = documents.len(), "Record passed validation");
            Ok(ValidRecord { documents })
        } else {
            debug!(errors = errors.len(), "Record failed validation");
            Err(errors)
        }
    }
}

/// A record that satisfied the validation schema.
///
/// Only constructed by [`ValidationSchema::validate`]; holds catalog keys only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidRecord {
    documents: BTreeMap<String, FileRef>,
}

impl ValidRecord {
    pub fn get(&self, key: &str) -> Option<&FileRef> {
        self.documents.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.documents.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRef)> {
        self.documents.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Back into a plain record (e.g. to persist alongside drafts)
    pub fn to_record(&self) -> FormRecord {
        self.documents
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.to_string())))
            .collect()
    }
}
