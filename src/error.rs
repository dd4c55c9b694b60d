//! Error types for the document form
//!
//! Field-scoped errors ([`FieldError`]) are shown inline next to one upload
//! control and never stop other fields from being edited. Form-level errors
//! ([`FormError`]) come back from form operations; none of them are fatal.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::FormState;
use crate::submission::SubmissionError;
use crate::upload::UploadError;

/// Error attached to a single document slot
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum FieldError {
    #[error("missing required document: {0}")]
    MissingRequiredDocument(String),

    #[error("invalid document for {0}: {1}")]
    InvalidDocumentShape(String, String),

    #[error("upload failed for {0}: {1}")]
    UploadFailure(String, String),
}

impl FieldError {
    /// Key of the slot this error belongs to
    pub fn key(&self) -> &str {
        match self {
            Self::MissingRequiredDocument(key)
            | Self::InvalidDocumentShape(key, _)
            | Self::UploadFailure(key, _) => key,
        }
    }

    /// Short message rendered under the upload control
    pub fn message(&self) -> String {
        match self {
            Self::MissingRequiredDocument(_) => "This document is required".to_string(),
            Self::InvalidDocumentShape(_, reason) => format!("Invalid file: {}", reason),
            Self::UploadFailure(_, cause) => format!("Upload failed: {}", cause),
        }
    }
}

/// Every field error found in one validation pass, in catalog order
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// First error recorded for a key
    pub fn for_key(&self, key: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.key() == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl From<Vec<FieldError>> for FieldErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors returned by form operations
#[derive(Error, Debug)]
pub enum FormError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error("upload failed for {key}: {cause}")]
    UploadFailure {
        key: String,
        #[source]
        cause: UploadError,
    },

    #[error("submission failed: {0}")]
    SubmissionFailure(#[from] SubmissionError),

    #[error("unknown document key: {0}")]
    UnknownDocument(String),

    #[error("form has already been submitted")]
    FormClosed,

    #[error("illegal form transition {from} -> {to}")]
    IllegalTransition { from: FormState, to: FormState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_key_and_message() {
        let missing = FieldError::MissingRequiredDocument("fixedAssets".into());
        assert_eq!(missing.key(), "fixedAssets");
        assert_eq!(missing.message(), "This document is required");

        let upload = FieldError::UploadFailure("other".into(), "disk full".into());
        assert_eq!(upload.key(), "other");
        assert_eq!(upload.message(), "Upload failed: disk full");
    }

    #[test]
    fn test_field_errors_lookup() {
        let errors = FieldErrors::from(vec![
            FieldError::MissingRequiredDocument("A".into()),
            FieldError::InvalidDocumentShape("B".into(), "bad".into()),
        ]);

        assert_eq!(errors.len(), 2);
        assert!(errors.for_key("B").is_some());
        assert!(errors.for_key("C").is_none());
        assert_eq!(
            errors.to_string(),
            "missing required document: A; invalid document for B: bad"
        );
    }

    #[test]
    fn test_field_error_serialization() {
        let err = FieldError::MissingRequiredDocument("A".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "missing_required_document");
    }
}
