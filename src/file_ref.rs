//! Stored File References
//!
//! Typed enum for uploaded-file references so form values are never passed
//! around as unchecked strings. A reference is a POINTER (URI) to a file held
//! by the upload service; the form never holds file contents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// URI scheme for stored-file references
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileRef {
    /// Remote object: `https://host/path` (or `http://`). `raw` is the
    /// reference as attached and is what gets displayed and persisted;
    /// `url` is its parsed form.
    Remote { url: Url, raw: String },

    /// Local filesystem upload: `file:///abs/path`
    Local(String),

    /// In-memory upload (tests and previews): `memory://{key}`
    Memory(String),
}

/// Errors that can occur when parsing a file reference URI
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRefParseError {
    #[error("file reference is empty")]
    Empty,

    #[error("invalid URI format: expected 'scheme://path'")]
    InvalidFormat,

    #[error("unsupported scheme: {0}")]
    UnknownScheme(String),

    #[error("missing path component after scheme")]
    MissingPath,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FileRef {
    /// Create a local filesystem reference from an absolute path
    pub fn local(path: impl Into<String>) -> Self {
        Self::Local(path.into())
    }

    /// Create an in-memory reference
    pub fn memory(key: impl Into<String>) -> Self {
        Self::Memory(key.into())
    }

    /// Parse a reference from its URI string form
    pub fn parse(s: &str) -> Result<Self, FileRefParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FileRefParseError::Empty);
        }

        let (scheme, path) = s
            .split_once("://")
            .ok_or(FileRefParseError::InvalidFormat)?;

        if path.is_empty() {
            return Err(FileRefParseError::MissingPath);
        }

        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => {
                let url = Url::parse(s).map_err(|e| FileRefParseError::InvalidUrl(e.to_string()))?;
                if url.host_str().is_none() {
                    return Err(FileRefParseError::MissingPath);
                }
                Ok(Self::Remote {
                    url,
                    raw: s.to_string(),
                })
            }
            "file" => Ok(Self::Local(path.to_string())),
            "memory" => Ok(Self::Memory(path.to_string())),
            _ => Err(FileRefParseError::UnknownScheme(scheme.to_string())),
        }
    }

    /// URI scheme of this reference
    pub fn scheme(&self) -> &str {
        match self {
            Self::Remote { url, .. } => url.scheme(),
            Self::Local(_) => "file",
            Self::Memory(_) => "memory",
        }
    }

    /// Final path segment, if any
    pub fn file_name(&self) -> Option<&str> {
        let path = match self {
            Self::Remote { url, .. } => url.path(),
            Self::Local(p) | Self::Memory(p) => p.as_str(),
        };
        path.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Lower-cased extension of the final path segment
    pub fn extension(&self) -> Option<String> {
        self.file_name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Content type implied by the file extension, if it is a known one
    pub fn content_type(&self) -> Option<&'static str> {
        self.extension().as_deref().and_then(content_type_for_extension)
    }
}

/// Content type for the document formats the upload endpoints accept
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    let ct = match ext.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "csv" => "text/csv",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(ct)
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { raw, .. } => write!(f, "{}", raw),
            Self::Local(path) => write!(f, "file://{}", path),
            Self::Memory(key) => write!(f, "memory://{}", key),
        }
    }
}

impl FromStr for FileRef {
    type Err = FileRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FileRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
