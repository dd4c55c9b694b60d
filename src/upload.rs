//! Upload Service Abstraction
//!
//! Abstract interface for storing uploaded document files and handing back a
//! [`FileRef`] that the form keeps as the field value. Implementations can
//! target the local filesystem or an in-memory map (tests, previews).

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::file_ref::{content_type_for_extension, FileRef};

/// Error type for upload operations
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file reference: {0}")]
    InvalidRef(String),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// A file picked by the user, not yet stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let file_name = file_name.into();
        let content_type = file_name
            .rsplit_once('.')
            .and_then(|(_, ext)| content_type_for_extension(ext))
            .map(str::to_string);
        Self {
            file_name,
            content_type,
            content: content.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk
    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::Rejected(format!("not a file: {}", path.display())))?;
        Ok(Self::new(file_name, content))
    }

    /// Short content hash used to keep stored names unique
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(&self.content);
        hex::encode(&hash[..8])
    }

    /// File name reduced to characters that are safe in a path segment
    pub fn safe_file_name(&self) -> String {
        safe_path_segment(&self.file_name, "upload")
    }

    fn ensure_not_empty(&self) -> Result<(), UploadError> {
        if self.content.is_empty() {
            return Err(UploadError::Rejected(format!(
                "{} is empty",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// Keep ASCII alphanumerics and `.-_`, replace everything else with `_`
/// and strip leading dots, so the result never leaves its parent directory.
pub fn safe_path_segment(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Storage for uploaded document files
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Store a file for a document slot, return its reference
    async fn store(
        &self,
        endpoint: &str,
        key: &str,
        file: &UploadedFile,
    ) -> Result<FileRef, UploadError>;

    /// Delete a file this service stored. Deleting a file that is already
    /// gone succeeds.
    async fn delete(&self, file: &FileRef) -> Result<(), UploadError>;
}

/// Local filesystem implementation
pub struct LocalUploadService {
    base_path: PathBuf,
}

impl LocalUploadService {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// `{base}/{endpoint}/{key}/{digest}-{name}`, every segment sanitized
    fn path_for(&self, endpoint: &str, key: &str, file: &UploadedFile) -> PathBuf {
        self.base_path
            .join(safe_path_segment(endpoint, "endpoint"))
            .join(safe_path_segment(key, "document"))
            .join(format!("{}-{}", file.digest(), file.safe_file_name()))
    }
}

#[async_trait]
impl UploadService for LocalUploadService {
    async fn store(
        &self,
        endpoint: &str,
        key: &str,
        file: &UploadedFile,
    ) -> Result<FileRef, UploadError> {
        file.ensure_not_empty()?;
        let path = self.path_for(endpoint, key, file);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, &file.content).await?;

        let path = tokio::fs::canonicalize(&path).await?;
        info!(key, endpoint, path = %path.display(), bytes = file.content.len(), "Stored upload");
        Ok(FileRef::local(path.to_string_lossy().into_owned()))
    }

    async fn delete(&self, file: &FileRef) -> Result<(), UploadError> {
        let FileRef::Local(path) = file else {
            return Err(UploadError::InvalidRef(format!(
                "expected file:// reference: {}",
                file
            )));
        };
        let path = Path::new(path);

        // Nothing was ever stored
        let base = match tokio::fs::canonicalize(&self.base_path).await {
            Ok(base) => base,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.starts_with(&base) {
            return Err(UploadError::InvalidRef(format!(
                "outside the upload directory: {}",
                file
            )));
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!(path = %path.display(), "Deleted upload");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory upload store (tests and dry runs)
#[derive(Clone, Default)]
pub struct InMemoryUploadService {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryUploadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored content for a reference
    pub async fn get(&self, file: &FileRef) -> Option<Vec<u8>> {
        self.files.read().await.get(&file.to_string()).cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl UploadService for InMemoryUploadService {
    async fn store(
        &self,
        endpoint: &str,
        key: &str,
        file: &UploadedFile,
    ) -> Result<FileRef, UploadError> {
        file.ensure_not_empty()?;
        let file_ref = FileRef::memory(format!(
            "{}/{}/{}-{}",
            endpoint,
            key,
            file.digest(),
            file.safe_file_name()
        ));
        let mut files = self.files.write().await;
        files.insert(file_ref.to_string(), file.content.clone());
        debug!(key, reference = %file_ref, "Stored upload in memory");
        Ok(file_ref)
    }

    async fn delete(&self, file: &FileRef) -> Result<(), UploadError> {
        let mut files = self.files.write().await;
        files.remove(&file.to_string());
        Ok(())
    }
}
