//! Submission Sinks
//!
//! Persistence collaborator that receives a record which already satisfied
//! the validation schema. Failures here are submission-level, never field
//! errors, and leave the form's record untouched.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::schema::ValidRecord;
use crate::upload::safe_path_segment;

/// Error type for submission sinks
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Acknowledgement returned by a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub form: String,
    pub submitted_at: DateTime<Utc>,
    /// Where the sink put the record (path, URL...), if meaningful
    pub location: Option<String>,
}

/// Persisted submission document
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDocument<'a> {
    pub submission_id: Uuid,
    pub form: &'a str,
    pub submitted_at: DateTime<Utc>,
    pub documents: &'a ValidRecord,
}

/// Receives validated records
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(
        &self,
        form: &str,
        record: &ValidRecord,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Writes each submission as a pretty JSON file named by its id
pub struct DirectorySubmissionSink {
    dir: PathBuf,
}

impl DirectorySubmissionSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SubmissionSink for DirectorySubmissionSink {
    async fn submit(
        &self,
        form: &str,
        record: &ValidRecord,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let submission_id = Uuid::new_v4();
        let submitted_at = Utc::now();

        let doc = SubmissionDocument {
            submission_id,
            form,
            submitted_at,
            documents: record,
        };
        let json = serde_json::to_vec_pretty(&doc)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!(
            "{}-{}.json",
            safe_path_segment(form, "submission"),
            submission_id
        ));
        tokio::fs::write(&path, json).await?;

        info!(%submission_id, form, path = %path.display(), "Submission written");

        Ok(SubmissionReceipt {
            submission_id,
            form: form.to_string(),
            submitted_at,
            location: Some(path.display().to_string()),
        })
    }
}

/// Keeps submissions in memory
#[derive(Clone, Default)]
pub struct InMemorySubmissionSink {
    submissions: Arc<RwLock<Vec<(SubmissionReceipt, ValidRecord)>>>,
}

impl InMemorySubmissionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submissions(&self) -> Vec<(SubmissionReceipt, ValidRecord)> {
        self.submissions.read().await.clone()
    }
}

#[async_trait]
impl SubmissionSink for InMemorySubmissionSink {
    async fn submit(
        &self,
        form: &str,
        record: &ValidRecord,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let receipt = SubmissionReceipt {
            submission_id: Uuid::new_v4(),
            form: form.to_string(),
            submitted_at: Utc::now(),
            location: None,
        };
        self.submissions
            .write()
            .await
            .push((receipt.clone(), record.clone()));
        Ok(receipt)
    }
}
