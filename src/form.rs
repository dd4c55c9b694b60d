//! Document Form
//!
//! One form instance per lifecycle: owns the live [`FormRecord`], the field
//! errors shown inline, and the submission state machine
//!
//! ```text
//! Editing -> Validating -> { EditingWithErrors | Submitting }
//! Submitting -> { Submitted | EditingWithErrors }
//! EditingWithErrors -> Validating (user resubmits, no retry limit)
//! ```
//!
//! Field edits never clear other fields. Failed submissions keep the record.
//! A submit that was dropped mid-flight leaves `Validating` or `Submitting`
//! behind; the next submit moves it to `EditingWithErrors` before starting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::DocumentCatalog;
use crate::error::{FieldError, FieldErrors, FormError};
use crate::file_ref::FileRef;
use crate::icons::IconIndex;
use crate::notify::{Navigator, Notification, Notifier};
use crate::record::FormRecord;
use crate::render::{render_form, FormView};
use crate::schema::{ValidRecord, ValidationSchema};
use crate::submission::{SubmissionReceipt, SubmissionSink};
use crate::upload::{UploadError, UploadService, UploadedFile};

/// Submission state of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Editing,
    Validating,
    EditingWithErrors,
    Submitting,
    Submitted,
}

impl FormState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Validating => "validating",
            Self::EditingWithErrors => "editing_with_errors",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
        }
    }

    pub fn can_transition_to(&self, target: FormState) -> bool {
        use FormState::*;
        matches!(
            (self, target),
            (Editing | EditingWithErrors, Validating)
                | (Validating, EditingWithErrors | Submitting)
                | (Submitting, Submitted | EditingWithErrors)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Whether the user can still change fields
    pub fn is_editable(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of a state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: FormState,
    pub to_state: FormState,
    pub transitioned_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// A single upload form over a document catalog
#[derive(Debug, Clone)]
pub struct DocumentForm {
    form_id: Uuid,
    catalog: DocumentCatalog,
    schema: ValidationSchema,
    icons: IconIndex,
    record: FormRecord,
    /// Files this form stored through an upload service, per slot
    uploaded: BTreeMap<String, FileRef>,
    errors: FieldErrors,
    submission_error: Option<String>,
    state: FormState,
    history: Vec<StateTransition>,
    receipt: Option<SubmissionReceipt>,
    success_route: Option<String>,
    created_at: DateTime<Utc>,
}

impl DocumentForm {
    /// Create an empty form; schema and icons derive from the catalog
    pub fn new(catalog: DocumentCatalog) -> Self {
        let schema = ValidationSchema::from_catalog(&catalog);
        let icons = IconIndex::from_catalog(&catalog);
        Self {
            form_id: Uuid::new_v4(),
            catalog,
            schema,
            icons,
            record: FormRecord::new(),
            uploaded: BTreeMap::new(),
            errors: FieldErrors::new(),
            submission_error: None,
            state: FormState::Editing,
            history: Vec::new(),
            receipt: None,
            success_route: None,
            created_at: Utc::now(),
        }
    }

    /// Pre-fill from a persisted snapshot. Keys the catalog does not know
    /// are dropped.
    pub fn with_snapshot(mut self, snapshot: &FormRecord) -> Self {
        let ignored: Vec<&str> = snapshot
            .keys()
            .filter(|k| !self.catalog.contains(k))
            .collect();
        if !ignored.is_empty() {
            debug!(form_id = %self.form_id, ?ignored, "Ignoring snapshot keys outside the catalog");
        }
        self.record = snapshot.restricted_to(&self.catalog);
        self
    }

    /// Replace the icon index (e.g. a partial one; misses fall back)
    pub fn with_icons(mut self, icons: IconIndex) -> Self {
        self.icons = icons;
        self
    }

    /// Route requested from the navigator after a successful submission
    pub fn with_success_route(mut self, route: impl Into<String>) -> Self {
        self.success_route = Some(route.into());
        self
    }

    pub fn form_id(&self) -> Uuid {
        self.form_id
    }

    pub fn catalog(&self) -> &DocumentCatalog {
        &self.catalog
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Current field errors (validation and upload)
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Last form-level submission failure, if any
    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    /// Copy of the live record
    pub fn snapshot(&self) -> FormRecord {
        self.record.clone()
    }

    /// Attach (or replace) the file for a slot
    pub fn attach(&mut self, key: &str, file: FileRef) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.ensure_known(key)?;

        debug!(form_id = %self.form_id, key, file = %file, "Attached document");
        self.record.set(key, &file);
        self.clear_field_error(key);
        Ok(())
    }

    /// Remove the file from a slot, returning the previous value
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, FormError> {
        self.ensure_editable()?;
        self.ensure_known(key)?;

        debug!(form_id = %self.form_id, key, "Removed document");
        self.clear_field_error(key);
        Ok(self.record.clear(key))
    }

    /// Remove the file from a slot and delete it from storage if this form
    /// uploaded it. Pre-filled files are only detached.
    pub async fn discard(
        &mut self,
        key: &str,
        uploads: &dyn UploadService,
    ) -> Result<Option<Value>, FormError> {
        let previous = self.remove(key)?;
        if let Some(stored) = self.uploaded.remove(key) {
            self.release(key, &stored, uploads).await;
        }
        Ok(previous)
    }

    /// Send a file to the upload service and attach the returned reference.
    ///
    /// A failure is recorded as an inline error for this slot only; the
    /// slot's previous value and every other field are left as they were.
    /// A file this form uploaded earlier for the same slot is deleted once
    /// the replacement is stored.
    pub async fn upload(
        &mut self,
        key: &str,
        file: &UploadedFile,
        uploads: &dyn UploadService,
    ) -> Result<FileRef, FormError> {
        self.ensure_editable()?;
        let endpoint = match self.catalog.get(key) {
            Some(slot) => self.catalog.endpoint_for(slot).to_string(),
            None => return Err(FormError::UnknownDocument(key.to_string())),
        };

        match uploads.store(&endpoint, key, file).await {
            Ok(file_ref) => {
                self.attach(key, file_ref.clone())?;
                let replaced = self.uploaded.insert(key.to_string(), file_ref.clone());
                if let Some(replaced) = replaced.filter(|r| *r != file_ref) {
                    self.release(key, &replaced, uploads).await;
                }
                Ok(file_ref)
            }
            Err(cause) => Err(self.reject_upload(key, cause)),
        }
    }

    /// Record a failed upload as the slot's inline error.
    ///
    /// Returns the [`FormError`] to hand back to the caller:
    /// `UploadFailure` normally, or `UnknownDocument` / `FormClosed` when
    /// the slot cannot take an error.
    pub fn reject_upload(&mut self, key: &str, cause: UploadError) -> FormError {
        if let Err(e) = self.ensure_editable().and_then(|_| self.ensure_known(key)) {
            return e;
        }

        warn!(form_id = %self.form_id, key, error = %cause, "Upload failed");
        self.clear_field_error(key);
        self.errors
            .push(FieldError::UploadFailure(key.to_string(), cause.to_string()));
        FormError::UploadFailure {
            key: key.to_string(),
            cause,
        }
    }

    /// Run the validation gate without changing form state
    pub fn check(&self) -> Result<ValidRecord, FieldErrors> {
        self.schema.validate(&self.record)
    }

    /// Validate and, if the record passes, hand it to the submission sink.
    ///
    /// Validation failures annotate fields and return
    /// [`FormError::Validation`]. Sink failures return
    /// [`FormError::SubmissionFailure`], emit one error notification and keep
    /// the record. Either way the form is left in `EditingWithErrors`.
    pub async fn submit(
        &mut self,
        sink: &dyn SubmissionSink,
        notifier: &dyn Notifier,
        navigator: &dyn Navigator,
    ) -> Result<SubmissionReceipt, FormError> {
        self.ensure_editable()?;
        self.recover_interrupted()?;
        self.transition_to(FormState::Validating, None)?;

        let valid = match self.schema.validate(&self.record) {
            Ok(valid) => valid,
            Err(errors) => {
                let reason = format!("{} field(s) failed validation", errors.len());
                self.errors = errors.clone();
                self.transition_to(FormState::EditingWithErrors, Some(reason))?;
                return Err(FormError::Validation(errors));
            }
        };

        self.errors = FieldErrors::new();
        self.submission_error = None;
        self.transition_to(FormState::Submitting, None)?;

        match sink.submit(self.catalog.form(), &valid).await {
            Ok(receipt) => {
                self.transition_to(
                    FormState::Submitted,
                    Some(format!("submission {}", receipt.submission_id)),
                )?;
                notifier.notify(Notification::success(format!(
                    "{} saved",
                    self.catalog.title()
                )));
                if let Some(route) = &self.success_route {
                    navigator.navigate(route);
                }
                self.receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                let message = e.to_string();
                self.submission_error = Some(message.clone());
                self.transition_to(FormState::EditingWithErrors, Some(message.clone()))?;
                notifier.notify(Notification::error(format!(
                    "Could not save {}: {}",
                    self.catalog.title(),
                    message
                )));
                Err(FormError::SubmissionFailure(e))
            }
        }
    }

    /// Current view model
    pub fn render(&self) -> FormView {
        render_form(&self.catalog, &self.icons, &self.record, &self.errors)
    }

    fn ensure_editable(&self) -> Result<(), FormError> {
        if self.state.is_editable() {
            Ok(())
        } else {
            Err(FormError::FormClosed)
        }
    }

    fn ensure_known(&self, key: &str) -> Result<(), FormError> {
        if self.catalog.contains(key) {
            Ok(())
        } else {
            Err(FormError::UnknownDocument(key.to_string()))
        }
    }

    fn clear_field_error(&mut self, key: &str) {
        let remaining: Vec<FieldError> = std::mem::take(&mut self.errors)
            .into_iter()
            .filter(|e| e.key() != key)
            .collect();
        self.errors = remaining.into();
    }

    /// A dropped submit future leaves the form mid-submission
    fn recover_interrupted(&mut self) -> Result<(), FormError> {
        if matches!(self.state, FormState::Validating | FormState::Submitting) {
            warn!(
                form_id = %self.form_id,
                state = %self.state,
                "Previous submission was interrupted"
            );
            self.transition_to(
                FormState::EditingWithErrors,
                Some("previous submission interrupted".to_string()),
            )?;
        }
        Ok(())
    }

    async fn release(&self, key: &str, file: &FileRef, uploads: &dyn UploadService) {
        match uploads.delete(file).await {
            Ok(()) => {
                debug!(form_id = %self.form_id, key, file = %file, "Deleted stored upload");
            }
            Err(e) => {
                warn!(
                    form_id = %self.form_id,
                    key,
                    file = %file,
                    error = %e,
                    "Could not delete stored upload"
                );
            }
        }
    }

    fn transition_to(
        &mut self,
        to_state: FormState,
        reason: Option<String>,
    ) -> Result<(), FormError> {
        if !self.state.can_transition_to(to_state) {
            return Err(FormError::IllegalTransition {
                from: self.state,
                to: to_state,
            });
        }
        let from_state = std::mem::replace(&mut self.state, to_state);

        info!(
            form_id = %self.form_id,
            from = %from_state,
            to = %to_state,
            reason = reason.as_deref().unwrap_or(""),
            "Form state transition"
        );

        self.history.push(StateTransition {
            from_state,
            to_state,
            transitioned_at: Utc::now(),
            reason,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DocumentSlot, Section};
    use crate::notify::{RecordingNavigator, RecordingNotifier, Severity};
    use crate::submission::{InMemorySubmissionSink, SubmissionError};
    use crate::upload::InMemoryUploadService;
    use async_trait::async_trait;
    use std::path::Path;
    use std::time::Duration;

    fn ab_catalog() -> DocumentCatalog {
        DocumentCatalog::new(
            "ab",
            vec![
                DocumentSlot::required("A", "Document A", Section::RequiredDocuments),
                DocumentSlot::optional("B", "Document B", Section::AdditionalDocuments),
            ],
        )
        .unwrap()
    }

    struct FailingSink;

    #[async_trait]
    impl SubmissionSink for FailingSink {
        async fn submit(
            &self,
            _form: &str,
            _record: &ValidRecord,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            Err(SubmissionError::Unavailable("network down".into()))
        }
    }

    struct FailingUploads;

    #[async_trait]
    impl UploadService for FailingUploads {
        async fn store(
            &self,
            _endpoint: &str,
            _key: &str,
            _file: &UploadedFile,
        ) -> Result<FileRef, UploadError> {
            Err(UploadError::Storage("quota exceeded".into()))
        }

        async fn delete(&self, _file: &FileRef) -> Result<(), UploadError> {
            Ok(())
        }
    }

    /// Sink that never answers within a test's patience
    struct StalledSink;

    #[async_trait]
    impl SubmissionSink for StalledSink {
        async fn submit(
            &self,
            _form: &str,
            _record: &ValidRecord,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(SubmissionError::Unavailable("timed out".into()))
        }
    }

    #[test]
    fn test_state_transitions() {
        use FormState::*;

        assert!(Editing.can_transition_to(Validating));
        assert!(EditingWithErrors.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Submitting));
        assert!(Validating.can_transition_to(EditingWithErrors));
        assert!(Submitting.can_transition_to(Submitted));
        assert!(Submitting.can_transition_to(EditingWithErrors));

        assert!(!Editing.can_transition_to(Submitted));
        assert!(!Submitted.can_transition_to(Validating));
        assert!(Submitted.is_terminal());
    }

    #[test]
    fn test_attach_unknown_key_rejected() {
        let mut form = DocumentForm::new(ab_catalog());
        let result = form.attach("Z", FileRef::memory("z.pdf"));
        assert!(matches!(result, Err(FormError::UnknownDocument(k)) if k == "Z"));
        assert!(form.record().is_empty());
    }

    #[test]
    fn test_snapshot_drops_unknown_keys() {
        let snapshot = FormRecord::new()
            .with("A", &FileRef::memory("a.pdf"))
            .with("Z", &FileRef::memory("z.pdf"));
        let form = DocumentForm::new(ab_catalog()).with_snapshot(&snapshot);

        assert_eq!(form.snapshot(), snapshot.restricted_to(form.catalog()));
        assert!(form.record().get("Z").is_none());
    }

    #[tokio::test]
    async fn test_submit_with_missing_required() {
        let mut form = DocumentForm::new(ab_catalog());
        form.attach("B", FileRef::memory("b.pdf")).unwrap();

        let sink = InMemorySubmissionSink::new();
        let result = form
            .submit(&sink, &RecordingNotifier::new(), &RecordingNavigator::new())
            .await;

        assert!(matches!(result, Err(FormError::Validation(ref e)) if e.len() == 1));
        assert_eq!(form.state(), FormState::EditingWithErrors);
        assert_eq!(
            form.render().field("A").unwrap().error.as_deref(),
            Some("This document is required")
        );
        // Entered values survive
        assert!(form.record().is_filled("B"));
        assert!(sink.submissions().await.is_empty());
    }

    #[tokio::test]
    async fn test_correct_and_resubmit() {
        let mut form = DocumentForm::new(ab_catalog()).with_success_route("/dashboard");
        let sink = InMemorySubmissionSink::new();
        let notifier = RecordingNotifier::new();
        let navigator = RecordingNavigator::new();

        assert!(form.submit(&sink, &notifier, &navigator).await.is_err());
        assert!(form.submit(&sink, &notifier, &navigator).await.is_err());

        form.attach("A", FileRef::memory("a.pdf")).unwrap();
        assert!(form.errors().is_empty());

        let receipt = form.submit(&sink, &notifier, &navigator).await.unwrap();
        assert_eq!(receipt.form, "ab");
        assert_eq!(form.state(), FormState::Submitted);
        assert_eq!(form.receipt(), Some(&receipt));
        assert_eq!(navigator.destinations(), vec!["/dashboard".to_string()]);
        assert_eq!(notifier.notifications()[0].severity, Severity::Success);

        let states: Vec<FormState> = form.history().iter().map(|t| t.to_state).collect();
        assert_eq!(
            states,
            vec![
                FormState::Validating,
                FormState::EditingWithErrors,
                FormState::Validating,
                FormState::EditingWithErrors,
                FormState::Validating,
                FormState::Submitting,
                FormState::Submitted,
            ]
        );

        // Terminal
        assert!(matches!(
            form.attach("B", FileRef::memory("b.pdf")),
            Err(FormError::FormClosed)
        ));
        assert!(matches!(
            form.submit(&sink, &notifier, &navigator).await,
            Err(FormError::FormClosed)
        ));
    }

    #[tokio::test]
    async fn test_submission_failure_keeps_record() {
        let mut form = DocumentForm::new(ab_catalog()).with_success_route("/dashboard");
        form.attach("A", FileRef::memory("a.pdf")).unwrap();
        let before = form.snapshot();

        let notifier = RecordingNotifier::new();
        let navigator = RecordingNavigator::new();
        let result = form.submit(&FailingSink, &notifier, &navigator).await;

        assert!(matches!(result, Err(FormError::SubmissionFailure(_))));
        assert_eq!(form.state(), FormState::EditingWithErrors);
        assert_eq!(form.snapshot(), before);
        assert!(form.errors().is_empty());
        assert!(form.submission_error().unwrap().contains("network down"));
        assert!(navigator.destinations().is_empty());

        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Error);

        // User may resubmit
        let sink = InMemorySubmissionSink::new();
        form.submit(&sink, &notifier, &navigator).await.unwrap();
        assert_eq!(form.state(), FormState::Submitted);
        assert!(form.submission_error().is_none());
    }

    #[tokio::test]
    async fn test_upload_attaches_reference() {
        let mut form = DocumentForm::new(ab_catalog());
        let uploads = InMemoryUploadService::new();

        let file_ref = form
            .upload("A", &UploadedFile::new("a.pdf", b"pdf".to_vec()), &uploads)
            .await
            .unwrap();

        assert_eq!(form.record().file_ref("A"), Some(file_ref.clone()));
        assert!(uploads.get(&file_ref).await.is_some());
        assert!(form.check().is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_submit_can_be_retried() {
        let mut form = DocumentForm::new(ab_catalog()).with_success_route("/dashboard");
        form.attach("A", FileRef::memory("a.pdf")).unwrap();
        let notifier = RecordingNotifier::new();
        let navigator = RecordingNavigator::new();

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            form.submit(&StalledSink, &notifier, &navigator),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(form.state(), FormState::Submitting);

        let sink = InMemorySubmissionSink::new();
        form.submit(&sink, &notifier, &navigator).await.unwrap();
        assert_eq!(form.state(), FormState::Submitted);
        assert!(form.record().is_filled("A"));

        let states: Vec<FormState> = form.history().iter().map(|t| t.to_state).collect();
        assert_eq!(
            states,
            vec![
                FormState::Validating,
                FormState::Submitting,
                FormState::EditingWithErrors,
                FormState::Validating,
                FormState::Submitting,
                FormState::Submitted,
            ]
        );
        assert!(form
            .history()
            .windows(2)
            .all(|w| w[0].to_state == w[1].from_state));
    }

    #[tokio::test]
    async fn test_reupload_deletes_replaced_file() {
        let mut form = DocumentForm::new(ab_catalog());
        let uploads = InMemoryUploadService::new();

        let first = form
            .upload("A", &UploadedFile::new("a.pdf", b"first".to_vec()), &uploads)
            .await
            .unwrap();
        let second = form
            .upload("A", &UploadedFile::new("a.pdf", b"second".to_vec()), &uploads)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(uploads.get(&first).await.is_none());
        assert!(uploads.get(&second).await.is_some());
        assert_eq!(form.record().file_ref("A"), Some(second.clone()));

        // Same content again keeps the stored file
        form.upload("A", &UploadedFile::new("a.pdf", b"second".to_vec()), &uploads)
            .await
            .unwrap();
        assert!(uploads.get(&second).await.is_some());
    }

    #[tokio::test]
    async fn test_discard_deletes_only_own_uploads() {
        let snapshot = FormRecord::new().with("B", &FileRef::memory("imageUploader/B/old.pdf"));
        let mut form = DocumentForm::new(ab_catalog()).with_snapshot(&snapshot);
        let uploads = InMemoryUploadService::new();

        let stored = form
            .upload("A", &UploadedFile::new("a.pdf", b"pdf".to_vec()), &uploads)
            .await
            .unwrap();
        let removed = form.discard("A", &uploads).await.unwrap();
        assert_eq!(removed, Some(serde_json::json!(stored.to_string())));
        assert!(uploads.is_empty().await);
        assert!(!form.record().is_filled("A"));

        // Pre-filled files belong to an earlier submission
        let prefilled = uploads
            .store("imageUploader", "B", &UploadedFile::new("old.pdf", b"old".to_vec()))
            .await
            .unwrap();
        form.attach("B", prefilled.clone()).unwrap();
        form.discard("B", &uploads).await.unwrap();
        assert!(uploads.get(&prefilled).await.is_some());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_field_scoped() {
        let mut form = DocumentForm::new(ab_catalog());
        form.attach("A", FileRef::memory("a.pdf")).unwrap();

        let cause = UploadedFile::from_path(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        let err = form.reject_upload("B", cause);

        assert!(matches!(err, FormError::UploadFailure { ref key, .. } if key == "B"));
        assert!(matches!(
            form.errors().for_key("B"),
            Some(FieldError::UploadFailure(..))
        ));
        assert!(form.record().is_filled("A"));

        let unknown = form.reject_upload("Z", UploadError::Rejected("x".into()));
        assert!(matches!(unknown, FormError::UnknownDocument(_)));
        assert!(form.errors().for_key("Z").is_none());
    }

    #[tokio::test]
    async fn test_upload_failure_is_field_scoped() {
        let mut form = DocumentForm::new(ab_catalog());
        form.attach("A", FileRef::memory("a.pdf")).unwrap();

        let result = form
            .upload("B", &UploadedFile::new("b.pdf", b"pdf".to_vec()), &FailingUploads)
            .await;

        assert!(matches!(result, Err(FormError::UploadFailure { ref key, .. }) if key == "B"));
        assert!(matches!(
            form.errors().for_key("B"),
            Some(FieldError::UploadFailure(_, cause)) if cause.contains("quota")
        ));
        assert!(form.record().is_filled("A"));
        assert_eq!(form.state(), FormState::Editing);

        // Retrying the same slot clears the inline error
        let uploads = InMemoryUploadService::new();
        form.upload("B", &UploadedFile::new("b.pdf", b"pdf".to_vec()), &uploads)
            .await
            .unwrap();
        assert!(form.errors().for_key("B").is_none());
    }

    #[tokio::test]
    async fn test_upload_unknown_key() {
        let mut form = DocumentForm::new(ab_catalog());
        let result = form
            .upload(
                "Z",
                &UploadedFile::new("z.pdf", b"pdf".to_vec()),
                &InMemoryUploadService::new(),
            )
            .await;
        assert!(matches!(result, Err(FormError::UnknownDocument(_))));
    }

    #[test]
    fn test_remove_clears_value() {
        let mut form = DocumentForm::new(ab_catalog());
        form.attach("A", FileRef::memory("a.pdf")).unwrap();
        let previous = form.remove("A").unwrap();
        assert!(previous.is_some());
        assert!(!form.record().is_filled("A"));
        assert!(form.check().is_err());
    }
}
