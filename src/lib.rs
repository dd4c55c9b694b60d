//! Factory license document forms
//!
//! A document catalog (ordered slots with label, icon, required flag and
//! section), the validation schema derived from it, and the form state that
//! aggregates independent uploads into one validated submission.
//!
//! ```no_run
//! use factory_license::{DocumentCatalog, DocumentForm, FileRef};
//!
//! let mut form = DocumentForm::new(DocumentCatalog::factory_license());
//! form.attach("manufacturingProcess", FileRef::memory("process.pdf"))?;
//! if let Err(errors) = form.check() {
//!     for error in &errors {
//!         println!("{}", error);
//!     }
//! }
//! # Ok::<(), factory_license::FormError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod file_ref;
pub mod form;
pub mod icons;
pub mod notify;
pub mod record;
pub mod render;
pub mod schema;
pub mod submission;
pub mod upload;

pub use catalog::{CatalogError, CatalogLoader, DocumentCatalog, DocumentSlot, Section};
pub use config::FormConfig;
pub use error::{FieldError, FieldErrors, FormError};
pub use file_ref::{FileRef, FileRefParseError};
pub use form::{DocumentForm, FormState, StateTransition};
pub use icons::{Icon, IconIndex, FALLBACK_ICON};
pub use notify::{Navigator, Notification, Notifier, Severity};
pub use record::FormRecord;
pub use render::{FieldView, FormView, SectionView};
pub use schema::{ValidRecord, ValidationSchema};
pub use submission::{SubmissionError, SubmissionReceipt, SubmissionSink};
pub use upload::{UploadError, UploadService, UploadedFile};
