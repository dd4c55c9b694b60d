//! Document Catalog
//!
//! The ordered set of document slots a form collects. The catalog is the
//! single source of truth: the renderer, the icon index and the validation
//! schema are all derived from it, so adding or removing a slot is a data
//! change only.
//!
//! Catalogs are authored in YAML. The factory license catalog ships embedded
//! from `config/factory_license.yaml`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::icons::Icon;

const FACTORY_LICENSE_YAML: &str = include_str!("../config/factory_license.yaml");

static FACTORY_LICENSE: LazyLock<DocumentCatalog> = LazyLock::new(|| {
    CatalogLoader::load_from_str(FACTORY_LICENSE_YAML)
        .expect("embedded factory license catalog must be valid")
});

/// Upload endpoint used when neither the slot nor the catalog names one
pub const DEFAULT_ENDPOINT: &str = "imageUploader";

/// Layout grouping for slots. Has no effect on validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    RequiredDocuments,
    AdditionalDocuments,
    NoticesAndDirections,
}

impl Section {
    /// All sections in layout order
    pub const ALL: [Section; 3] = [
        Section::RequiredDocuments,
        Section::AdditionalDocuments,
        Section::NoticesAndDirections,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredDocuments => "required-documents",
            Self::AdditionalDocuments => "additional-documents",
            Self::NoticesAndDirections => "notices-and-directions",
        }
    }

    pub fn default_heading(&self) -> &'static str {
        match self {
            Self::RequiredDocuments => "Required Documents",
            Self::AdditionalDocuments => "Additional Documents",
            Self::NoticesAndDirections => "Notices and Directions",
        }
    }

    pub fn default_icon(&self) -> Icon {
        match self {
            Self::RequiredDocuments => Icon::Files,
            Self::AdditionalDocuments => Icon::FileText,
            Self::NoticesAndDirections => Icon::AlertCircle,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Section heading override (from YAML)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDef {
    pub section: Section,
    pub heading: String,
    #[serde(default)]
    pub icon: Option<Icon>,
}

/// One named upload position in the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSlot {
    /// Stable identifier; form field name and icon lookup key
    pub key: String,

    /// Human-readable label
    pub label: String,

    /// Whether a file must be attached before submission (default: true)
    #[serde(default = "default_required")]
    pub required: bool,

    pub section: Section,

    /// Icon shown next to the label (falls back when absent)
    #[serde(default)]
    pub icon: Option<Icon>,

    /// Accepted file extensions or content types. Empty accepts any file.
    #[serde(default)]
    pub accept: Vec<String>,

    /// Upload endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_required() -> bool {
    true
}

impl DocumentSlot {
    pub fn required(key: impl Into<String>, label: impl Into<String>, section: Section) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required: true,
            section,
            icon: None,
            accept: Vec::new(),
            endpoint: None,
        }
    }

    pub fn optional(key: impl Into<String>, label: impl Into<String>, section: Section) -> Self {
        Self {
            required: false,
            ..Self::required(key, label, section)
        }
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Restrict accepted files, e.g. `["pdf", "image/png"]`
    pub fn with_accept<I, S>(mut self, accept: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept = accept.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Check a file extension or content type against `accept`
    pub fn accepts(&self, extension: Option<&str>, content_type: Option<&str>) -> bool {
        accepts(&self.accept, extension, content_type)
    }
}

/// Match a file against an accept list.
///
/// Entries containing `/` are content types (`image/*` matches any image);
/// everything else is an extension, compared case-insensitively. An empty
/// list accepts everything.
pub fn accepts(accept: &[String], extension: Option<&str>, content_type: Option<&str>) -> bool {
    if accept.is_empty() {
        return true;
    }

    accept.iter().any(|rule| {
        let rule = rule.trim().trim_start_matches('.').to_ascii_lowercase();
        if let Some(prefix) = rule.strip_suffix("/*") {
            content_type
                .and_then(|ct| ct.split('/').next())
                .is_some_and(|major| major.eq_ignore_ascii_case(prefix))
        } else if rule.contains('/') {
            content_type.is_some_and(|ct| ct.eq_ignore_ascii_case(&rule))
        } else {
            extension.is_some_and(|ext| ext.eq_ignore_ascii_case(&rule))
        }
    })
}

/// Errors raised while loading or building a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document slot at position {0} has an empty key")]
    EmptyKey(usize),

    #[error("document slot '{0}' has an empty label")]
    EmptyLabel(String),

    #[error("duplicate document key: {0}")]
    DuplicateKey(String),

    #[error("duplicate heading for section: {0}")]
    DuplicateSection(Section),
}

/// Catalog file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogDef {
    /// Form identifier (e.g. "factory-license")
    pub form: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub submit_label: Option<String>,
    #[serde(default)]
    pub default_endpoint: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionDef>,
    #[serde(default)]
    pub documents: Vec<DocumentSlot>,
}

/// Ordered, immutable set of document slots
#[derive(Debug, Clone)]
pub struct DocumentCatalog {
    form: String,
    title: String,
    subtitle: Option<String>,
    submit_label: String,
    default_endpoint: String,
    sections: HashMap<Section, SectionDef>,
    slots: Vec<DocumentSlot>,
    positions: HashMap<String, usize>,
}

impl DocumentCatalog {
    /// Build a catalog from slots, keeping their order
    pub fn new(form: impl Into<String>, slots: Vec<DocumentSlot>) -> Result<Self, CatalogError> {
        Self::from_def(CatalogDef {
            form: form.into(),
            title: None,
            subtitle: None,
            submit_label: None,
            default_endpoint: None,
            sections: Vec::new(),
            documents: slots,
        })
    }

    /// Build from a parsed definition, checking key uniqueness
    pub fn from_def(def: CatalogDef) -> Result<Self, CatalogError> {
        let mut positions = HashMap::with_capacity(def.documents.len());

        for (i, slot) in def.documents.iter().enumerate() {
            if slot.key.trim().is_empty() {
                return Err(CatalogError::EmptyKey(i));
            }
            if slot.label.trim().is_empty() {
                return Err(CatalogError::EmptyLabel(slot.key.clone()));
            }
            if positions.insert(slot.key.clone(), i).is_some() {
                return Err(CatalogError::DuplicateKey(slot.key.clone()));
            }
        }

        let mut sections = HashMap::new();
        for section_def in def.sections {
            let section = section_def.section;
            if sections.insert(section, section_def).is_some() {
                return Err(CatalogError::DuplicateSection(section));
            }
        }

        let title = def.title.unwrap_or_else(|| def.form.clone());

        Ok(Self {
            form: def.form,
            title,
            subtitle: def.subtitle,
            submit_label: def.submit_label.unwrap_or_else(|| "Submit".to_string()),
            default_endpoint: def
                .default_endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            sections,
            slots: def.documents,
            positions,
        })
    }

    /// The embedded factory license catalog
    pub fn factory_license() -> Self {
        FACTORY_LICENSE.clone()
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn submit_label(&self) -> &str {
        &self.submit_label
    }

    /// All slots in render order
    pub fn slots(&self) -> &[DocumentSlot] {
        &self.slots
    }

    pub fn get(&self, key: &str) -> Option<&DocumentSlot> {
        self.positions.get(key).map(|&i| &self.slots[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.key.as_str())
    }

    /// Slots of one section, in catalog order
    pub fn slots_in(&self, section: Section) -> impl Iterator<Item = &DocumentSlot> {
        self.slots.iter().filter(move |s| s.section == section)
    }

    /// Sections that hold at least one slot, in layout order
    pub fn sections(&self) -> Vec<Section> {
        let used: HashSet<Section> = self.slots.iter().map(|s| s.section).collect();
        Section::ALL
            .into_iter()
            .filter(|s| used.contains(s))
            .collect()
    }

    pub fn section_heading(&self, section: Section) -> &str {
        self.sections
            .get(&section)
            .map(|d| d.heading.as_str())
            .unwrap_or_else(|| section.default_heading())
    }

    pub fn section_icon(&self, section: Section) -> Icon {
        self.sections
            .get(&section)
            .and_then(|d| d.icon)
            .unwrap_or_else(|| section.default_icon())
    }

    /// Endpoint uploads for this slot are sent to
    pub fn endpoint_for<'a>(&'a self, slot: &'a DocumentSlot) -> &'a str {
        slot.endpoint.as_deref().unwrap_or(&self.default_endpoint)
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|s| s.required)
            .map(|s| s.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Loader for catalog definitions
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load a catalog from a YAML file
    pub fn load_from_file(path: &Path) -> Result<DocumentCatalog, CatalogError> {
        debug!("Loading document catalog from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    /// Load from a YAML string
    pub fn load_from_str(yaml: &str) -> Result<DocumentCatalog, CatalogError> {
        let def: CatalogDef = serde_yaml::from_str(yaml)?;
        let catalog = DocumentCatalog::from_def(def)?;

        info!(
            form = catalog.form(),
            slots = catalog.len(),
            required = catalog.required_keys().count(),
            "Loaded document catalog"
        );

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CATALOG: &str = r#"
form: sample
title: Sample Form
documents:
  - key: A
    label: Document A
    section: required-documents
  - key: B
    label: Document B
    required: false
    section: additional-documents
    accept: [pdf, "image/*"]
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = CatalogLoader::load_from_str(SAMPLE_CATALOG).unwrap();

        assert_eq!(catalog.form(), "sample");
        assert_eq!(catalog.title(), "Sample Form");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("A").unwrap().required);
        assert!(!catalog.get("B").unwrap().required);
        assert_eq!(catalog.submit_label(), "Submit");
        assert_eq!(
            catalog.endpoint_for(catalog.get("A").unwrap()),
            DEFAULT_ENDPOINT
        );
    }

    #[test]
    fn test_factory_license_catalog() {
        let catalog = DocumentCatalog::factory_license();

        assert_eq!(catalog.len(), 22);
        assert_eq!(catalog.title(), "Factory License Details");
        assert_eq!(catalog.submit_label(), "Save Agency Information");
        assert_eq!(catalog.required_keys().count(), 7);
        assert_eq!(catalog.slots_in(Section::AdditionalDocuments).count(), 9);
        assert_eq!(catalog.slots_in(Section::NoticesAndDirections).count(), 6);

        let keys: Vec<&str> = catalog.keys().take(3).collect();
        assert_eq!(
            keys,
            vec![
                "manufacturingProcess",
                "industryRegistration",
                "landOwnershipCertificate"
            ]
        );
        assert_eq!(catalog.slots().last().unwrap().key, "other");

        // Every required slot sits in the required section
        for slot in catalog.slots() {
            assert_eq!(slot.required, slot.section == Section::RequiredDocuments);
        }
    }

    #[test]
    fn test_section_headings() {
        let catalog = DocumentCatalog::factory_license();
        assert_eq!(
            catalog.sections(),
            vec![
                Section::RequiredDocuments,
                Section::AdditionalDocuments,
                Section::NoticesAndDirections
            ]
        );
        assert_eq!(
            catalog.section_heading(Section::NoticesAndDirections),
            "Notices and Directions"
        );
        assert_eq!(catalog.section_icon(Section::RequiredDocuments), Icon::Files);

        let sample = CatalogLoader::load_from_str(SAMPLE_CATALOG).unwrap();
        assert_eq!(
            sample.section_heading(Section::AdditionalDocuments),
            "Additional Documents"
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let slots = vec![
            DocumentSlot::required("A", "First", Section::RequiredDocuments),
            DocumentSlot::optional("A", "Second", Section::AdditionalDocuments),
        ];
        let result = DocumentCatalog::new("dup", slots);
        assert!(matches!(result, Err(CatalogError::DuplicateKey(k)) if k == "A"));
    }

    #[test]
    fn test_empty_key_and_label_rejected() {
        let result = DocumentCatalog::new(
            "bad",
            vec![DocumentSlot::required(" ", "Blank", Section::RequiredDocuments)],
        );
        assert!(matches!(result, Err(CatalogError::EmptyKey(0))));

        let result = DocumentCatalog::new(
            "bad",
            vec![DocumentSlot::required("A", "", Section::RequiredDocuments)],
        );
        assert!(matches!(result, Err(CatalogError::EmptyLabel(k)) if k == "A"));
    }

    #[test]
    fn test_accepts() {
        let any = DocumentSlot::optional("x", "X", Section::AdditionalDocuments);
        assert!(any.accepts(None, None));

        let slot = DocumentSlot::optional("B", "B", Section::AdditionalDocuments)
            .with_accept([".PDF", "image/*", "text/csv"]);
        assert!(slot.accepts(Some("pdf"), None));
        assert!(slot.accepts(None, Some("image/png")));
        assert!(slot.accepts(None, Some("TEXT/CSV")));
        assert!(!slot.accepts(Some("docx"), Some("application/msword")));
        assert!(!slot.accepts(None, None));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, SAMPLE_CATALOG).unwrap();

        let catalog = CatalogLoader::load_from_file(&path).unwrap();
        assert_eq!(catalog.len(), 2);

        let missing = CatalogLoader::load_from_file(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(CatalogError::Io(_))));
    }
}
