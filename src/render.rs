//! Field Renderer
//!
//! Turns the catalog plus the live record into a view model: one field per
//! slot, grouped by section, each carrying its resolved icon, label, optional
//! marker, current value and inline error. A single loop over the catalog
//! drives it, so catalog edits never need renderer edits.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::catalog::{DocumentCatalog, DocumentSlot, Section};
use crate::error::FieldErrors;
use crate::icons::{Icon, IconIndex};
use crate::record::FormRecord;

/// Marker appended to labels of optional slots
pub const OPTIONAL_MARKER: &str = "(Optional)";

/// One rendered upload field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub icon: Icon,
    pub required: bool,
    pub endpoint: String,
    /// Current value of the upload control; empty when nothing is attached
    pub value: String,
    /// Record value exactly as held, including null or malformed entries
    #[serde(skip)]
    pub stored: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldView {
    pub fn optional_marker(&self) -> Option<&'static str> {
        (!self.required).then_some(OPTIONAL_MARKER)
    }

    /// Label with the optional marker appended where it applies
    pub fn display_label(&self) -> String {
        match self.optional_marker() {
            Some(marker) => format!("{} {}", self.label, marker),
            None => self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub section: Section,
    pub heading: String,
    pub icon: Icon,
    pub fields: Vec<FieldView>,
}

/// The whole form, ready to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub submit_label: String,
    pub sections: Vec<SectionView>,
}

impl FormView {
    /// Fields of every section in catalog order
    pub fn fields(&self) -> impl Iterator<Item = &FieldView> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldView> {
        self.fields().find(|f| f.key == key)
    }

    /// Read the record values back out of the view, unchanged
    pub fn values(&self) -> FormRecord {
        self.fields()
            .filter_map(|f| f.stored.clone().map(|v| (f.key.clone(), v)))
            .collect()
    }
}

/// Render one slot
pub fn render_field(
    catalog: &DocumentCatalog,
    slot: &DocumentSlot,
    icons: &IconIndex,
    record: &FormRecord,
    errors: &FieldErrors,
) -> FieldView {
    FieldView {
        key: slot.key.clone(),
        label: slot.label.clone(),
        icon: icons.resolve(&slot.key),
        required: slot.required,
        endpoint: catalog.endpoint_for(slot).to_string(),
        value: record.display_value(&slot.key),
        stored: record.get(&slot.key).cloned(),
        error: errors.for_key(&slot.key).map(|e| e.message()),
    }
}

/// Render the full form
pub fn render_form(
    catalog: &DocumentCatalog,
    icons: &IconIndex,
    record: &FormRecord,
    errors: &FieldErrors,
) -> FormView {
    let sections = catalog
        .sections()
        .into_iter()
        .map(|section| SectionView {
            section,
            heading: catalog.section_heading(section).to_string(),
            icon: catalog.section_icon(section),
            fields: catalog
                .slots_in(section)
                .map(|slot| render_field(catalog, slot, icons, record, errors))
                .collect(),
        })
        .collect();

    FormView {
        title: catalog.title().to_string(),
        subtitle: catalog.subtitle().map(str::to_string),
        submit_label: catalog.submit_label().to_string(),
        sections,
    }
}

impl fmt::Display for FormView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if let Some(subtitle) = &self.subtitle {
            writeln!(f, "{}", subtitle)?;
        }

        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "[{}] {}", section.icon, section.heading)?;
            for field in &section.fields {
                let value = if field.value.is_empty() {
                    "-"
                } else {
                    field.value.as_str()
                };
                writeln!(f, "  [{}] {}: {}", field.icon, field.display_label(), value)?;
                if let Some(error) = &field.error {
                    writeln!(f, "      ! {}", error)?;
                }
            }
        }

        writeln!(f)?;
        write!(f, "<{}>", self.submit_label)
    }
}
