//! Document Icons
//!
//! Presentation icons for document slots and section headings, plus the
//! key -> icon index used by the field renderer. Lookups are total: any key
//! that is not indexed resolves to [`FALLBACK_ICON`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::DocumentCatalog;

/// Icon used for any key the index does not know about.
pub const FALLBACK_ICON: Icon = Icon::FileText;

/// Icon identifiers (names follow the lucide icon set used by the web form)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Icon {
    AlertCircle,
    AlertTriangle,
    BarChart2,
    Building,
    Building2,
    ClipboardCheck,
    DollarSign,
    Factory,
    FileCheck,
    FileSearch,
    FileText,
    FileWarning,
    Files,
    Home,
    Leaf,
    PauseCircle,
    TreePine,
    User,
    Users,
    XCircle,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlertCircle => "AlertCircle",
            Self::AlertTriangle => "AlertTriangle",
            Self::BarChart2 => "BarChart2",
            Self::Building => "Building",
            Self::Building2 => "Building2",
            Self::ClipboardCheck => "ClipboardCheck",
            Self::DollarSign => "DollarSign",
            Self::Factory => "Factory",
            Self::FileCheck => "FileCheck",
            Self::FileSearch => "FileSearch",
            Self::FileText => "FileText",
            Self::FileWarning => "FileWarning",
            Self::Files => "Files",
            Self::Home => "Home",
            Self::Leaf => "Leaf",
            Self::PauseCircle => "PauseCircle",
            Self::TreePine => "TreePine",
            Self::User => "User",
            Self::Users => "Users",
            Self::XCircle => "XCircle",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static mapping from document key to icon, with a fallback
#[derive(Debug, Clone, Default)]
pub struct IconIndex {
    icons: HashMap<String, Icon>,
}

impl IconIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every slot of the catalog that declares an icon.
    ///
    /// Slots without an icon are left out and resolve to the fallback.
    pub fn from_catalog(catalog: &DocumentCatalog) -> Self {
        catalog
            .slots()
            .iter()
            .filter_map(|slot| slot.icon.map(|icon| (slot.key.clone(), icon)))
            .collect()
    }

    /// Add or replace the icon for a key
    pub fn with_icon(mut self, key: impl Into<String>, icon: Icon) -> Self {
        self.icons.insert(key.into(), icon);
        self
    }

    /// Resolve the icon for a key. Never fails.
    pub fn resolve(&self, key: &str) -> Icon {
        self.icons.get(key).copied().unwrap_or(FALLBACK_ICON)
    }

    /// Whether the key has an explicit entry (not the fallback)
    pub fn contains(&self, key: &str) -> bool {
        self.icons.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

impl FromIterator<(String, Icon)> for IconIndex {
    fn from_iter<T: IntoIterator<Item = (String, Icon)>>(iter: T) -> Self {
        Self {
            icons: iter.into_iter().collect(),
        }
    }
}
