//! Form configuration
//!
//! Read from the environment (and a `.env` file when present).

use std::path::PathBuf;

use tracing::info;

use crate::catalog::{CatalogError, CatalogLoader, DocumentCatalog};

pub const CATALOG_ENV: &str = "FACTORY_LICENSE_CATALOG";
pub const UPLOAD_DIR_ENV: &str = "FACTORY_LICENSE_UPLOAD_DIR";
pub const SUBMISSION_DIR_ENV: &str = "FACTORY_LICENSE_SUBMISSION_DIR";
pub const SUCCESS_ROUTE_ENV: &str = "FACTORY_LICENSE_SUCCESS_ROUTE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Catalog YAML to load instead of the built-in factory license catalog
    pub catalog_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
    pub submission_dir: PathBuf,
    pub success_route: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            upload_dir: PathBuf::from("data/uploads"),
            submission_dir: PathBuf::from("data/submissions"),
            success_route: "/dashboard".to_string(),
        }
    }
}

impl FormConfig {
    /// Load `.env` if present, then read the environment
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; unset or blank values use defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            catalog_path: get(CATALOG_ENV).map(PathBuf::from),
            upload_dir: get(UPLOAD_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            submission_dir: get(SUBMISSION_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.submission_dir),
            success_route: get(SUCCESS_ROUTE_ENV).unwrap_or(defaults.success_route),
        }
    }

    /// The configured catalog, or the built-in one
    pub fn load_catalog(&self) -> Result<DocumentCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => {
                info!("Loading document catalog from {}", path.display());
                CatalogLoader::load_from_file(path)
            }
            None => Ok(DocumentCatalog::factory_license()),
        }
    }
}
