//! The seam to the catalog that supplies collection schemas.
//!
//! The registry never hard-codes the set of APIs it can address; it pulls
//! schemas on demand through this trait when an unseen API is first named by
//! a collection id or a URL.

use thiserror::Error;

use crate::model::collection::CollectionSchema;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown API [{name}]")]
    UnknownApi { name: String },
    #[error("unknown version [{version}] for API [{name}]")]
    UnknownVersion { name: String, version: String },
}

/// Source of collection schemas for lazily-registered APIs.
pub trait ApiCatalog {
    /// All collection schemas owned by one version of an API.
    fn collections(&self, api: &str, version: &str)
        -> Result<Vec<CollectionSchema>, CatalogError>;

    /// The version used when the caller names an API without one.
    fn default_version(&self, api: &str) -> Result<String, CatalogError>;

    /// Every version the catalog can materialize for an API.
    fn known_versions(&self, api: &str) -> Result<Vec<String>, CatalogError>;
}
