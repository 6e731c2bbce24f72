//! In-memory catalog for test scenarios.

use std::collections::HashMap;

use atlas_core::{ApiCatalog, CatalogError, CollectionSchema};

/// Builder-style `ApiCatalog` backed by plain maps.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    default_versions: HashMap<String, String>,
    collections: HashMap<String, HashMap<String, Vec<CollectionSchema>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default_version(&mut self, api: impl Into<String>, version: impl Into<String>) {
        self.default_versions.insert(api.into(), version.into());
    }

    /// Add one schema under its own api/version. The first version seen for
    /// an API becomes its default unless one was set explicitly.
    pub fn add_collection(&mut self, schema: CollectionSchema) {
        self.default_versions
            .entry(schema.api_name.clone())
            .or_insert_with(|| schema.api_version.clone());
        self.collections
            .entry(schema.api_name.clone())
            .or_default()
            .entry(schema.api_version.clone())
            .or_default()
            .push(schema);
    }

    /// The catalog used across the integration tests: a two-version `svc`
    /// API and the storage API backing the shorthand collections.
    pub fn sample() -> Self {
        let mut catalog = Self::new();
        for version in ["v1", "v2"] {
            let base = format!("https://svc.atlasapis.com/{version}/");
            for (name, path, params) in [
                (
                    "svc.projects",
                    "projects/{project}",
                    vec!["project".to_string()],
                ),
                (
                    "svc.projects.widgets",
                    "projects/{project}/widgets/{widget}",
                    vec!["project".to_string(), "widget".to_string()],
                ),
            ] {
                catalog.add_collection(
                    CollectionSchema::new("svc", version, name, base.as_str(), path, params)
                        .expect("sample schema"),
                );
            }
        }
        let storage_base = "https://www.atlasapis.com/storage/v1/";
        catalog.add_collection(
            CollectionSchema::new(
                "storage",
                "v1",
                "storage.buckets",
                storage_base,
                "b/{bucket}",
                vec!["bucket".to_string()],
            )
            .expect("sample schema"),
        );
        catalog.add_collection(
            CollectionSchema::new(
                "storage",
                "v1",
                "storage.objects",
                storage_base,
                "b/{bucket}/o/{object}",
                vec!["bucket".to_string(), "object".to_string()],
            )
            .expect("sample schema"),
        );
        catalog
    }
}

impl ApiCatalog for InMemoryCatalog {
    fn collections(
        &self,
        api: &str,
        version: &str,
    ) -> Result<Vec<CollectionSchema>, CatalogError> {
        let versions = self
            .collections
            .get(api)
            .ok_or_else(|| CatalogError::UnknownApi {
                name: api.to_owned(),
            })?;
        versions
            .get(version)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownVersion {
                name: api.to_owned(),
                version: version.to_owned(),
            })
    }

    fn default_version(&self, api: &str) -> Result<String, CatalogError> {
        self.default_versions
            .get(api)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownApi {
                name: api.to_owned(),
            })
    }

    fn known_versions(&self, api: &str) -> Result<Vec<String>, CatalogError> {
        let versions = self
            .collections
            .get(api)
            .ok_or_else(|| CatalogError::UnknownApi {
                name: api.to_owned(),
            })?;
        Ok(versions.keys().cloned().collect())
    }
}
