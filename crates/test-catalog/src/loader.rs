//! Catalog-file loader: registration input as YAML or JSON data.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use atlas_core::CollectionSchema;
use serde::Deserialize;

use crate::catalog::InMemoryCatalog;
use crate::errors::LoaderError;

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub apis: Vec<ApiSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSpec {
    pub name: String,
    pub default_version: String,
    pub versions: Vec<VersionSpec>,
}

#[derive(Debug, Deserialize)]
pub struct VersionSpec {
    pub version: String,
    pub base_url: String,
    pub collections: Vec<CollectionSpec>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionSpec {
    /// Dotted collection id, e.g. `svc.projects.widgets`.
    pub name: String,
    /// Relative-path template with one placeholder per param.
    pub path: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Yaml,
    Json,
}

/// Parse catalog file contents into an in-memory catalog, validating every
/// schema on the way in.
pub fn parse_catalog(
    contents: &str,
    format: CatalogFormat,
) -> std::result::Result<InMemoryCatalog, LoaderError> {
    let file: CatalogFile = match format {
        CatalogFormat::Yaml => serde_yaml::from_str(contents)?,
        CatalogFormat::Json => serde_json::from_str(contents)?,
    };

    let mut catalog = InMemoryCatalog::new();
    for api in file.apis {
        catalog.set_default_version(api.name.as_str(), api.default_version.as_str());
        for version in api.versions {
            for collection in version.collections {
                let schema = CollectionSchema::new(
                    api.name.as_str(),
                    version.version.as_str(),
                    collection.name.as_str(),
                    version.base_url.as_str(),
                    collection.path.as_str(),
                    collection.params,
                )
                .map_err(|err| LoaderError::InvalidSchema {
                    message: err.to_string(),
                })?;
                catalog.add_collection(schema);
            }
        }
    }
    Ok(catalog)
}

/// Load a catalog file, picking the format from the extension.
pub fn load_catalog(path: &Path) -> Result<InMemoryCatalog> {
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => CatalogFormat::Yaml,
        Some("json") => CatalogFormat::Json,
        _ => {
            return Err(LoaderError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into())
        }
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    let catalog = parse_catalog(&contents, format)
        .with_context(|| format!("failed to parse catalog file {}", path.display()))?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::ApiCatalog;

    const SAMPLE_YAML: &str = r#"
apis:
  - name: svc
    default_version: v1
    versions:
      - version: v1
        base_url: https://svc.atlasapis.com/v1/
        collections:
          - name: svc.projects.widgets
            path: projects/{project}/widgets/{widget}
            params: [project, widget]
"#;

    #[test]
    fn parses_a_yaml_catalog() {
        let catalog = parse_catalog(SAMPLE_YAML, CatalogFormat::Yaml).unwrap();
        let schemas = catalog.collections("svc", "v1").unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].full_name, "svc.projects.widgets");
        assert_eq!(
            schemas[0].ordered_params,
            vec!["project".to_string(), "widget".to_string()]
        );
    }

    #[test]
    fn parses_a_json_catalog() {
        let json = r#"{
          "apis": [{
            "name": "svc",
            "default_version": "v1",
            "versions": [{
              "version": "v1",
              "base_url": "https://svc.atlasapis.com/v1/",
              "collections": [{
                "name": "svc.projects",
                "path": "projects/{project}",
                "params": ["project"]
              }]
            }]
          }]
        }"#;
        let catalog = parse_catalog(json, CatalogFormat::Json).unwrap();
        assert_eq!(catalog.default_version("svc").unwrap(), "v1");
    }

    #[test]
    fn schema_validation_failures_surface_as_loader_errors() {
        let bad = r#"
apis:
  - name: svc
    default_version: v1
    versions:
      - version: v1
        base_url: https://svc.atlasapis.com/v1/
        collections:
          - name: svc.projects
            path: projects/{mismatched}
            params: [project]
"#;
        let err = parse_catalog(bad, CatalogFormat::Yaml).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidSchema { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = parse_catalog("apis: [", CatalogFormat::Yaml).unwrap_err();
        assert!(matches!(err, LoaderError::Yaml(_)));
    }
}
