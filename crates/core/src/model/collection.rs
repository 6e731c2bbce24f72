//! Static description of one resource collection.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::resolver::template;

/// One independently-versioned, hierarchically-addressed resource type.
///
/// `ordered_params` lists the identifying parameters outermost-first; the
/// last entry is the terminal parameter naming the specific instance, which
/// can never come from a resolver or default. `relative_path` carries exactly
/// one `{param}` placeholder per ordered parameter, in the same order,
/// possibly interleaved with literal segments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionSchema {
    pub api_name: String,
    pub api_version: String,
    /// Dotted collection id, e.g. `svc.projects.widgets`.
    pub full_name: String,
    pub base_url: String,
    pub relative_path: String,
    pub ordered_params: Vec<String>,
}

impl CollectionSchema {
    pub fn new(
        api_name: impl Into<String>,
        api_version: impl Into<String>,
        full_name: impl Into<String>,
        base_url: impl Into<String>,
        relative_path: impl Into<String>,
        ordered_params: Vec<String>,
    ) -> Result<Self, RegistryError> {
        let schema = Self {
            api_name: api_name.into(),
            api_version: api_version.into(),
            full_name: full_name.into(),
            base_url: base_url.into(),
            relative_path: relative_path.into(),
            ordered_params,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Registration-time invariants. Also run by the registry, since schemas
    /// deserialized from a catalog file bypass [`CollectionSchema::new`].
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.ordered_params.is_empty() {
            return Err(RegistryError::MalformedSchema {
                collection: self.full_name.clone(),
                reason: "at least one ordered parameter is required".to_string(),
            });
        }
        let placeholders = template::parse_template(&self.relative_path);
        if placeholders != self.ordered_params {
            return Err(RegistryError::MalformedSchema {
                collection: self.full_name.clone(),
                reason: format!(
                    "template placeholders {:?} do not match ordered params {:?}",
                    placeholders, self.ordered_params
                ),
            });
        }
        Ok(())
    }

    /// The parameter denoting the specific instance.
    pub fn terminal_param(&self) -> Option<&str> {
        self.ordered_params.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn valid_schema_passes_validation() {
        let schema = CollectionSchema::new(
            "svc",
            "v1",
            "svc.projects.widgets",
            "https://svc.atlasapis.com/v1/",
            "projects/{project}/widgets/{widget}",
            params(&["project", "widget"]),
        )
        .unwrap();
        assert_eq!(schema.terminal_param(), Some("widget"));
    }

    #[test]
    fn placeholder_mismatch_is_a_config_error() {
        let err = CollectionSchema::new(
            "svc",
            "v1",
            "svc.projects.widgets",
            "https://svc.atlasapis.com/v1/",
            "projects/{project}/widgets/{name}",
            params(&["project", "widget"]),
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSchema { .. }));
    }

    #[test]
    fn missing_placeholder_is_a_config_error() {
        let err = CollectionSchema::new(
            "svc",
            "v1",
            "svc.projects",
            "https://svc.atlasapis.com/v1/",
            "projects",
            params(&["project"]),
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSchema { .. }));
    }

    #[test]
    fn empty_params_are_a_config_error() {
        let err = CollectionSchema::new(
            "svc",
            "v1",
            "svc.projects",
            "https://svc.atlasapis.com/v1/",
            "projects",
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSchema { .. }));
    }
}
