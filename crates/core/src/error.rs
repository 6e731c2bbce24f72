//! Error types for resource parsing and registry configuration.
//!
//! Two families: [`ResolveError`] covers bad user input and is an expected,
//! recoverable outcome surfaced verbatim; [`RegistryError`] indicates a
//! registration-time defect and is not meant to be caught during normal
//! resolution.

use thiserror::Error;

use crate::model::catalog::CatalogError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors caused by the text the caller supplied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("could not parse resource: [{line}]")]
    InvalidResource { line: String },

    #[error("invalid endpoint [{url}]: missing http(s) scheme")]
    InvalidEndpoint { url: String },

    #[error("unknown collection for [{line}]")]
    UnknownCollection { line: String },

    #[error("wrong collection: expected [{expected}], got [{got}], for path [{path}]")]
    WrongResourceCollection {
        expected: String,
        got: String,
        path: String,
    },

    #[error("wrong number of fields: [{path}] does not match any of {accepted}")]
    WrongFieldNumber { path: String, accepted: String },

    #[error("unknown field [{field}] in [{path}]")]
    UnknownField { field: String, path: String },
}

impl ResolveError {
    /// The accepted shapes for a collection with these ordered params, spelled
    /// the way the user would have to type them.
    pub(crate) fn wrong_field_number(path: &str, ordered_params: &[String]) -> Self {
        let upper: Vec<String> = ordered_params
            .iter()
            .map(|p| p.to_uppercase())
            .collect();
        let mut possibilities = vec![upper[1..].join("/"), format!("/{}", upper.join("/"))];
        if ordered_params.len() > 2 {
            possibilities.insert(0, upper[upper.len() - 1].clone());
        }
        ResolveError::WrongFieldNumber {
            path: path.to_owned(),
            accepted: possibilities.join(", "),
        }
    }
}

/// Configuration defects detected while registering collection schemas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("collection [{collection}] defined in multiple APIs: {base_urls:?}")]
    AmbiguousApi {
        collection: String,
        base_urls: Vec<String>,
    },

    #[error("collections [{existing}] and [{incoming}] share the URL path [{path}]")]
    AmbiguousResourcePath {
        existing: String,
        incoming: String,
        path: String,
    },

    #[error("malformed schema for [{collection}]: {reason}")]
    MalformedSchema { collection: String, reason: String },

    #[error("URL template token [{token}] would mix literal and parameter branches")]
    MixedTrieBranch { token: String },

    #[error("invalid default registration: {reason}")]
    InvalidDefault { reason: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_field_number_lists_accepted_shapes() {
        let params = vec!["project".to_string(), "widget".to_string()];
        let err = ResolveError::wrong_field_number("a/b/c", &params);
        let text = err.to_string();
        assert!(text.contains("[a/b/c]"));
        assert!(text.contains("WIDGET"));
        assert!(text.contains("/PROJECT/WIDGET"));
    }

    #[test]
    fn wrong_field_number_adds_bare_terminal_for_deep_collections() {
        let params = vec![
            "project".to_string(),
            "zone".to_string(),
            "instance".to_string(),
        ];
        let err = ResolveError::wrong_field_number("x", &params);
        assert!(err.to_string().starts_with(
            "wrong number of fields: [x] does not match any of INSTANCE, ZONE/INSTANCE"
        ));
    }

    #[test]
    fn user_errors_display_verbatim_input() {
        let err = ResolveError::UnknownCollection {
            line: "bareName".to_string(),
        };
        assert_eq!(err.to_string(), "unknown collection for [bareName]");
    }
}
