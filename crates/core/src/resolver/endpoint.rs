// Endpoint splitting: infer (api, version, resource path) from a URL.
//
// Configured endpoint overrides win over the domain heuristics. Hosts that
// carry the canonical API-domain marker put the api name in the first host
// label with an optional version as the first path segment; every other host
// (local proxies, www.-style shared hosts) carries api and version as the
// first two path segments.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ResolveError;
use crate::model::catalog::ApiCatalog;

/// Marker for hosts following the `<api>.<marker>.<tld>` convention.
pub(crate) const API_DOMAIN_MARKER: &str = "atlasapis";

/// Version-shaped path tokens: `v1`, `v2beta3`, `alpha`, `beta`.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(v\d+[a-z0-9]*|alpha|beta)$").expect("invalid version regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitUrl {
    pub api_name: String,
    pub api_version: Option<String>,
    pub resource_path: String,
    /// The URL with the resource path removed; becomes the reference's base.
    pub endpoint: String,
}

pub(crate) fn strip_scheme(url: &str) -> Result<&str, ResolveError> {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| ResolveError::InvalidEndpoint {
            url: url.to_owned(),
        })
}

pub(crate) fn split_url(
    url: &str,
    overrides: &HashMap<String, String>,
    catalog: &dyn ApiCatalog,
) -> Result<SplitUrl, ResolveError> {
    strip_scheme(url)?;

    for (api, base) in overrides {
        if let Some(rest) = url.strip_prefix(base.as_str()) {
            let (api_version, resource_path) = take_version(api, rest, catalog);
            return Ok(split_at(url, api.clone(), api_version, resource_path));
        }
    }

    let stripped = strip_scheme(url)?;
    let (host, rest) = stripped.split_once('/').unwrap_or((stripped, ""));

    if host.contains(API_DOMAIN_MARKER) && !host.starts_with("www.") {
        let api_name = host.split('.').next().unwrap_or(host).to_owned();
        let (api_version, resource_path) = take_version(&api_name, rest, catalog);
        return Ok(split_at(url, api_name, api_version, resource_path));
    }

    // Path-style: /<api>/<version>/<resource...>
    let mut segments = rest.splitn(3, '/');
    let api_name = segments
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| ResolveError::InvalidResource {
            line: url.to_owned(),
        })?
        .to_owned();
    let api_version = segments
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| ResolveError::InvalidResource {
            line: url.to_owned(),
        })?
        .to_owned();
    let resource_path = segments.next().unwrap_or("").to_owned();
    Ok(split_at(url, api_name, Some(api_version), resource_path))
}

fn split_at(
    url: &str,
    api_name: String,
    api_version: Option<String>,
    resource_path: String,
) -> SplitUrl {
    let endpoint = url[..url.len() - resource_path.len()].to_owned();
    SplitUrl {
        api_name,
        api_version,
        resource_path,
        endpoint,
    }
}

/// Peel a leading version segment off `rest` when it is one the catalog
/// knows or at least looks like a version; otherwise the caller falls back
/// to the API's declared default.
fn take_version(api: &str, rest: &str, catalog: &dyn ApiCatalog) -> (Option<String>, String) {
    let (first, remainder) = rest.split_once('/').unwrap_or((rest, ""));
    let known = catalog.known_versions(api).unwrap_or_default();
    if known.iter().any(|version| version == first) || VERSION_PATTERN.is_match(first) {
        (Some(first.to_owned()), remainder.to_owned())
    } else {
        (None, rest.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::CatalogError;
    use crate::model::collection::CollectionSchema;

    struct FakeCatalog;

    impl ApiCatalog for FakeCatalog {
        fn collections(
            &self,
            api: &str,
            _version: &str,
        ) -> Result<Vec<CollectionSchema>, CatalogError> {
            Err(CatalogError::UnknownApi {
                name: api.to_owned(),
            })
        }

        fn default_version(&self, _api: &str) -> Result<String, CatalogError> {
            Ok("v1".to_string())
        }

        fn known_versions(&self, api: &str) -> Result<Vec<String>, CatalogError> {
            if api == "svc" {
                Ok(vec!["v1".to_string(), "prod-2024".to_string()])
            } else {
                Ok(vec![])
            }
        }
    }

    #[test]
    fn missing_scheme_is_invalid_endpoint() {
        let err = split_url("ftp://svc.atlasapis.com/v1/x", &HashMap::new(), &FakeCatalog)
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidEndpoint { .. }));
    }

    #[test]
    fn canonical_host_carries_api_and_version() {
        let split = split_url(
            "https://svc.atlasapis.com/v1/projects/p/widgets/w",
            &HashMap::new(),
            &FakeCatalog,
        )
        .unwrap();
        assert_eq!(split.api_name, "svc");
        assert_eq!(split.api_version.as_deref(), Some("v1"));
        assert_eq!(split.resource_path, "projects/p/widgets/w");
        assert_eq!(split.endpoint, "https://svc.atlasapis.com/v1/");
    }

    #[test]
    fn canonical_host_without_version_defers_to_default() {
        let split = split_url(
            "https://svc.atlasapis.com/projects/p",
            &HashMap::new(),
            &FakeCatalog,
        )
        .unwrap();
        assert_eq!(split.api_name, "svc");
        assert_eq!(split.api_version, None);
        assert_eq!(split.resource_path, "projects/p");
    }

    #[test]
    fn catalog_known_version_is_accepted_even_when_unshapely() {
        let split = split_url(
            "https://svc.atlasapis.com/prod-2024/projects/p",
            &HashMap::new(),
            &FakeCatalog,
        )
        .unwrap();
        assert_eq!(split.api_version.as_deref(), Some("prod-2024"));
        assert_eq!(split.resource_path, "projects/p");
    }

    #[test]
    fn www_host_is_path_style() {
        let split = split_url(
            "https://www.atlasapis.com/storage/v1/b/bkt/o/obj",
            &HashMap::new(),
            &FakeCatalog,
        )
        .unwrap();
        assert_eq!(split.api_name, "storage");
        assert_eq!(split.api_version.as_deref(), Some("v1"));
        assert_eq!(split.resource_path, "b/bkt/o/obj");
        assert_eq!(split.endpoint, "https://www.atlasapis.com/storage/v1/");
    }

    #[test]
    fn foreign_host_is_path_style() {
        let split = split_url(
            "http://localhost:8787/svc/v1/projects/p",
            &HashMap::new(),
            &FakeCatalog,
        )
        .unwrap();
        assert_eq!(split.api_name, "svc");
        assert_eq!(split.api_version.as_deref(), Some("v1"));
        assert_eq!(split.resource_path, "projects/p");
    }

    #[test]
    fn path_style_without_enough_segments_is_invalid_resource() {
        let err = split_url("https://localhost/onlyapi", &HashMap::new(), &FakeCatalog)
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidResource { .. }));
    }

    #[test]
    fn endpoint_override_wins_over_heuristics() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "svc".to_string(),
            "https://sandbox.example.dev/svc-api/".to_string(),
        );
        let split = split_url(
            "https://sandbox.example.dev/svc-api/projects/p",
            &overrides,
            &FakeCatalog,
        )
        .unwrap();
        assert_eq!(split.api_name, "svc");
        assert_eq!(split.api_version, None);
        assert_eq!(split.resource_path, "projects/p");
        assert_eq!(split.endpoint, "https://sandbox.example.dev/svc-api/");
    }
}
