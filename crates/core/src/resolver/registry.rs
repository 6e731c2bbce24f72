//! Registry of collection schemas and the parse front door.
//!
//! The registry owns three indices grown incrementally as APIs are
//! materialized from the catalog: the flat collection-id → parser map used
//! for collection paths, the URL trie, and the default-resolver table. The
//! trie is append-only; parser-map entries are superseded on version
//! switches. Process-wide mutable state with no internal locking: isolation
//! across concurrent uses goes through [`Registry::clone_and_switch`] only.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, RegistryError, ResolveError, Result};
use crate::model::catalog::ApiCatalog;
use crate::model::collection::CollectionSchema;
use crate::resolver::defaults::{DefaultResolverTable, Resolver, ResolverContext};
use crate::resolver::endpoint;
use crate::resolver::path::{split_collection_prefix, CollectionParser};
use crate::resolver::reference::Reference;
use crate::resolver::trie::TrieNode;

/// The two hard-coded storage collections reachable through shorthand.
pub const STORAGE_BUCKETS: &str = "storage.buckets";
pub const STORAGE_OBJECTS: &str = "storage.objects";

const STORAGE_SCHEME_PREFIX: &str = "blob://";
/// Storage endpoints recognized by the URL fallback when the trie declines.
const STORAGE_BASE_URL: &str = "https://www.atlasapis.com/storage/v1/";
const STORAGE_ALT_BASE_URL: &str = "https://storage.atlasapis.com/";

/// `blob://bucket` or `blob://bucket/object`; the object may contain `/`.
static STORAGE_SHORTHAND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^blob://([^/]*)(?:/(.*))?$").expect("invalid storage regex"));

pub struct Registry {
    catalog: Rc<dyn ApiCatalog>,
    path_parsers: HashMap<String, CollectionParser>,
    url_trie: TrieNode,
    defaults: Rc<RefCell<DefaultResolverTable>>,
    known_apis: HashMap<String, HashSet<String>>,
    endpoint_overrides: HashMap<String, String>,
}

impl Registry {
    pub fn new(catalog: Rc<dyn ApiCatalog>) -> Self {
        Registry {
            catalog,
            path_parsers: HashMap::new(),
            url_trie: TrieNode::default(),
            defaults: Rc::new(RefCell::new(DefaultResolverTable::default())),
            known_apis: HashMap::new(),
            endpoint_overrides: HashMap::new(),
        }
    }

    /// Route an API's URLs and issued links through a non-default endpoint.
    pub fn set_endpoint_override(&mut self, api: impl Into<String>, base_url: impl Into<String>) {
        self.endpoint_overrides.insert(api.into(), base_url.into());
    }

    pub fn set_default(
        &mut self,
        api: &str,
        collection: Option<&str>,
        param: &str,
        resolver: Resolver,
    ) -> std::result::Result<(), RegistryError> {
        self.defaults.borrow_mut().set(api, collection, param, resolver)
    }

    /// Evaluate the registered default for a parameter, exact collection
    /// entry first, then the API-wide wildcard. `None` when neither exists
    /// or the resolver declines.
    pub fn get_default(&self, api: &str, collection: &str, param: &str) -> Option<String> {
        self.defaults
            .borrow()
            .get(api, collection, param)
            .and_then(Resolver::resolve)
    }

    /// Register one collection schema. Growth of the URL trie is idempotent;
    /// the path-parser entry is replaced unconditionally unless a different
    /// API already claims the id.
    pub fn register_collection(
        &mut self,
        schema: CollectionSchema,
    ) -> std::result::Result<(), RegistryError> {
        schema.validate()?;
        if let Some(existing) = self.path_parsers.get(&schema.full_name) {
            if existing.schema().api_name != schema.api_name {
                return Err(RegistryError::AmbiguousApi {
                    collection: schema.full_name.clone(),
                    base_urls: vec![
                        existing.schema().base_url.clone(),
                        schema.base_url.clone(),
                    ],
                });
            }
        }

        let schema = Rc::new(schema);
        let mut tokens = vec![schema.api_name.clone(), schema.api_version.clone()];
        tokens.extend(schema.relative_path.split('/').map(str::to_owned));
        self.url_trie.insert(&tokens, schema.clone())?;

        debug!(
            collection = %schema.full_name,
            api = %schema.api_name,
            version = %schema.api_version,
            "registered collection"
        );
        self.path_parsers.insert(
            schema.full_name.clone(),
            CollectionParser::new(schema, self.defaults.clone()),
        );
        Ok(())
    }

    /// Materialize an API version from the catalog if it is not already
    /// known. With no version requested: a single already-registered version
    /// is reused, otherwise the catalog's declared default applies.
    pub fn register_api(
        &mut self,
        api: &str,
        version: Option<&str>,
    ) -> std::result::Result<String, RegistryError> {
        let registered = self.known_apis.get(api);
        let version = match version {
            Some(version) => version.to_owned(),
            None => match registered {
                Some(versions) if versions.len() == 1 => {
                    versions.iter().next().cloned().unwrap_or_default()
                }
                _ => self.catalog.default_version(api)?,
            },
        };
        if self
            .known_apis
            .get(api)
            .is_some_and(|versions| versions.contains(&version))
        {
            return Ok(version);
        }

        let schemas = self.catalog.collections(api, &version)?;
        for schema in schemas {
            self.register_collection(schema)?;
        }
        self.known_apis
            .entry(api.to_owned())
            .or_default()
            .insert(version.clone());
        Ok(version)
    }

    /// Intentional version replacement: collection-path parsing moves to the
    /// new version while the trie keeps the old version's entries, so links
    /// issued before the switch stay parseable.
    pub fn switch_api(
        &mut self,
        api: &str,
        version: &str,
    ) -> std::result::Result<(), RegistryError> {
        debug!(api, version, "switching API version");
        self.path_parsers
            .retain(|_, parser| parser.schema().api_name != api);
        self.known_apis.remove(api);
        self.register_api(api, Some(version))?;
        Ok(())
    }

    /// Sandboxed copy: the three indices are spine-copied (schemas shared),
    /// the default table gets a fresh handle, and every cloned parser is
    /// re-pointed at it before the requested versions are switched in.
    pub fn clone_and_switch(
        &self,
        apis: &[(&str, &str)],
    ) -> std::result::Result<Registry, RegistryError> {
        let defaults = Rc::new(RefCell::new(self.defaults.borrow().clone()));
        let path_parsers = self
            .path_parsers
            .iter()
            .map(|(id, parser)| (id.clone(), parser.with_defaults(defaults.clone())))
            .collect();
        let mut cloned = Registry {
            catalog: self.catalog.clone(),
            path_parsers,
            url_trie: self.url_trie.clone(),
            defaults,
            known_apis: self.known_apis.clone(),
            endpoint_overrides: self.endpoint_overrides.clone(),
        };
        for (api, version) in apis {
            cloned.switch_api(api, version)?;
        }
        Ok(cloned)
    }

    /// Parse a collection path against a known collection id, materializing
    /// the owning API on first use.
    pub fn parse_collection_path(
        &mut self,
        collection: &str,
        path: Option<&str>,
        context: ResolverContext,
        resolve: bool,
    ) -> Result<Reference> {
        let api = collection.split('.').next().unwrap_or_default().to_owned();
        if api.is_empty() {
            return Err(ResolveError::UnknownCollection {
                line: collection.to_owned(),
            }
            .into());
        }
        match self.register_api(&api, None) {
            Ok(_) => {}
            Err(RegistryError::Catalog(_)) => {
                return Err(ResolveError::UnknownCollection {
                    line: collection.to_owned(),
                }
                .into())
            }
            Err(err) => return Err(err.into()),
        }
        let parser =
            self.path_parsers
                .get(collection)
                .ok_or_else(|| ResolveError::UnknownCollection {
                    line: collection.to_owned(),
                })?;
        let base_url = self.endpoint_overrides.get(&api).cloned();
        Ok(parser.parse_path(path, context, resolve, base_url)?)
    }

    /// Parse an absolute URL through the trie. A matched URL is
    /// definitionally fully specified, so the result is always resolved.
    pub fn parse_url(&mut self, url: &str) -> Result<Reference> {
        let split = endpoint::split_url(url, &self.endpoint_overrides, self.catalog.as_ref())?;
        let version = match self.register_api(&split.api_name, split.api_version.as_deref()) {
            Ok(version) => version,
            Err(RegistryError::Catalog(_)) => {
                return Err(ResolveError::InvalidResource {
                    line: url.to_owned(),
                }
                .into())
            }
            Err(err) => return Err(err.into()),
        };

        let mut tokens = vec![split.api_name.clone(), version];
        tokens.extend(split.resource_path.split('/').map(str::to_owned));
        let (schema, params) = self.url_trie.walk(&tokens, url)?;

        let context: ResolverContext = params
            .into_iter()
            .map(|(param, value)| (param, Resolver::Literal(value)))
            .collect();
        let values = vec![None; schema.ordered_params.len()];
        let mut reference = Reference::new(
            schema,
            values,
            context,
            self.defaults.clone(),
            Some(split.endpoint),
            Some(url.to_owned()),
        );
        reference.resolve()?;
        Ok(reference)
    }

    /// `blob://bucket` or `blob://bucket/object`, bypassing the trie and the
    /// collection grammar.
    pub fn parse_storage_shorthand(&mut self, url: &str) -> Result<Reference> {
        let caps = STORAGE_SHORTHAND_PATTERN.captures(url).ok_or_else(|| {
            ResolveError::InvalidResource {
                line: url.to_owned(),
            }
        })?;
        let bucket = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        match caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
            Some(object) => self.create(STORAGE_OBJECTS, [("bucket", bucket), ("object", object)]),
            None => self.create(STORAGE_BUCKETS, [("bucket", bucket)]),
        }
    }

    /// The front door: URLs, storage shorthand, and collection paths.
    pub fn parse(
        &mut self,
        line: Option<&str>,
        context: ResolverContext,
        collection: Option<&str>,
        enforce_collection: bool,
        resolve: bool,
    ) -> Result<Reference> {
        if let Some(line) = line {
            if line.starts_with("https://") || line.starts_with("http://") {
                let parsed = match self.parse_url(line) {
                    Ok(reference) => Some(reference),
                    Err(Error::Resolve(ResolveError::InvalidResource { .. })) => None,
                    Err(err) => return Err(err),
                };
                let mut reference = match parsed {
                    Some(reference) => reference,
                    None => self.parse_storage_fallback(line)?,
                };
                if enforce_collection {
                    if let Some(expected) = collection {
                        if reference.collection() != expected {
                            return Err(ResolveError::WrongResourceCollection {
                                expected: expected.to_owned(),
                                got: reference.collection().to_owned(),
                                path: reference.weak_self_link(),
                            }
                            .into());
                        }
                    }
                }
                return Ok(reference);
            }
            if line.starts_with(STORAGE_SCHEME_PREFIX) {
                return self.parse_storage_shorthand(line);
            }
        }

        let line_text = line.unwrap_or_default();
        let collection = match collection {
            Some(collection) => collection.to_owned(),
            None => {
                let (prefix, _) = split_collection_prefix(line_text).ok_or_else(|| {
                    ResolveError::InvalidResource {
                        line: line_text.to_owned(),
                    }
                })?;
                prefix
                    .ok_or_else(|| ResolveError::UnknownCollection {
                        line: line_text.to_owned(),
                    })?
                    .to_owned()
            }
        };

        // Object paths embed bucket/object in one token pair rather than the
        // collection grammar.
        if collection == STORAGE_OBJECTS {
            let mut context = context;
            if !context.contains_key("bucket") || !context.contains_key("object") {
                let path_part = split_collection_prefix(line_text)
                    .map(|(_, path)| path)
                    .unwrap_or(line_text);
                let (bucket, object) = path_part.split_once('/').ok_or_else(|| {
                    ResolveError::InvalidResource {
                        line: line_text.to_owned(),
                    }
                })?;
                context.insert("bucket".to_string(), Resolver::literal(bucket));
                context.insert("object".to_string(), Resolver::literal(object));
            }
            return self.parse_collection_path(STORAGE_OBJECTS, None, context, resolve);
        }

        self.parse_collection_path(&collection, line, context, resolve)
    }

    /// Shortcut for building a reference from a known collection and literal
    /// parameter values.
    pub fn create<I, K, V>(&mut self, collection: &str, params: I) -> Result<Reference>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let context: ResolverContext = params
            .into_iter()
            .map(|(param, value)| (param.into(), Resolver::Literal(value.into())))
            .collect();
        self.parse(None, context, Some(collection), true, true)
    }

    /// Storage URLs the trie declined: the path-style `b/<bucket>/o/<object>`
    /// form and the host-style `<bucket>[/<object>]` form.
    fn parse_storage_fallback(&mut self, url: &str) -> Result<Reference> {
        if let Some(rest) = url.strip_prefix(STORAGE_BASE_URL) {
            let mut segments = rest.splitn(4, '/');
            if let (Some("b"), Some(bucket), Some("o"), Some(object)) = (
                segments.next(),
                segments.next(),
                segments.next(),
                segments.next(),
            ) {
                return self.create(STORAGE_OBJECTS, [("bucket", bucket), ("object", object)]);
            }
        } else if let Some(rest) = url.strip_prefix(STORAGE_ALT_BASE_URL) {
            return match rest.split_once('/') {
                Some((bucket, object)) => {
                    self.create(STORAGE_OBJECTS, [("bucket", bucket), ("object", object)])
                }
                None => self.create(STORAGE_BUCKETS, [("bucket", rest)]),
            };
        }
        Err(ResolveError::InvalidResource {
            line: url.to_owned(),
        }
        .into())
    }
}
