//! Resolvable reference to a single resource instance.
//!
//! A reference is created unresolved by a parser; weak/strict resolution are
//! the only mutators and only ever fill empty slots. Once every slot is
//! filled the reference is effectively immutable.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::ResolveError;
use crate::model::collection::CollectionSchema;
use crate::resolver::defaults::{DefaultResolverTable, Resolver, ResolverContext};
use crate::resolver::template;

/// Collections whose composed links keep `/` and friends readable instead of
/// percent-escaped. Kept for compatibility with links issued by the services
/// themselves.
const DECODED_LINK_PREFIXES: [&str; 2] = ["compute.", "storage."];

#[derive(Clone)]
pub struct Reference {
    schema: Rc<CollectionSchema>,
    values: Vec<Option<String>>,
    context: ResolverContext,
    defaults: Rc<RefCell<DefaultResolverTable>>,
    endpoint_url: String,
    source: Option<String>,
    self_link: Option<String>,
}

impl Reference {
    pub(crate) fn new(
        schema: Rc<CollectionSchema>,
        values: Vec<Option<String>>,
        context: ResolverContext,
        defaults: Rc<RefCell<DefaultResolverTable>>,
        endpoint_url: Option<String>,
        source: Option<String>,
    ) -> Self {
        let endpoint_url = endpoint_url.unwrap_or_else(|| schema.base_url.clone());
        Reference {
            schema,
            values,
            context,
            defaults,
            endpoint_url,
            source,
            self_link: None,
        }
    }

    /// Dotted collection id this reference belongs to.
    pub fn collection(&self) -> &str {
        &self.schema.full_name
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        let idx = self.schema.ordered_params.iter().position(|p| p == name)?;
        self.values[idx].as_deref()
    }

    /// All (param, value) pairs in hierarchy order.
    pub fn params(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.schema
            .ordered_params
            .iter()
            .zip(&self.values)
            .map(|(param, value)| (param.as_str(), value.as_deref()))
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Best-effort resolution: for each empty field try, in order, a context
    /// resolver, the collection-specific default, then the wildcard default.
    /// Never fails; unresolved fields stay empty. Recomputes the self-link
    /// with `*` standing in for anything still missing.
    pub fn weak_resolve(&mut self) {
        for (idx, param) in self.schema.ordered_params.iter().enumerate() {
            if self.values[idx].is_some() {
                continue;
            }
            // An empty string from a resolver is "no value", not a value.
            let resolved = self
                .context
                .get(param)
                .and_then(Resolver::resolve)
                .filter(|value| !value.is_empty())
                .or_else(|| {
                    self.defaults
                        .borrow()
                        .get(&self.schema.api_name, &self.schema.full_name, param)
                        .and_then(Resolver::resolve)
                        .filter(|value| !value.is_empty())
                });
            self.values[idx] = resolved;
        }

        let effective: HashMap<String, String> = self
            .schema
            .ordered_params
            .iter()
            .zip(&self.values)
            .map(|(param, value)| {
                (
                    param.clone(),
                    value.clone().unwrap_or_else(|| "*".to_string()),
                )
            })
            .collect();
        let mut link = format!(
            "{}{}",
            self.endpoint_url,
            template::expand(&self.schema.relative_path, &effective)
        );
        if DECODED_LINK_PREFIXES
            .iter()
            .any(|prefix| self.schema.full_name.starts_with(prefix))
        {
            link = template::percent_decode(&link);
        }
        self.self_link = Some(link);
    }

    /// Weak resolution followed by a strict check, reporting the first field
    /// that is still empty.
    pub fn resolve(&mut self) -> Result<(), ResolveError> {
        self.weak_resolve();
        for (idx, param) in self.schema.ordered_params.iter().enumerate() {
            if self.values[idx].is_none() {
                return Err(ResolveError::UnknownField {
                    field: param.clone(),
                    path: self.display_path(),
                });
            }
        }
        Ok(())
    }

    /// The terminal parameter's value, which names the specific instance.
    pub fn name(&mut self) -> Result<String, ResolveError> {
        self.resolve()?;
        match self.values.last() {
            Some(Some(value)) => Ok(value.clone()),
            _ => Err(ResolveError::UnknownField {
                field: self.schema.terminal_param().unwrap_or_default().to_owned(),
                path: self.display_path(),
            }),
        }
    }

    /// Canonical absolute URL; fails if any field cannot be resolved.
    pub fn self_link(&mut self) -> Result<String, ResolveError> {
        self.resolve()?;
        Ok(self.self_link.clone().unwrap_or_default())
    }

    /// Self-link with `*` for any still-unset parameter.
    pub fn weak_self_link(&mut self) -> String {
        self.weak_resolve();
        self.self_link.clone().unwrap_or_default()
    }

    fn display_path(&self) -> String {
        self.source
            .clone()
            .unwrap_or_else(|| self.schema.full_name.clone())
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.schema.full_name == other.schema.full_name && self.values == other.values
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("collection", &self.schema.full_name)
            .field("values", &self.values)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::defaults::Resolver;

    fn widget_schema() -> Rc<CollectionSchema> {
        Rc::new(
            CollectionSchema::new(
                "svc",
                "v1",
                "svc.projects.widgets",
                "https://svc.atlasapis.com/v1/",
                "projects/{project}/widgets/{widget}",
                vec!["project".to_string(), "widget".to_string()],
            )
            .unwrap(),
        )
    }

    fn reference(
        values: Vec<Option<String>>,
        context: ResolverContext,
        defaults: DefaultResolverTable,
    ) -> Reference {
        Reference::new(
            widget_schema(),
            values,
            context,
            Rc::new(RefCell::new(defaults)),
            None,
            None,
        )
    }

    #[test]
    fn context_resolver_fills_missing_leading_field() {
        let mut context = ResolverContext::new();
        context.insert("project".to_string(), Resolver::literal("ctx-proj"));
        let mut r = reference(
            vec![None, Some("mywidget".to_string())],
            context,
            DefaultResolverTable::default(),
        );
        r.weak_resolve();
        assert_eq!(r.param("project"), Some("ctx-proj"));
        assert_eq!(
            r.weak_self_link(),
            "https://svc.atlasapis.com/v1/projects/ctx-proj/widgets/mywidget"
        );
    }

    #[test]
    fn defaults_fill_after_context() {
        let mut defaults = DefaultResolverTable::default();
        defaults
            .set("svc", None, "project", Resolver::literal("default-proj"))
            .unwrap();
        let mut r = reference(
            vec![None, Some("w".to_string())],
            ResolverContext::new(),
            defaults,
        );
        r.resolve().unwrap();
        assert_eq!(r.param("project"), Some("default-proj"));
    }

    #[test]
    fn filled_fields_are_never_overwritten() {
        let mut context = ResolverContext::new();
        context.insert("project".to_string(), Resolver::literal("other"));
        let mut r = reference(
            vec![Some("explicit".to_string()), Some("w".to_string())],
            context,
            DefaultResolverTable::default(),
        );
        r.weak_resolve();
        assert_eq!(r.param("project"), Some("explicit"));
    }

    #[test]
    fn weak_resolve_is_idempotent() {
        let mut r = reference(
            vec![None, Some("w".to_string())],
            ResolverContext::new(),
            DefaultResolverTable::default(),
        );
        r.weak_resolve();
        let first_link = r.weak_self_link();
        let first_values: Vec<_> = r.params().map(|(_, v)| v.map(str::to_owned)).collect();
        r.weak_resolve();
        assert_eq!(r.weak_self_link(), first_link);
        let second_values: Vec<_> = r.params().map(|(_, v)| v.map(str::to_owned)).collect();
        assert_eq!(first_values, second_values);
    }

    #[test]
    fn weak_self_link_marks_unset_fields() {
        let mut r = reference(
            vec![None, Some("w".to_string())],
            ResolverContext::new(),
            DefaultResolverTable::default(),
        );
        assert_eq!(
            r.weak_self_link(),
            "https://svc.atlasapis.com/v1/projects/*/widgets/w"
        );
    }

    #[test]
    fn resolve_names_first_missing_field() {
        let mut r = reference(
            vec![None, Some("mywidget".to_string())],
            ResolverContext::new(),
            DefaultResolverTable::default(),
        );
        let err = r.name().unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownField {
                field: "project".to_string(),
                path: "svc.projects.widgets".to_string(),
            }
        );
    }

    #[test]
    fn name_is_the_terminal_value() {
        let mut r = reference(
            vec![Some("p".to_string()), Some("mywidget".to_string())],
            ResolverContext::new(),
            DefaultResolverTable::default(),
        );
        assert_eq!(r.name().unwrap(), "mywidget");
    }

    #[test]
    fn func_resolver_is_invoked_once_per_fill() {
        use std::cell::Cell;
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut context = ResolverContext::new();
        context.insert(
            "project".to_string(),
            Resolver::func(move || {
                seen.set(seen.get() + 1);
                Some("lazy-proj".to_string())
            }),
        );
        let mut r = reference(
            vec![None, Some("w".to_string())],
            context,
            DefaultResolverTable::default(),
        );
        r.weak_resolve();
        r.weak_resolve();
        assert_eq!(calls.get(), 1);
        assert_eq!(r.param("project"), Some("lazy-proj"));
    }

    #[test]
    fn legacy_collections_decode_composed_links() {
        let schema = Rc::new(
            CollectionSchema::new(
                "storage",
                "v1",
                "storage.objects",
                "https://www.atlasapis.com/storage/v1/",
                "b/{bucket}/o/{object}",
                vec!["bucket".to_string(), "object".to_string()],
            )
            .unwrap(),
        );
        let mut r = Reference::new(
            schema,
            vec![Some("bkt".to_string()), Some("path/to/obj".to_string())],
            ResolverContext::new(),
            Rc::new(RefCell::new(DefaultResolverTable::default())),
            None,
            None,
        );
        assert_eq!(
            r.self_link().unwrap(),
            "https://www.atlasapis.com/storage/v1/b/bkt/o/path/to/obj"
        );
    }
}
