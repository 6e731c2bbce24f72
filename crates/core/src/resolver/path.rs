//! Collection-path grammar: `[collection::]segment/.../segment`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ResolveError;
use crate::model::collection::CollectionSchema;
use crate::resolver::defaults::{DefaultResolverTable, ResolverContext};
use crate::resolver::reference::Reference;

/// `collection::path` shorthand. The collection id is dotted with at least
/// two segments; the path part is any non-empty remainder.
static COLLECTION_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<collection>[a-zA-Z_]+(?:\.[a-zA-Z0-9_]+)+)::)?(?P<path>.+)$")
        .expect("invalid collection-path regex")
});

/// Split an optional `collection::` prefix off a collection path. `None` when
/// the line is empty.
pub(crate) fn split_collection_prefix(line: &str) -> Option<(Option<&str>, &str)> {
    let caps = COLLECTION_PATH_PATTERN.captures(line)?;
    let collection = caps.name("collection").map(|m| m.as_str());
    let path = caps.name("path").map(|m| m.as_str())?;
    Some((collection, path))
}

/// Per-collection parser turning collection paths into references.
pub struct CollectionParser {
    schema: Rc<CollectionSchema>,
    defaults: Rc<RefCell<DefaultResolverTable>>,
}

impl CollectionParser {
    pub(crate) fn new(
        schema: Rc<CollectionSchema>,
        defaults: Rc<RefCell<DefaultResolverTable>>,
    ) -> Self {
        CollectionParser { schema, defaults }
    }

    pub(crate) fn schema(&self) -> &Rc<CollectionSchema> {
        &self.schema
    }

    /// Same parser bound to another registry's default table. Used when a
    /// registry is cloned, so references minted by the clone resolve against
    /// the clone.
    pub(crate) fn with_defaults(&self, defaults: Rc<RefCell<DefaultResolverTable>>) -> Self {
        CollectionParser {
            schema: self.schema.clone(),
            defaults,
        }
    }

    /// Parse a collection path into a reference. `path: None` means every
    /// field comes from the context.
    pub fn parse_path(
        &self,
        path: Option<&str>,
        context: ResolverContext,
        resolve: bool,
        base_url: Option<String>,
    ) -> Result<Reference, ResolveError> {
        let values = match path {
            Some(text) => self.fields_for_path(text)?,
            None => vec![None; self.schema.ordered_params.len()],
        };
        let mut reference = Reference::new(
            self.schema.clone(),
            values,
            context,
            self.defaults.clone(),
            base_url,
            path.map(str::to_owned),
        );
        if resolve {
            reference.resolve()?;
        }
        Ok(reference)
    }

    /// Map path segments onto the ordered params. A leading-slash path
    /// supplies every field; a bare path supplies the terminal field alone,
    /// everything but the first, or every field. Missing leading fields are
    /// left unset for later resolution.
    fn fields_for_path(&self, text: &str) -> Result<Vec<Option<String>>, ResolveError> {
        let (collection, path) =
            split_collection_prefix(text).ok_or_else(|| ResolveError::InvalidResource {
                line: text.to_owned(),
            })?;

        if let Some(collection) = collection {
            if collection != self.schema.full_name {
                return Err(ResolveError::WrongResourceCollection {
                    expected: self.schema.full_name.clone(),
                    got: collection.to_owned(),
                    path: text.to_owned(),
                });
            }
        }

        let has_root = path.starts_with('/');
        let mut fields: Vec<&str> = path.split('/').collect();
        if has_root {
            // The first token is the empty segment before the slash.
            fields.remove(0);
        }

        let total = self.schema.ordered_params.len();
        if has_root && fields.len() != total {
            return Err(ResolveError::wrong_field_number(
                path,
                &self.schema.ordered_params,
            ));
        }
        if fields.len() > total {
            return Err(ResolveError::wrong_field_number(
                path,
                &self.schema.ordered_params,
            ));
        }
        if !has_root && fields.len() != 1 && fields.len() + 1 != total && fields.len() != total {
            return Err(ResolveError::wrong_field_number(
                path,
                &self.schema.ordered_params,
            ));
        }
        if fields.iter().any(|field| field.is_empty()) {
            // A literal empty segment is ambiguous, not a wildcard.
            return Err(ResolveError::wrong_field_number(
                path,
                &self.schema.ordered_params,
            ));
        }

        let missing = total - fields.len();
        let mut values = vec![None; missing];
        values.extend(fields.into_iter().map(|field| Some(field.to_owned())));
        Ok(values)
    }
}

impl fmt::Display for CollectionParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = String::new();
        for param in &self.schema.ordered_params {
            path = format!("[{path}]/{param}");
        }
        write!(f, "[{}::]{}", self.schema.full_name, path)
    }
}
