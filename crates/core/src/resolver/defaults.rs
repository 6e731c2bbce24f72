//! Parameter-fallback resolvers and the default-resolver table.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RegistryError;

/// A value source for a parameter not supplied explicitly: either a literal,
/// or a deferred lookup evaluated at resolution time. A `Func` returning
/// `None` means "no value available" and is never an error.
#[derive(Clone)]
pub enum Resolver {
    Literal(String),
    Func(Rc<dyn Fn() -> Option<String>>),
}

impl Resolver {
    pub fn literal(value: impl Into<String>) -> Self {
        Resolver::Literal(value.into())
    }

    pub fn func(f: impl Fn() -> Option<String> + 'static) -> Self {
        Resolver::Func(Rc::new(f))
    }

    pub fn resolve(&self) -> Option<String> {
        match self {
            Resolver::Literal(value) => Some(value.clone()),
            Resolver::Func(f) => f(),
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Resolver::Func(_) => f.write_str("Func"),
        }
    }
}

impl From<&str> for Resolver {
    fn from(value: &str) -> Self {
        Resolver::Literal(value.to_owned())
    }
}

impl From<String> for Resolver {
    fn from(value: String) -> Self {
        Resolver::Literal(value)
    }
}

/// Resolvers supplied at parse time, keyed by parameter name.
pub type ResolverContext = HashMap<String, Resolver>;

/// Registered fallbacks keyed by (param, api, collection-or-wildcard).
/// A `None` collection key matches every collection of the API.
#[derive(Debug, Clone, Default)]
pub struct DefaultResolverTable {
    by_param: HashMap<String, HashMap<String, HashMap<Option<String>, Resolver>>>,
}

impl DefaultResolverTable {
    pub fn set(
        &mut self,
        api: &str,
        collection: Option<&str>,
        param: &str,
        resolver: Resolver,
    ) -> Result<(), RegistryError> {
        if api.is_empty() {
            return Err(RegistryError::InvalidDefault {
                reason: "api cannot be empty".to_string(),
            });
        }
        if param.is_empty() {
            return Err(RegistryError::InvalidDefault {
                reason: "param cannot be empty".to_string(),
            });
        }
        self.by_param
            .entry(param.to_owned())
            .or_default()
            .entry(api.to_owned())
            .or_default()
            .insert(collection.map(str::to_owned), resolver);
        Ok(())
    }

    /// Collection-specific entry wins over the wildcard; absence of both is
    /// "no default", not an error.
    pub fn get(&self, api: &str, collection: &str, param: &str) -> Option<&Resolver> {
        let by_collection = self.by_param.get(param)?.get(api)?;
        by_collection
            .get(&Some(collection.to_owned()))
            .or_else(|| by_collection.get(&None))
    }
}
