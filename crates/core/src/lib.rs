pub mod error;
pub mod model;
pub mod resolver;

pub use error::{Error, RegistryError, ResolveError, Result};
pub use model::catalog::{ApiCatalog, CatalogError};
pub use model::collection::CollectionSchema;
pub use resolver::defaults::{DefaultResolverTable, Resolver, ResolverContext};
pub use resolver::reference::Reference;
pub use resolver::registry::{Registry, STORAGE_BUCKETS, STORAGE_OBJECTS};
