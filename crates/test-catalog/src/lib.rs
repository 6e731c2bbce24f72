//! Test-support implementations of the `ApiCatalog` seam: an in-memory
//! builder, a YAML/JSON catalog-file loader, and a shared sample catalog.

pub mod catalog;
pub mod errors;
pub mod loader;

pub use catalog::*;
pub use loader::*;
