//! Resource reference resolution engine.
//!
//! This module turns human- or program-supplied identifiers — bare names,
//! hierarchical path shorthand, or full URLs — into structured references
//! against the registered collection schemas.
//!
//! # Example
//!
//! ```ignore
//! use atlas_core::resolver::registry::Registry;
//!
//! let mut registry = Registry::new(catalog);
//! let reference = registry.parse(Some("svc.projects.widgets::myproj/mywidget"), context, None, true, true)?;
//! assert_eq!(reference.collection(), "svc.projects.widgets");
//! ```

pub mod defaults;
mod endpoint;
pub mod path;
pub mod reference;
pub mod registry;
pub mod template;
pub mod trie;
