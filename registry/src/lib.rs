//! nestauth Registry
//!
//! Runtime schema lookup. Single source of truth for entity types and their
//! nested association tables, declared up front instead of discovered at
//! call time. The registry is immutable after construction via RegistryBuilder.

mod builder;
mod registry;
mod types;

pub use builder::{RegistryBuilder, RegistryError, TypeBuilder};
pub use registry::Registry;
pub use types::*;
