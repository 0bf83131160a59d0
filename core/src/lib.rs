//! nestauth Core Types
//!
//! This crate provides the foundational types used throughout nestauth:
//! - Identity types (EntityKey, TypeId)
//! - Value types (the Value enum and the Attributes bag)
//! - The in-memory Entity with its attached association children
//! - Action verbs (ActionVerb)

mod entity;
mod id;
mod value;
mod verb;

pub use entity::*;
pub use id::*;
pub use value::*;
pub use verb::*;
