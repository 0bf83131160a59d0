//! nestauth Store
//!
//! The transactional store the assignment engine mutates through.
//!
//! Responsibilities:
//! - Define the `TransactionalStore` contract (scopes, lookup within an
//!   association, child creation, removal, cascading persist)
//! - Close scopes on every exit path via the `Scope` guard
//! - Provide `MemoryStore`, an in-memory implementation whose nested scopes
//!   undo exactly what they wrote
//!
//! # Module Structure
//!
//! - `store` - The `TransactionalStore` trait and scope handles
//! - `scope` - Abort-on-drop scope guard
//! - `memory` - In-memory store with per-scope undo journals
//! - `error` - Error types for store failures

mod error;
mod memory;
mod scope;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, Record};
pub use scope::Scope;
pub use store::{ScopeHandle, TransactionalStore};
