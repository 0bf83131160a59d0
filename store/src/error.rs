//! Store error types.

use nestauth_core::{EntityKey, TypeId};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write was attempted with no scope open.
    #[error("no scope is active")]
    NoActiveScope,

    /// A scope was closed while an inner scope was still open.
    #[error("scope {got} closed out of order (innermost open scope is {expected:?})")]
    ScopeOutOfOrder { expected: Option<u64>, got: u64 },

    /// Entity not found.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityKey),

    /// Association not declared for the entity's type.
    #[error("unknown association {association} on type {type_id}")]
    UnknownAssociation { type_id: TypeId, association: String },

    /// Backend-specific failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn scope_out_of_order(expected: Option<u64>, got: u64) -> Self {
        Self::ScopeOutOfOrder { expected, got }
    }

    pub fn unknown_association(type_id: TypeId, association: impl Into<String>) -> Self {
        Self::UnknownAssociation {
            type_id,
            association: association.into(),
        }
    }
}
