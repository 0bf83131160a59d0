//! Engine error types.

use nestauth_core::{ActionVerb, EntityKey, VerbError};
use nestauth_registry::{Cardinality, RegistryError};
use nestauth_store::StoreError;
use thiserror::Error;

use crate::{CheckPhase, Decision};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort an assignment operation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not authorized to {verb} {entity_type}{} ({phase})", describe_key(.key))]
    PermissionDenied {
        verb: ActionVerb,
        entity_type: String,
        key: Option<EntityKey>,
        phase: CheckPhase,
    },

    #[error(transparent)]
    Structural(#[from] StructuralViolation),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// The proposed tree is malformed with respect to the schema or the graph.
///
/// Never silenced.
#[derive(Debug, Error)]
pub enum StructuralViolation {
    #[error("Destroy requested on {entity_type}.{association}, which does not allow destroy")]
    DestroyNotAllowed {
        entity_type: String,
        association: String,
    },

    #[error("{child_type} {key} is not a member of {association}")]
    NotInAssociation {
        association: String,
        child_type: String,
        key: EntityKey,
    },

    #[error("Invalid identity for {association}: {value}")]
    InvalidIdentity { association: String, value: String },

    #[error("Unknown association key: {key} on type {entity_type}")]
    UnknownAssociation { entity_type: String, key: String },

    #[error("Shape mismatch for {association}: expected {expected} value")]
    ShapeMismatch {
        association: String,
        expected: Cardinality,
    },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("Missing resource key: {key}")]
    MissingResourceKey { key: String },

    #[error(transparent)]
    InvalidVerb(#[from] VerbError),

    #[error(transparent)]
    Schema(#[from] RegistryError),
}

fn describe_key(key: &Option<EntityKey>) -> String {
    key.map(|k| format!(" {}", k)).unwrap_or_default()
}

impl EngineError {
    /// Build the error raised for a denied decision.
    pub fn permission_denied(decision: Decision) -> Self {
        Self::PermissionDenied {
            verb: decision.verb,
            entity_type: decision.entity_type,
            key: decision.key,
            phase: decision.phase,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

impl From<RegistryError> for EngineError {
    fn from(e: RegistryError) -> Self {
        Self::Structural(StructuralViolation::Schema(e))
    }
}

impl From<VerbError> for EngineError {
    fn from(e: VerbError) -> Self {
        Self::Structural(StructuralViolation::InvalidVerb(e))
    }
}

impl StructuralViolation {
    pub fn destroy_not_allowed(entity_type: impl Into<String>, association: impl Into<String>) -> Self {
        Self::DestroyNotAllowed {
            entity_type: entity_type.into(),
            association: association.into(),
        }
    }

    pub fn not_in_association(
        association: impl Into<String>,
        child_type: impl Into<String>,
        key: EntityKey,
    ) -> Self {
        Self::NotInAssociation {
            association: association.into(),
            child_type: child_type.into(),
            key,
        }
    }

    pub fn invalid_identity(association: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            association: association.into(),
            value: value.into(),
        }
    }

    pub fn unknown_association(entity_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self::UnknownAssociation {
            entity_type: entity_type.into(),
            key: key.into(),
        }
    }

    pub fn shape_mismatch(association: impl Into<String>, expected: Cardinality) -> Self {
        Self::ShapeMismatch {
            association: association.into(),
            expected,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn missing_resource_key(key: impl Into<String>) -> Self {
        Self::MissingResourceKey { key: key.into() }
    }
}
