//! RegistryBuilder for constructing an immutable Registry.

use crate::{
    nested_key, resource_key_for, AssociationDef, AssociationDescriptor, Registry, TypeDef,
    DEFAULT_PRIMARY_KEY,
};
use nestauth_core::TypeId;
use regex_lite::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// Identifiers used for association names, primary keys and resource keys.
const IDENTIFIER_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

/// Errors that can occur during registry construction and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate type name: {0}")]
    DuplicateTypeName(String),

    #[error("Duplicate association {association} on type {type_name}")]
    DuplicateAssociation {
        type_name: String,
        association: String,
    },

    #[error("Unknown target type {target} for association {association} on type {type_name}")]
    UnknownAssociationTarget {
        type_name: String,
        association: String,
        target: String,
    },

    #[error("Invalid identifier {name:?} on type {type_name}")]
    InvalidIdentifier { type_name: String, name: String },

    #[error("Invalid identifier pattern: {0}")]
    InvalidPattern(String),

    #[error("Unknown type: {0}")]
    UnknownType(TypeId),
}

/// A type waiting for its associations to be resolved.
#[derive(Debug)]
struct PendingType {
    id: TypeId,
    name: String,
    primary_key: String,
    resource_key: String,
    associations: Vec<AssociationDef>,
}

/// Builder for constructing an immutable Registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Next type ID to allocate.
    next_type_id: u32,
    /// Types being built.
    types: Vec<PendingType>,
    /// Type name to ID mapping.
    type_names: HashMap<String, TypeId>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type definition.
    pub fn add_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let name = name.into();
        let id = TypeId::new(self.next_type_id);
        self.next_type_id += 1;

        TypeBuilder {
            builder: self,
            id,
            resource_key: resource_key_for(&name),
            name,
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            associations: Vec::new(),
        }
    }

    /// Build the immutable Registry.
    ///
    /// Association targets are resolved here, so types may reference types
    /// declared after them.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let identifier =
            Regex::new(IDENTIFIER_PATTERN).map_err(|e| RegistryError::InvalidPattern(e.to_string()))?;

        let mut types = HashMap::with_capacity(self.types.len());
        for pending in self.types {
            for name in [&pending.primary_key, &pending.resource_key] {
                if !identifier.is_match(name) {
                    return Err(RegistryError::InvalidIdentifier {
                        type_name: pending.name.clone(),
                        name: name.clone(),
                    });
                }
            }

            let mut associations = Vec::with_capacity(pending.associations.len());
            let mut by_param_key = HashMap::new();
            for def in pending.associations {
                if !identifier.is_match(&def.name) {
                    return Err(RegistryError::InvalidIdentifier {
                        type_name: pending.name.clone(),
                        name: def.name,
                    });
                }
                let child_type = match self.type_names.get(&def.target) {
                    Some(&id) => id,
                    None => {
                        return Err(RegistryError::UnknownAssociationTarget {
                            type_name: pending.name.clone(),
                            association: def.name,
                            target: def.target,
                        })
                    }
                };
                let param_key = nested_key(&def.name);
                if by_param_key
                    .insert(param_key.clone(), associations.len())
                    .is_some()
                {
                    return Err(RegistryError::DuplicateAssociation {
                        type_name: pending.name.clone(),
                        association: def.name,
                    });
                }
                associations.push(AssociationDescriptor {
                    name: def.name,
                    cardinality: def.cardinality,
                    child_type,
                    allow_destroy: def.allow_destroy,
                    param_key,
                });
            }

            types.insert(
                pending.id,
                TypeDef {
                    id: pending.id,
                    name: pending.name,
                    primary_key: pending.primary_key,
                    resource_key: pending.resource_key,
                    associations,
                    by_param_key,
                },
            );
        }

        Ok(Registry::new(types, self.type_names))
    }
}

/// Builder for a type definition.
pub struct TypeBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    id: TypeId,
    name: String,
    primary_key: String,
    resource_key: String,
    associations: Vec<AssociationDef>,
}

impl<'a> TypeBuilder<'a> {
    /// Override the identity attribute name (default `id`).
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Override the params resource key (default: snake-cased type name).
    pub fn resource_key(mut self, key: impl Into<String>) -> Self {
        self.resource_key = key.into();
        self
    }

    /// Declare a nested association.
    pub fn association(mut self, def: AssociationDef) -> Self {
        self.associations.push(def);
        self
    }

    /// Finish building this type.
    pub fn done(self) -> Result<TypeId, RegistryError> {
        if self.builder.type_names.contains_key(&self.name) {
            return Err(RegistryError::DuplicateTypeName(self.name));
        }

        self.builder.type_names.insert(self.name.clone(), self.id);
        self.builder.types.push(PendingType {
            id: self.id,
            name: self.name,
            primary_key: self.primary_key,
            resource_key: self.resource_key,
            associations: self.associations,
        });

        Ok(self.id)
    }
}
