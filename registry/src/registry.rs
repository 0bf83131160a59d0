//! The Registry - immutable schema lookup.

use crate::{association_name, AssociationDescriptor, RegistryError, TypeDef};
use nestauth_core::TypeId;
use std::collections::HashMap;

/// The Registry provides runtime lookup of entity types and their
/// association tables. It is immutable after construction.
#[derive(Debug)]
pub struct Registry {
    /// Type definitions by ID.
    types: HashMap<TypeId, TypeDef>,
    /// Type ID lookup by name.
    type_names: HashMap<String, TypeId>,
}

impl Registry {
    pub(crate) fn new(types: HashMap<TypeId, TypeDef>, type_names: HashMap<String, TypeId>) -> Self {
        Self { types, type_names }
    }

    // ==================== Type Lookups ====================

    /// Get a type definition by name.
    pub fn get_type_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.type_names.get(name).and_then(|id| self.types.get(id))
    }

    /// Get a type definition by ID.
    pub fn get_type(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(&id)
    }

    /// Get a type ID by name.
    pub fn get_type_id(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    /// Get a type definition, failing for unregistered IDs.
    pub fn expect_type(&self, id: TypeId) -> Result<&TypeDef, RegistryError> {
        self.types.get(&id).ok_or(RegistryError::UnknownType(id))
    }

    /// Get the name of a type, or its raw ID for unregistered types.
    pub fn type_name(&self, id: TypeId) -> String {
        match self.types.get(&id) {
            Some(def) => def.name.clone(),
            None => id.to_string(),
        }
    }

    // ==================== Association Resolution ====================

    /// Determine whether `field_key` addresses a nested association of `type_id`.
    ///
    /// Returns `Ok(None)` for plain attribute keys, including keys carrying the
    /// nested marker for an association the type does not declare; callers
    /// decide whether such a key is an error based on the shape of its value.
    pub fn resolve(
        &self,
        type_id: TypeId,
        field_key: &str,
    ) -> Result<Option<&AssociationDescriptor>, RegistryError> {
        let type_def = self.expect_type(type_id)?;
        if association_name(field_key).is_none() {
            return Ok(None);
        }
        Ok(type_def.association_for_key(field_key))
    }

    /// Get an association of a type by name.
    pub fn association(
        &self,
        type_id: TypeId,
        name: &str,
    ) -> Result<Option<&AssociationDescriptor>, RegistryError> {
        Ok(self.expect_type(type_id)?.association(name))
    }
}
