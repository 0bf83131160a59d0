//! Schema definition types.

use nestauth_core::TypeId;
use std::collections::HashMap;

/// Suffix that marks a proposed field key as a nested association.
pub const NESTED_KEY_SUFFIX: &str = "_attributes";

/// Default identity attribute name.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Build the proposed field key for an association (`vehicles` -> `vehicles_attributes`).
pub fn nested_key(association: &str) -> String {
    format!("{association}{NESTED_KEY_SUFFIX}")
}

/// Strip the nested marker from a field key, if present.
pub fn association_name(field_key: &str) -> Option<&str> {
    field_key
        .strip_suffix(NESTED_KEY_SUFFIX)
        .filter(|name| !name.is_empty())
}

/// How many children an association holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one child (has_one / belongs_to).
    Singular,
    /// An ordered collection of children (has_many).
    Collection,
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cardinality::Singular => write!(f, "singular"),
            Cardinality::Collection => write!(f, "collection"),
        }
    }
}

/// Association as declared, before the target type is resolved.
#[derive(Debug, Clone)]
pub struct AssociationDef {
    /// Association name.
    pub name: String,
    /// Name of the child entity type.
    pub target: String,
    /// Cardinality.
    pub cardinality: Cardinality,
    /// Whether children may be removed through this association.
    pub allow_destroy: bool,
}

impl AssociationDef {
    pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Collection,
            allow_destroy: false,
        }
    }

    pub fn has_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::Singular,
            allow_destroy: false,
        }
    }

    pub fn allow_destroy(mut self) -> Self {
        self.allow_destroy = true;
        self
    }
}

/// A resolved association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDescriptor {
    /// Association name.
    pub name: String,
    /// Cardinality.
    pub cardinality: Cardinality,
    /// Child entity type.
    pub child_type: TypeId,
    /// Whether a removal action is permitted for this association at all.
    pub allow_destroy: bool,
    /// Proposed field key that addresses this association.
    pub param_key: String,
}

/// Entity type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Unique identifier.
    pub id: TypeId,
    /// Type name.
    pub name: String,
    /// Identity attribute name in proposed input.
    pub primary_key: String,
    /// Key the type's params are nested under (e.g. `user`).
    pub resource_key: String,
    /// Associations in declaration order.
    pub associations: Vec<AssociationDescriptor>,
    /// Association index by proposed field key.
    pub(crate) by_param_key: HashMap<String, usize>,
}

impl TypeDef {
    /// Get an association by name.
    pub fn association(&self, name: &str) -> Option<&AssociationDescriptor> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Get an association by its proposed field key.
    pub fn association_for_key(&self, field_key: &str) -> Option<&AssociationDescriptor> {
        self.by_param_key
            .get(field_key)
            .and_then(|&i| self.associations.get(i))
    }

    /// All proposed field keys that denote nested associations.
    pub fn nested_keys(&self) -> impl Iterator<Item = &str> {
        self.associations.iter().map(|a| a.param_key.as_str())
    }
}

/// Snake-case a type name for use as a resource key (`PartBrand` -> `part_brand`).
pub fn resource_key_for(type_name: &str) -> String {
    let mut key = String::with_capacity(type_name.len() + 4);
    for (i, ch) in type_name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                key.push('_');
            }
            key.extend(ch.to_lowercase());
        } else {
            key.push(ch);
        }
    }
    key
}
