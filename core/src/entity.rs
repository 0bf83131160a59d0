//! In-memory entities.
//!
//! An entity is either loaded from a store (it has a key) or freshly
//! instantiated (no key yet). Association members are held in memory under
//! the association name and owned by the entity until the whole tree is
//! persisted.

use crate::{Attributes, EntityKey, TypeId, Value};
use std::collections::BTreeMap;

/// An entity and the members of its associations.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Persistent identity, absent for not-yet-created entities.
    pub key: Option<EntityKey>,
    /// Type of this entity (reference to registry).
    pub type_id: TypeId,
    /// Attribute values.
    pub attributes: Attributes,
    /// Association members by association name: whatever the store loaded,
    /// plus children attached during the current operation.
    pub associations: BTreeMap<String, Vec<Entity>>,
}

impl Entity {
    /// Instantiate a new, not yet persisted entity.
    pub fn new(type_id: TypeId) -> Self {
        Self {
            key: None,
            type_id,
            attributes: Attributes::new(),
            associations: BTreeMap::new(),
        }
    }

    /// Rebuild an entity that already exists in a store.
    pub fn existing(key: EntityKey, type_id: TypeId, attributes: Attributes) -> Self {
        Self {
            key: Some(key),
            type_id,
            attributes,
            associations: BTreeMap::new(),
        }
    }

    /// Returns true if this entity has never been persisted.
    pub fn is_new(&self) -> bool {
        self.key.is_none()
    }

    /// Get an attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Assign every attribute in the bag, overwriting existing values.
    pub fn assign(&mut self, attributes: Attributes) {
        self.attributes.extend(attributes);
    }

    /// Children attached under an association.
    pub fn children(&self, association: &str) -> &[Entity] {
        self.associations
            .get(association)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The child attached under a singular association, if any.
    pub fn child(&self, association: &str) -> Option<&Entity> {
        self.children(association).first()
    }

    /// Append a child to a collection association.
    pub fn attach(&mut self, association: impl Into<String>, child: Entity) {
        self.associations
            .entry(association.into())
            .or_default()
            .push(child);
    }

    /// Put a child back into a collection association, replacing the member
    /// with the same key in place. Children without a key are appended.
    pub fn upsert(&mut self, association: impl Into<String>, child: Entity) {
        let children = self.associations.entry(association.into()).or_default();
        let existing = child
            .key
            .and_then(|key| children.iter().position(|c| c.key == Some(key)));
        match existing {
            Some(position) => children[position] = child,
            None => children.push(child),
        }
    }

    /// Look up a member of an association by key.
    pub fn member(&self, association: &str, key: EntityKey) -> Option<&Entity> {
        self.children(association).iter().find(|c| c.key == Some(key))
    }

    /// Replace whatever is attached under a singular association.
    pub fn replace(&mut self, association: impl Into<String>, child: Entity) {
        self.associations.insert(association.into(), vec![child]);
    }

    /// Detach a previously attached child by key.
    pub fn detach(&mut self, association: &str, key: EntityKey) -> Option<Entity> {
        let children = self.associations.get_mut(association)?;
        let position = children.iter().position(|c| c.key == Some(key))?;
        Some(children.remove(position))
    }
}
