//! In-memory transactional store.
//!
//! Writes are applied directly to the record map and journaled in the
//! innermost open scope for potential rollback. Committing a nested scope
//! hands its journal to the enclosing scope; aborting replays the journal in
//! reverse. This is appropriate for a single-writer model.

use nestauth_core::{Attributes, Entity, EntityKey, TypeId};
use nestauth_registry::{AssociationDescriptor, Cardinality, Registry};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

use crate::{ScopeHandle, StoreError, StoreResult, TransactionalStore};

/// A stored entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Entity type.
    pub type_id: TypeId,
    /// Attribute values.
    pub attributes: Attributes,
    /// Association members by association name.
    pub members: BTreeMap<String, Vec<EntityKey>>,
}

impl Record {
    pub fn new(type_id: TypeId, attributes: Attributes) -> Self {
        Self {
            type_id,
            attributes,
            members: BTreeMap::new(),
        }
    }
}

/// Previous state of one record, captured before a write.
#[derive(Debug, Clone)]
struct UndoEntry {
    key: EntityKey,
    previous: Option<Record>,
}

/// An open scope.
#[derive(Debug)]
struct Frame {
    handle: ScopeHandle,
    journal: Vec<UndoEntry>,
    /// Key allocator position when the scope opened.
    next_key: u64,
}

/// In-memory store backed by a record map.
#[derive(Debug)]
pub struct MemoryStore<'r> {
    registry: &'r Registry,
    records: BTreeMap<EntityKey, Record>,
    next_key: u64,
    frames: Vec<Frame>,
    next_scope_id: u64,
}

impl<'r> MemoryStore<'r> {
    /// Create an empty store.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            records: BTreeMap::new(),
            next_key: 1,
            frames: Vec::new(),
            next_scope_id: 1,
        }
    }

    // ==================== Direct Access ====================

    /// Insert a record. Journaled when a scope is open.
    pub fn insert(&mut self, type_id: TypeId, attributes: Attributes) -> EntityKey {
        let key = self.allocate_key();
        self.write(key, Some(Record::new(type_id, attributes)));
        key
    }

    /// Link `child` into `parent`'s association. Journaled when a scope is open.
    pub fn link(&mut self, parent: EntityKey, association: &str, child: EntityKey) -> StoreResult<()> {
        if !self.records.contains_key(&child) {
            return Err(StoreError::EntityNotFound(child));
        }
        let mut record = self
            .records
            .get(&parent)
            .cloned()
            .ok_or(StoreError::EntityNotFound(parent))?;
        let descriptor = self.descriptor(record.type_id, association)?;
        let members = record.members.entry(association.to_string()).or_default();
        match descriptor.cardinality {
            Cardinality::Singular => *members = vec![child],
            Cardinality::Collection => {
                if !members.contains(&child) {
                    members.push(child);
                }
            }
        }
        self.write(parent, Some(record));
        Ok(())
    }

    /// Load an entity together with the members of its associations,
    /// recursively.
    pub fn load(&self, key: EntityKey) -> Option<Entity> {
        self.load_tree(key, &mut HashSet::new())
    }

    /// Get a record.
    pub fn get(&self, key: EntityKey) -> Option<&Record> {
        self.records.get(&key)
    }

    /// Current members of an association.
    pub fn members(&self, key: EntityKey, association: &str) -> &[EntityKey] {
        self.records
            .get(&key)
            .and_then(|r| r.members.get(association))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keys of all records of a type whose attribute equals `value`.
    pub fn find_by_attr(
        &self,
        type_id: TypeId,
        attr: &str,
        value: &nestauth_core::Value,
    ) -> Vec<EntityKey> {
        self.records
            .iter()
            .filter(|(_, r)| r.type_id == type_id && r.attributes.get(attr) == Some(value))
            .map(|(k, _)| *k)
            .collect()
    }

    /// Copy of every record, for comparing store states.
    pub fn snapshot(&self) -> BTreeMap<EntityKey, Record> {
        self.records.clone()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of open scopes.
    pub fn scope_depth(&self) -> usize {
        self.frames.len()
    }

    // ==================== Internals ====================

    fn allocate_key(&mut self) -> EntityKey {
        let key = EntityKey::new(self.next_key);
        self.next_key += 1;
        key
    }

    fn descriptor(&self, type_id: TypeId, association: &str) -> StoreResult<&'r AssociationDescriptor> {
        let registry: &'r Registry = self.registry;
        registry
            .association(type_id, association)
            .ok()
            .flatten()
            .ok_or_else(|| StoreError::unknown_association(type_id, association))
    }

    fn require_scope(&self) -> StoreResult<()> {
        if self.frames.is_empty() {
            return Err(StoreError::NoActiveScope);
        }
        Ok(())
    }

    fn innermost(&self, handle: ScopeHandle) -> StoreResult<()> {
        match self.frames.last() {
            Some(frame) if frame.handle == handle => Ok(()),
            other => Err(StoreError::scope_out_of_order(
                other.map(|f| f.handle.id),
                handle.id,
            )),
        }
    }

    /// Replace (or remove) a record, journaling its previous state.
    fn write(&mut self, key: EntityKey, value: Option<Record>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.journal.push(UndoEntry {
                key,
                previous: self.records.get(&key).cloned(),
            });
        }
        match value {
            Some(record) => {
                self.records.insert(key, record);
            }
            None => {
                self.records.remove(&key);
            }
        }
    }

    /// A record already on the current path is loaded without its members.
    fn load_tree(&self, key: EntityKey, path: &mut HashSet<EntityKey>) -> Option<Entity> {
        let record = self.records.get(&key)?;
        let mut entity = Entity::existing(key, record.type_id, record.attributes.clone());
        if path.insert(key) {
            for (association, members) in &record.members {
                for member in members {
                    if let Some(child) = self.load_tree(*member, path) {
                        entity.attach(association.as_str(), child);
                    }
                }
            }
            path.remove(&key);
        }
        Some(entity)
    }

    /// Delete a record and every record it owns through its associations.
    fn delete_cascade(&mut self, key: EntityKey, visited: &mut HashSet<EntityKey>) {
        if !visited.insert(key) {
            return;
        }
        let owned: Vec<EntityKey> = match self.records.get(&key) {
            Some(record) => record.members.values().flatten().copied().collect(),
            None => return,
        };
        for child in owned {
            self.delete_cascade(child, visited);
        }
        trace!(%key, "deleting record");
        self.write(key, None);
    }

    fn persist_entity(&mut self, entity: &mut Entity) -> StoreResult<EntityKey> {
        let key = match entity.key {
            Some(key) => {
                let mut record = self
                    .records
                    .get(&key)
                    .cloned()
                    .ok_or(StoreError::EntityNotFound(key))?;
                record.attributes = entity.attributes.clone();
                self.write(key, Some(record));
                key
            }
            None => {
                let key = self.allocate_key();
                self.write(key, Some(Record::new(entity.type_id, entity.attributes.clone())));
                entity.key = Some(key);
                key
            }
        };

        let type_id = entity.type_id;
        for (association, children) in entity.associations.iter_mut() {
            let descriptor = self.descriptor(type_id, association)?;
            let mut child_keys = Vec::with_capacity(children.len());
            for child in children.iter_mut() {
                child_keys.push(self.persist_entity(child)?);
            }
            if child_keys.is_empty() {
                continue;
            }

            let mut record = self
                .records
                .get(&key)
                .cloned()
                .ok_or(StoreError::EntityNotFound(key))?;
            let members = record.members.entry(association.clone()).or_default();
            match descriptor.cardinality {
                Cardinality::Singular => *members = child_keys.last().copied().into_iter().collect(),
                Cardinality::Collection => {
                    for child_key in child_keys {
                        if !members.contains(&child_key) {
                            members.push(child_key);
                        }
                    }
                }
            }
            self.write(key, Some(record));
        }

        Ok(key)
    }
}

impl TransactionalStore for MemoryStore<'_> {
    fn begin_scope(&mut self) -> StoreResult<ScopeHandle> {
        let handle = ScopeHandle {
            id: self.next_scope_id,
            depth: self.frames.len(),
        };
        self.next_scope_id += 1;
        self.frames.push(Frame {
            handle,
            journal: Vec::new(),
            next_key: self.next_key,
        });
        debug!(scope = %handle, "scope opened");
        Ok(handle)
    }

    fn commit(&mut self, scope: ScopeHandle) -> StoreResult<()> {
        self.innermost(scope)?;
        let Some(frame) = self.frames.pop() else {
            return Err(StoreError::NoActiveScope);
        };
        let writes = frame.journal.len();
        if let Some(parent) = self.frames.last_mut() {
            parent.journal.extend(frame.journal);
        }
        debug!(%scope, writes, "scope committed");
        Ok(())
    }

    fn abort(&mut self, scope: ScopeHandle) -> StoreResult<()> {
        self.innermost(scope)?;
        let Some(frame) = self.frames.pop() else {
            return Err(StoreError::NoActiveScope);
        };
        let writes = frame.journal.len();
        for entry in frame.journal.into_iter().rev() {
            match entry.previous {
                Some(record) => {
                    self.records.insert(entry.key, record);
                }
                None => {
                    self.records.remove(&entry.key);
                }
            }
        }
        self.next_key = frame.next_key;
        debug!(%scope, writes, "scope aborted");
        Ok(())
    }

    fn find_in_association(
        &self,
        parent: &Entity,
        association: &str,
        key: EntityKey,
    ) -> StoreResult<Option<Entity>> {
        let Some(parent_key) = parent.key else {
            return Ok(None);
        };
        let record = self
            .records
            .get(&parent_key)
            .ok_or(StoreError::EntityNotFound(parent_key))?;
        let is_member = record
            .members
            .get(association)
            .is_some_and(|members| members.contains(&key));
        if !is_member {
            return Ok(None);
        }
        Ok(self.load(key))
    }

    fn create_child(
        &mut self,
        _parent: &Entity,
        association: &AssociationDescriptor,
    ) -> StoreResult<Entity> {
        Ok(Entity::new(association.child_type))
    }

    fn remove_from_association(
        &mut self,
        parent: &Entity,
        association: &str,
        child: &Entity,
    ) -> StoreResult<()> {
        self.require_scope()?;
        let Some(child_key) = child.key else {
            return Ok(());
        };
        if let Some(parent_key) = parent.key {
            if let Some(mut record) = self.records.get(&parent_key).cloned() {
                if let Some(members) = record.members.get_mut(association) {
                    members.retain(|k| *k != child_key);
                }
                self.write(parent_key, Some(record));
            }
        }
        self.delete_cascade(child_key, &mut HashSet::new());
        Ok(())
    }

    fn persist(&mut self, root: &mut Entity) -> StoreResult<()> {
        self.require_scope()?;
        self.persist_entity(root)?;
        Ok(())
    }
}
