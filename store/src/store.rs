//! The transactional store contract.

use nestauth_core::{Entity, EntityKey};
use nestauth_registry::AssociationDescriptor;
use std::fmt;

use crate::StoreResult;

/// Handle to an open scope.
///
/// Scopes nest; only the innermost open scope may be committed or aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeHandle {
    /// Store-unique scope identifier.
    pub id: u64,
    /// Nesting depth, 0 for the outermost scope.
    pub depth: usize,
}

impl fmt::Display for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope{}@{}", self.id, self.depth)
    }
}

/// A store offering scoped atomic mutation of an entity graph.
///
/// Committing a nested scope folds its writes into the enclosing scope, so
/// aborting the enclosing scope still undoes them. Only committing the
/// outermost scope makes writes durable.
pub trait TransactionalStore {
    /// Open a scope nested inside the current one (or an outermost scope).
    fn begin_scope(&mut self) -> StoreResult<ScopeHandle>;

    /// Close a scope, keeping its writes.
    fn commit(&mut self, scope: ScopeHandle) -> StoreResult<()>;

    /// Close a scope, undoing every write made under it.
    fn abort(&mut self, scope: ScopeHandle) -> StoreResult<()>;

    /// Look up `key` among the current members of `parent`'s association.
    ///
    /// The search never leaves the association: an entity that exists but is
    /// not a member resolves to `None`. A found entity comes with the members
    /// of its own associations.
    fn find_in_association(
        &self,
        parent: &Entity,
        association: &str,
        key: EntityKey,
    ) -> StoreResult<Option<Entity>>;

    /// Instantiate a new, uncommitted child for an association.
    ///
    /// The child is not attached to the parent; attaching is the caller's job.
    fn create_child(
        &mut self,
        parent: &Entity,
        association: &AssociationDescriptor,
    ) -> StoreResult<Entity>;

    /// Unlink `child` from `parent`'s association and delete it.
    fn remove_from_association(
        &mut self,
        parent: &Entity,
        association: &str,
        child: &Entity,
    ) -> StoreResult<()>;

    /// Write `root` and every child attached to it, assigning keys to new
    /// entities and linking attached children into their associations.
    fn persist(&mut self, root: &mut Entity) -> StoreResult<()>;
}
