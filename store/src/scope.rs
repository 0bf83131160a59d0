//! Scope guard.

use tracing::warn;

use crate::{ScopeHandle, StoreResult, TransactionalStore};

/// An open scope that aborts itself unless explicitly committed.
///
/// Early returns and `?` propagation therefore always roll back whatever was
/// written under the scope. Nested scopes are opened through [`Scope::store`].
pub struct Scope<'s, S: TransactionalStore + ?Sized> {
    store: &'s mut S,
    handle: Option<ScopeHandle>,
}

impl<'s, S: TransactionalStore + ?Sized> Scope<'s, S> {
    /// Open a scope on `store`.
    pub fn begin(store: &'s mut S) -> StoreResult<Self> {
        let handle = store.begin_scope()?;
        Ok(Self {
            store,
            handle: Some(handle),
        })
    }

    /// The store, for work done under this scope.
    pub fn store(&mut self) -> &mut S {
        &mut *self.store
    }

    /// Keep the writes made under this scope.
    pub fn commit(mut self) -> StoreResult<()> {
        match self.handle.take() {
            Some(handle) => self.store.commit(handle),
            None => Ok(()),
        }
    }

    /// Undo the writes made under this scope.
    pub fn abort(mut self) -> StoreResult<()> {
        match self.handle.take() {
            Some(handle) => self.store.abort(handle),
            None => Ok(()),
        }
    }
}

impl<S: TransactionalStore + ?Sized> Drop for Scope<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.store.abort(handle) {
                warn!(scope = %handle, error = %e, "abort on scope exit failed");
            }
        }
    }
}
