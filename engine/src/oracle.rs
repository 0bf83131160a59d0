//! Authorization oracle contract and decision records.

use nestauth_core::{ActionVerb, Entity, EntityKey};
use std::collections::HashSet;
use std::fmt;

/// Attribute names an actor may set for a verb on an entity.
///
/// Nested association keys (`<name>_attributes`) may appear in it too; they
/// gate recursion when implicit nested associations are disabled.
pub type AllowList = HashSet<String>;

/// Externally supplied authorization policy.
///
/// Both methods must be pure with respect to the engine: answers may depend on
/// the entity's current (possibly already mutated) attributes, and the engine
/// relies on this to run a second check after assignment.
pub trait AuthorizationOracle<A: ?Sized> {
    /// May `actor` perform `verb` on `entity` in its current state?
    fn authorize(&self, actor: &A, verb: &ActionVerb, entity: &Entity) -> bool;

    /// Attributes `actor` may set when performing `verb` on `entity`.
    fn permitted_attributes(&self, actor: &A, verb: &ActionVerb, entity: &Entity) -> AllowList;
}

impl<A: ?Sized, O: AuthorizationOracle<A> + ?Sized> AuthorizationOracle<A> for &O {
    fn authorize(&self, actor: &A, verb: &ActionVerb, entity: &Entity) -> bool {
        (**self).authorize(actor, verb, entity)
    }

    fn permitted_attributes(&self, actor: &A, verb: &ActionVerb, entity: &Entity) -> AllowList {
        (**self).permitted_attributes(actor, verb, entity)
    }
}

/// When an authorization check runs relative to the node's mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckPhase {
    /// Against the entity as found (or freshly instantiated).
    BeforeMutation,
    /// Against the entity with sanitized attributes and children applied.
    AfterMutation,
}

impl fmt::Display for CheckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckPhase::BeforeMutation => write!(f, "before mutation"),
            CheckPhase::AfterMutation => write!(f, "after mutation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Authorized,
    Denied,
}

/// One authorization check made during an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub verb: ActionVerb,
    /// Type name of the checked entity.
    pub entity_type: String,
    /// Key of the checked entity, `None` while it is new.
    pub key: Option<EntityKey>,
    pub phase: CheckPhase,
}

impl Decision {
    pub fn is_denied(&self) -> bool {
        self.verdict == Verdict::Denied
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match self.verdict {
            Verdict::Authorized => "authorized",
            Verdict::Denied => "denied",
        };
        write!(f, "{} {} {}", verdict, self.verb, self.entity_type)?;
        if let Some(key) = self.key {
            write!(f, " {}", key)?;
        }
        write!(f, " ({})", self.phase)
    }
}
