//! Operation outcomes.

use nestauth_core::Entity;

use crate::Decision;

/// Result of an assignment operation that did not fail.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The root was authorized in both phases and its changes were kept.
    Applied {
        entity: Entity,
        decisions: Vec<Decision>,
    },
    /// The root was denied with denials silenced. Nothing was kept.
    Denied {
        entity: Entity,
        denial: Decision,
        decisions: Vec<Decision>,
    },
}

impl Outcome {
    /// Returns true if the operation's changes were kept.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    /// The root entity as left by the operation.
    pub fn entity(&self) -> &Entity {
        match self {
            Outcome::Applied { entity, .. } | Outcome::Denied { entity, .. } => entity,
        }
    }

    /// Every authorization check made, in the order made.
    pub fn decisions(&self) -> &[Decision] {
        match self {
            Outcome::Applied { decisions, .. } | Outcome::Denied { decisions, .. } => decisions,
        }
    }

    /// The denial of the root, if the root was denied.
    pub fn denial(&self) -> Option<&Decision> {
        match self {
            Outcome::Denied { denial, .. } => Some(denial),
            Outcome::Applied { .. } => None,
        }
    }

    /// Denied checks, including those of children skipped under silencing.
    pub fn denials(&self) -> impl Iterator<Item = &Decision> {
        self.decisions().iter().filter(|d| d.is_denied())
    }
}
