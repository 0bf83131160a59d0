//! nestauth Engine
//!
//! Apply a nested tree of proposed changes to an entity graph, keeping only
//! what the acting principal may change.
//!
//! Responsibilities:
//! - Walk the proposed tree depth-first, one frame per entity
//! - Derive the verb of every nested child (create / update / destroy)
//! - Authorize each entity before and after its mutation
//! - Sanitize proposed attributes against the oracle's allow-list
//! - Scope every node's writes so a late denial rolls back exactly that node
//!
//! # Module Structure
//!
//! - `engine` - The `AssignmentEngine` and its per-node protocol
//! - `oracle` - The `AuthorizationOracle` contract and `Decision` records
//! - `sanitize` - Allow-list filtering of attribute bags
//! - `proposed` - The proposed change tree and its JSON params conversion
//! - `config` - Engine options
//! - `outcome` - Result types for completed operations
//! - `error` - Error types for denied or malformed operations

mod config;
mod engine;
mod error;
mod oracle;
mod outcome;
mod proposed;
mod sanitize;

pub use config::Config;
pub use engine::AssignmentEngine;
pub use error::{EngineError, EngineResult, StructuralViolation};
pub use oracle::{AllowList, AuthorizationOracle, CheckPhase, Decision, Verdict};
pub use outcome::Outcome;
pub use proposed::{is_truthy_marker, ProposedNode, ProposedValue, DESTROY_MARKER};
pub use sanitize::{assignable, sanitize};
