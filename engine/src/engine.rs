//! Assignment engine - authorized nested assignment over an entity tree.
//!
//! Every node of the proposed tree goes through the same protocol:
//! 1. authorize against the entity as found
//! 2. sanitize and assign attributes
//! 3. recurse into nested associations, deriving each child's verb
//! 4. authorize again against the mutated entity
//!
//! Steps 2-4 run under a scope of their own, so a denial in step 4 rolls back
//! exactly that node and its descendants.

use nestauth_core::{ActionVerb, Entity};
use nestauth_registry::{AssociationDescriptor, Cardinality, Registry, TypeDef};
use nestauth_store::{Scope, TransactionalStore};
use tracing::{debug, debug_span, trace};

use crate::{
    assignable, AuthorizationOracle, CheckPhase, Config, Decision, EngineError, EngineResult,
    Outcome, ProposedNode, ProposedValue, StructuralViolation, Verdict,
};

/// Applies proposed trees under an authorization oracle.
pub struct AssignmentEngine<'a, O: ?Sized> {
    registry: &'a Registry,
    oracle: &'a O,
    config: Config,
}

impl<'a, O: ?Sized> AssignmentEngine<'a, O> {
    /// Create an engine with the default configuration.
    pub fn new(registry: &'a Registry, oracle: &'a O) -> Self {
        Self {
            registry,
            oracle,
            config: Config::default(),
        }
    }

    /// Replace the configuration used by [`AssignmentEngine::apply`].
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Apply `proposed` to `root` as `actor` performing `verb`, with the
    /// engine's configuration.
    pub fn apply<A, S>(
        &self,
        store: &mut S,
        actor: &A,
        verb: ActionVerb,
        root: Entity,
        proposed: &ProposedNode,
    ) -> EngineResult<Outcome>
    where
        A: ?Sized,
        S: TransactionalStore + ?Sized,
        O: AuthorizationOracle<A>,
    {
        self.apply_with(self.config, store, actor, verb, root, proposed)
    }

    /// Apply `proposed` to `root` with a per-call configuration.
    ///
    /// Runs under one outer scope. On success the root and every attached
    /// child are persisted and the scope is committed. A silenced root denial
    /// aborts the scope and returns [`Outcome::Denied`]; any error aborts the
    /// scope before it is returned.
    pub fn apply_with<A, S>(
        &self,
        config: Config,
        store: &mut S,
        actor: &A,
        verb: ActionVerb,
        mut root: Entity,
        proposed: &ProposedNode,
    ) -> EngineResult<Outcome>
    where
        A: ?Sized,
        S: TransactionalStore + ?Sized,
        O: AuthorizationOracle<A>,
    {
        let mut walk = Walk {
            registry: self.registry,
            oracle: self.oracle,
            actor,
            config,
            decisions: Vec::new(),
        };

        let mut scope = Scope::begin(store)?;
        match walk.process_node(scope.store(), &verb, &mut root, proposed)? {
            NodeOutcome::Applied => {
                scope.store().persist(&mut root)?;
                scope.commit()?;
                debug!(%verb, key = ?root.key, checks = walk.decisions.len(), "operation applied");
                Ok(Outcome::Applied {
                    entity: root,
                    decisions: walk.decisions,
                })
            }
            NodeOutcome::Skipped(denial) => {
                scope.abort()?;
                debug!(%denial, "operation denied");
                Ok(Outcome::Denied {
                    entity: root,
                    denial,
                    decisions: walk.decisions,
                })
            }
        }
    }
}

/// How a node ended when it did not fail.
enum NodeOutcome {
    Applied,
    /// Denied with denials silenced.
    Skipped(Decision),
}

/// State of one operation.
struct Walk<'a, A: ?Sized, O: ?Sized> {
    registry: &'a Registry,
    oracle: &'a O,
    actor: &'a A,
    config: Config,
    decisions: Vec<Decision>,
}

impl<'a, A, O> Walk<'a, A, O>
where
    A: ?Sized,
    O: AuthorizationOracle<A> + ?Sized,
{
    fn process_node<S: TransactionalStore + ?Sized>(
        &mut self,
        store: &mut S,
        verb: &ActionVerb,
        entity: &mut Entity,
        node: &ProposedNode,
    ) -> EngineResult<NodeOutcome> {
        let registry = self.registry;
        let type_def = registry.expect_type(entity.type_id)?;
        let _span = debug_span!("node", entity_type = %type_def.name, %verb, key = ?entity.key).entered();

        let pre = self.check(verb, entity, type_def, CheckPhase::BeforeMutation);
        if pre.is_denied() {
            return self.deny(pre);
        }

        let snapshot = entity.clone();
        let mut scope = Scope::begin(store)?;

        let allow_list = self.oracle.permitted_attributes(self.actor, verb, entity);
        let attributes = assignable(node, type_def, &allow_list);
        for (key, _) in node.scalars() {
            if !attributes.contains_key(key) {
                trace!(key, "attribute not assigned");
            }
        }
        entity.assign(attributes);

        for (key, value) in node.fields() {
            let Some(descriptor) = registry.resolve(entity.type_id, key)? else {
                if value.is_nested() {
                    return Err(StructuralViolation::unknown_association(&type_def.name, key).into());
                }
                continue;
            };
            if !self.config.implicitly_allow_nested_associations && !allow_list.contains(key) {
                trace!(key, "nested association not permitted");
                continue;
            }
            match (descriptor.cardinality, value) {
                (Cardinality::Collection, ProposedValue::Many(children)) => {
                    for child in children {
                        self.process_child(scope.store(), entity, descriptor, child)?;
                    }
                }
                (Cardinality::Singular, ProposedValue::One(child)) => {
                    self.process_child(scope.store(), entity, descriptor, child)?;
                }
                (_, ProposedValue::Scalar(v)) if v.is_null() => {}
                (cardinality, _) => {
                    return Err(StructuralViolation::shape_mismatch(&descriptor.name, cardinality).into());
                }
            }
        }

        let post = self.check(verb, entity, type_def, CheckPhase::AfterMutation);
        if post.is_denied() {
            scope.abort()?;
            *entity = snapshot;
            return self.deny(post);
        }

        scope.commit()?;
        Ok(NodeOutcome::Applied)
    }

    fn process_child<S: TransactionalStore + ?Sized>(
        &mut self,
        store: &mut S,
        parent: &mut Entity,
        descriptor: &AssociationDescriptor,
        node: &ProposedNode,
    ) -> EngineResult<()> {
        let registry = self.registry;
        let parent_def = registry.expect_type(parent.type_id)?;
        let child_def = registry.expect_type(descriptor.child_type)?;

        let destroy = node.destroy_requested();
        if destroy && !descriptor.allow_destroy {
            return Err(StructuralViolation::destroy_not_allowed(&parent_def.name, &descriptor.name).into());
        }

        // An in-memory member carries earlier entries for the same identity.
        let mut child = match node.identity(&child_def.primary_key, &descriptor.name)? {
            Some(key) => match parent.member(&descriptor.name, key) {
                Some(member) => member.clone(),
                None => store
                    .find_in_association(parent, &descriptor.name, key)?
                    .ok_or_else(|| StructuralViolation::not_in_association(&descriptor.name, &child_def.name, key))?,
            },
            None => store.create_child(parent, descriptor)?,
        };

        let verb = if destroy {
            ActionVerb::Destroy
        } else if child.is_new() {
            ActionVerb::Create
        } else {
            ActionVerb::Update
        };
        debug!(association = %descriptor.name, %verb, key = ?child.key, "child action derived");

        if verb == ActionVerb::Destroy {
            return self.destroy_child(store, parent, descriptor, child_def, child);
        }

        match self.process_node(store, &verb, &mut child, node)? {
            NodeOutcome::Applied => match descriptor.cardinality {
                Cardinality::Collection => parent.upsert(descriptor.name.as_str(), child),
                Cardinality::Singular => parent.replace(descriptor.name.as_str(), child),
            },
            NodeOutcome::Skipped(denial) => {
                trace!(%denial, association = %descriptor.name, "child skipped");
            }
        }
        Ok(())
    }

    /// Removal is terminal: the child's own nested fields are not processed.
    fn destroy_child<S: TransactionalStore + ?Sized>(
        &mut self,
        store: &mut S,
        parent: &mut Entity,
        descriptor: &AssociationDescriptor,
        child_def: &TypeDef,
        child: Entity,
    ) -> EngineResult<()> {
        let _span = debug_span!("node", entity_type = %child_def.name, verb = "destroy", key = ?child.key).entered();

        let pre = self.check(&ActionVerb::Destroy, &child, child_def, CheckPhase::BeforeMutation);
        if pre.is_denied() {
            return self.deny(pre).map(|_| ());
        }

        let mut scope = Scope::begin(store)?;
        scope.store().remove_from_association(parent, &descriptor.name, &child)?;
        scope.commit()?;

        if let Some(key) = child.key {
            parent.detach(&descriptor.name, key);
        }
        Ok(())
    }

    fn check(&mut self, verb: &ActionVerb, entity: &Entity, type_def: &TypeDef, phase: CheckPhase) -> Decision {
        let verdict = if self.oracle.authorize(self.actor, verb, entity) {
            Verdict::Authorized
        } else {
            Verdict::Denied
        };
        let decision = Decision {
            verdict,
            verb: verb.clone(),
            entity_type: type_def.name.clone(),
            key: entity.key,
            phase,
        };
        debug!(%decision, "authorization check");
        self.decisions.push(decision.clone());
        decision
    }

    fn deny(&self, decision: Decision) -> EngineResult<NodeOutcome> {
        if self.config.silence_denials {
            Ok(NodeOutcome::Skipped(decision))
        } else {
            Err(EngineError::permission_denied(decision))
        }
    }
}
