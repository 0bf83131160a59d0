//! Proposed change trees.
//!
//! A [`ProposedNode`] is the untrusted input of an operation: an ordered bag
//! of fields where scalar fields are attribute changes and nested fields
//! (under `<association>_attributes` keys) describe changes to children.
//! Trees are built programmatically or converted from JSON request params.

use nestauth_core::{EntityKey, TypeId, Value};
use nestauth_registry::{Cardinality, Registry};

use crate::{Config, EngineError, EngineResult, StructuralViolation};

/// Field that asks for a child to be destroyed.
pub const DESTROY_MARKER: &str = "_destroy";

/// Returns true for the values that request destruction: `true`, `1`, `"1"` or `"true"`.
pub fn is_truthy_marker(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Int(i) => *i == 1,
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}

/// The value of a proposed field.
#[derive(Debug, Clone, PartialEq)]
pub enum ProposedValue {
    /// An attribute value.
    Scalar(Value),
    /// The proposed state of a singular child.
    One(ProposedNode),
    /// The proposed states of collection children, in input order.
    Many(Vec<ProposedNode>),
}

impl ProposedValue {
    pub fn is_nested(&self) -> bool {
        !matches!(self, ProposedValue::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ProposedValue::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

/// One node of a proposed change tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProposedNode {
    fields: Vec<(String, ProposedValue)>,
}

impl ProposedNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose an attribute value.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key.into(), ProposedValue::Scalar(value.into()));
        self
    }

    /// Propose a singular child under a nested key.
    pub fn one(mut self, key: impl Into<String>, child: ProposedNode) -> Self {
        self.set(key.into(), ProposedValue::One(child));
        self
    }

    /// Propose collection children under a nested key.
    pub fn many(mut self, key: impl Into<String>, children: impl IntoIterator<Item = ProposedNode>) -> Self {
        self.set(key.into(), ProposedValue::Many(children.into_iter().collect()));
        self
    }

    /// Propose an existing child by identity.
    pub fn with_id(self, key: EntityKey) -> Self {
        self.attr(nestauth_registry::DEFAULT_PRIMARY_KEY, key.raw() as i64)
    }

    /// Ask for this node to be destroyed.
    pub fn mark_destroy(self) -> Self {
        self.attr(DESTROY_MARKER, true)
    }

    /// Set a field, replacing any earlier value under the same key.
    pub fn set(&mut self, key: String, value: ProposedValue) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ProposedValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Fields in input order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ProposedValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Scalar fields in input order.
    pub fn scalars(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_scalar().map(|v| (k.as_str(), v)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the node carries a truthy destroy marker.
    pub fn destroy_requested(&self) -> bool {
        self.get(DESTROY_MARKER)
            .and_then(ProposedValue::as_scalar)
            .is_some_and(is_truthy_marker)
    }

    /// The identity proposed under `primary_key`.
    ///
    /// A missing or null identity means "new". Anything that is not a
    /// non-negative integer (or its decimal string form) is a structural
    /// violation reported against `association`.
    pub fn identity(&self, primary_key: &str, association: &str) -> EngineResult<Option<EntityKey>> {
        match self.get(primary_key) {
            None | Some(ProposedValue::Scalar(Value::Null)) => Ok(None),
            Some(ProposedValue::Scalar(Value::String(s))) if s.trim().is_empty() => Ok(None),
            Some(ProposedValue::Scalar(v)) => v
                .as_entity_key()
                .map(Some)
                .ok_or_else(|| EngineError::from(StructuralViolation::invalid_identity(association, v.to_string()))),
            Some(_) => Err(StructuralViolation::invalid_identity(association, "nested value").into()),
        }
    }

    // ==================== JSON Params ====================

    /// Convert a JSON object into a proposed tree for an entity of `type_id`.
    ///
    /// Nested keys are resolved against the registry: collections take arrays
    /// of objects, singular associations take an object, and `null` proposes
    /// nothing. An object under a key that names no declared association is
    /// rejected.
    pub fn from_json(registry: &Registry, type_id: TypeId, json: &serde_json::Value) -> EngineResult<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(StructuralViolation::invalid_params(format!(
                "expected an object for {}, got {}",
                registry.type_name(type_id),
                json_kind(json)
            ))
            .into());
        };

        let mut node = ProposedNode::new();
        for (key, value) in map {
            match registry.resolve(type_id, key)? {
                Some(descriptor) => {
                    let proposed = match (descriptor.cardinality, value) {
                        (_, serde_json::Value::Null) => continue,
                        (Cardinality::Collection, serde_json::Value::Array(items)) => {
                            let children = items
                                .iter()
                                .map(|item| Self::from_json(registry, descriptor.child_type, item))
                                .collect::<EngineResult<Vec<_>>>()?;
                            ProposedValue::Many(children)
                        }
                        (Cardinality::Singular, serde_json::Value::Object(_)) => {
                            ProposedValue::One(Self::from_json(registry, descriptor.child_type, value)?)
                        }
                        (cardinality, _) => {
                            return Err(StructuralViolation::shape_mismatch(&descriptor.name, cardinality).into())
                        }
                    };
                    node.set(key.clone(), proposed);
                }
                None if value.is_object() => {
                    return Err(StructuralViolation::unknown_association(registry.type_name(type_id), key).into())
                }
                None => node.set(key.clone(), ProposedValue::Scalar(json_to_value(key, value)?)),
            }
        }
        Ok(node)
    }

    /// Convert request params for an entity of `type_id`.
    ///
    /// With `resource_key_in_params`, the tree is read from under the type's
    /// resource key (`{"user": {...}}`); otherwise `params` is the tree.
    pub fn from_params(
        registry: &Registry,
        type_id: TypeId,
        params: &serde_json::Value,
        config: &Config,
    ) -> EngineResult<Self> {
        if !config.resource_key_in_params {
            return Self::from_json(registry, type_id, params);
        }
        let resource_key = &registry.expect_type(type_id)?.resource_key;
        match params.get(resource_key) {
            Some(inner) => Self::from_json(registry, type_id, inner),
            None => Err(StructuralViolation::missing_resource_key(resource_key).into()),
        }
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn json_to_value(key: &str, json: &serde_json::Value) -> EngineResult<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => match n.as_f64() {
                Some(f) => Value::Float(f),
                None => {
                    return Err(StructuralViolation::invalid_params(format!("{} is out of range for {}", n, key)).into())
                }
            },
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(
            items
                .iter()
                .map(|item| json_to_value(key, item))
                .collect::<EngineResult<Vec<_>>>()?,
        ),
        serde_json::Value::Object(_) => {
            return Err(StructuralViolation::invalid_params(format!("unexpected object under {}", key)).into())
        }
    })
}
