//! Allow-list filtering of proposed attributes.

use nestauth_core::Attributes;
use nestauth_registry::TypeDef;

use crate::{AllowList, ProposedNode, DESTROY_MARKER};

/// Keep exactly the entries of `bag` whose key is in `allow_list`.
///
/// Values pass through unchanged and every excluded key is dropped silently.
pub fn sanitize(bag: &Attributes, allow_list: &AllowList) -> Attributes {
    bag.iter()
        .filter(|(key, _)| allow_list.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// The attribute changes of `node` that may be assigned to an entity of `type_def`.
///
/// Identity, the destroy marker and nested association keys are never
/// assignable, whatever the allow-list says.
pub fn assignable(node: &ProposedNode, type_def: &TypeDef, allow_list: &AllowList) -> Attributes {
    let bag: Attributes = node
        .scalars()
        .filter(|(key, _)| {
            *key != type_def.primary_key
                && *key != DESTROY_MARKER
                && type_def.association_for_key(key).is_none()
        })
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    sanitize(&bag, allow_list)
}
