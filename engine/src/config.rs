//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Options of an assignment operation.
///
/// Read-only for the duration of an operation. Missing fields deserialize to
/// their defaults, so the struct can be embedded in application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Turn authorization denials into a non-raising outcome instead of an
    /// error. Structural violations are never silenced.
    pub silence_denials: bool,
    /// Follow every nested association key in the proposed tree. When false,
    /// an association is only followed if its `<name>_attributes` key is in
    /// the parent's allow-list.
    pub implicitly_allow_nested_associations: bool,
    /// JSON params are nested under the root type's resource key
    /// (`{"user": {...}}`) rather than given directly.
    pub resource_key_in_params: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            silence_denials: false,
            implicitly_allow_nested_associations: true,
            resource_key_in_params: true,
        }
    }
}

impl Config {
    pub fn silenced(mut self) -> Self {
        self.silence_denials = true;
        self
    }

    pub fn explicit_nested_associations(mut self) -> Self {
        self.implicitly_allow_nested_associations = false;
        self
    }

    pub fn without_resource_key(mut self) -> Self {
        self.resource_key_in_params = false;
        self
    }
}
