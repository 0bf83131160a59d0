//! Action verbs.
//!
//! Verbs are opaque tokens compared by equality. Only `Create`, `Update` and
//! `Destroy` are ever derived by the engine; anything else is
//! application-defined.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The action being authorized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionVerb {
    Create,
    Update,
    Destroy,
    /// Application-defined verb (e.g. "publish").
    Custom(String),
}

/// Error parsing a verb token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerbError {
    #[error("Empty action verb")]
    Empty,

    #[error("Invalid action verb: {0:?}")]
    Invalid(String),
}

impl ActionVerb {
    /// Build an application-defined verb.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// The token for this verb.
    pub fn as_str(&self) -> &str {
        match self {
            ActionVerb::Create => "create",
            ActionVerb::Update => "update",
            ActionVerb::Destroy => "destroy",
            ActionVerb::Custom(name) => name,
        }
    }
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionVerb {
    type Err = VerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Err(VerbError::Empty);
        }
        if token.chars().any(char::is_whitespace) {
            return Err(VerbError::Invalid(s.to_string()));
        }
        Ok(match token {
            "create" => ActionVerb::Create,
            "update" => ActionVerb::Update,
            "destroy" => ActionVerb::Destroy,
            other => ActionVerb::Custom(other.to_string()),
        })
    }
}
