//! Assertions over operation results.

use nestauth_engine::{CheckPhase, EngineError, EngineResult, Outcome};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("Assertion failed: {0}")]
    Failed(String),

    #[error("Invalid error pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl AssertionError {
    fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    Applied,
    Denied,
    PermissionDenied,
    Structural,
}

/// Expected result of an operation.
#[derive(Debug, Clone)]
pub struct Expect {
    expected: Expected,
    phase: Option<CheckPhase>,
    checks: Option<usize>,
    denials: Option<usize>,
    error_pattern: Option<String>,
}

impl Expect {
    fn new(expected: Expected) -> Self {
        Self {
            expected,
            phase: None,
            checks: None,
            denials: None,
            error_pattern: None,
        }
    }

    /// The operation's changes were kept.
    pub fn applied() -> Self {
        Self::new(Expected::Applied)
    }

    /// The root was denied with denials silenced.
    pub fn denied() -> Self {
        Self::new(Expected::Denied)
    }

    /// The operation failed with `PermissionDenied`.
    pub fn permission_denied() -> Self {
        Self::new(Expected::PermissionDenied)
    }

    /// The operation failed with a structural violation.
    pub fn structural() -> Self {
        Self::new(Expected::Structural)
    }

    /// The denial happened in `phase`.
    pub fn in_phase(mut self, phase: CheckPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Exactly `n` authorization checks were made.
    pub fn checks(mut self, n: usize) -> Self {
        self.checks = Some(n);
        self
    }

    /// Exactly `n` checks were denied.
    pub fn denials(mut self, n: usize) -> Self {
        self.denials = Some(n);
        self
    }

    /// The error message matches `pattern`.
    pub fn error_matching(mut self, pattern: impl Into<String>) -> Self {
        self.error_pattern = Some(pattern.into());
        self
    }

    /// Verify a result against the expectation.
    pub fn verify(&self, result: &EngineResult<Outcome>) -> Result<(), AssertionError> {
        match result {
            Ok(outcome) => self.verify_outcome(outcome),
            Err(error) => self.verify_error(error),
        }
    }

    fn verify_outcome(&self, outcome: &Outcome) -> Result<(), AssertionError> {
        match (self.expected, outcome) {
            (Expected::Applied, Outcome::Applied { .. }) => {}
            (Expected::Denied, Outcome::Denied { denial, .. }) => {
                if let Some(phase) = self.phase {
                    if denial.phase != phase {
                        return Err(AssertionError::failed(format!(
                            "expected denial {}, got {}",
                            phase, denial
                        )));
                    }
                }
            }
            (expected, outcome) => {
                return Err(AssertionError::failed(format!(
                    "expected {:?}, got outcome with success={}",
                    expected,
                    outcome.is_success()
                )))
            }
        }

        if let Some(n) = self.checks {
            let actual = outcome.decisions().len();
            if actual != n {
                return Err(AssertionError::failed(format!(
                    "expected {} checks, got {}: {:?}",
                    n,
                    actual,
                    outcome.decisions()
                )));
            }
        }

        if let Some(n) = self.denials {
            let actual = outcome.denials().count();
            if actual != n {
                return Err(AssertionError::failed(format!(
                    "expected {} denials, got {}",
                    n, actual
                )));
            }
        }

        Ok(())
    }

    fn verify_error(&self, error: &EngineError) -> Result<(), AssertionError> {
        match (self.expected, error) {
            (Expected::PermissionDenied, EngineError::PermissionDenied { phase, .. }) => {
                if let Some(expected) = self.phase {
                    if *phase != expected {
                        return Err(AssertionError::failed(format!(
                            "expected denial {}, got: {}",
                            expected, error
                        )));
                    }
                }
            }
            (Expected::Structural, EngineError::Structural(_)) => {}
            (expected, _) => {
                return Err(AssertionError::failed(format!(
                    "expected {:?}, got error: {}",
                    expected, error
                )))
            }
        }

        if let Some(ref pattern) = self.error_pattern {
            let re = regex_lite::Regex::new(pattern).map_err(|e| AssertionError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            let message = error.to_string();
            if !re.is_match(&message) {
                return Err(AssertionError::failed(format!(
                    "expected error matching '{}', got: {}",
                    pattern, message
                )));
            }
        }

        Ok(())
    }
}
