//! Rule evaluation engine

use serde_json::Value;
use tracing::warn;

use super::requirement::FieldRequirement;

/// How the engine treats an absent (missing or `null`) value on a field that
/// is not required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbsentPolicy {
    /// An optional field that is absent passes, whatever else the
    /// requirement declares. This is the documented contract: type and
    /// length constraints only apply to values that are present.
    #[default]
    Permissive,

    /// An optional field that is absent passes only when the requirement
    /// declares nothing beyond presence. Useful for flushing out rule
    /// payloads that constrain fields the source never actually sends.
    Strict,
}

/// Evaluates a single field value against a single requirement.
///
/// The engine is deliberately small and infallible at the call site: every
/// outcome is a plain pass/fail `bool`. Structural problems in the
/// requirement itself (unknown type kind, inverted bounds) fail the field
/// closed and are logged once per evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    absent_policy: AbsentPolicy,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absent_policy(mut self, policy: AbsentPolicy) -> Self {
        self.absent_policy = policy;
        self
    }

    pub fn absent_policy(&self) -> AbsentPolicy {
        self.absent_policy
    }

    /// Evaluates one field. `value` is `None` when the record has no such
    /// key; a JSON `null` is treated identically.
    ///
    /// Check order is fixed: requirement structure, then presence, then type,
    /// then length. The first failing check decides the outcome, so a value
    /// of the wrong type is never length-checked.
    pub fn evaluate(&self, value: Option<&Value>, requirement: &FieldRequirement) -> bool {
        if let Err(error) = requirement.check() {
            warn!(%error, "malformed requirement, failing field closed");
            return false;
        }

        let present = value.filter(|v| !v.is_null());
        let Some(value) = present else {
            return self.evaluate_absent(requirement);
        };

        if let Some(kind) = &requirement.kind {
            if !kind.matches(value) {
                return false;
            }
        }

        if let Some(bounds) = &requirement.length {
            // Length is defined for strings only. A non-string value that
            // reaches this point carries a length bound without a string
            // type constraint, and fails closed.
            let Some(text) = value.as_str() else {
                return false;
            };
            return bounds.allows(text.chars().count() as u64);
        }

        true
    }

    fn evaluate_absent(&self, requirement: &FieldRequirement) -> bool {
        if requirement.required {
            return false;
        }
        match self.absent_policy {
            AbsentPolicy::Permissive => true,
            AbsentPolicy::Strict => !requirement.has_constraints(),
        }
    }
}
