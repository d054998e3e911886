//! Whole-record validation
//!
//! Applies a merged [`RequirementSet`] to one record at a time and produces a
//! [`ValidationReport`] only when something is wrong with it.

use tracing::debug;

use crate::rules::{RequirementSet, RuleEngine};
use crate::types::{Record, ValidationReport};

/// A record that cannot be reported on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidateError {
    /// The record failed validation but carries no `id` field, so there is
    /// nothing to key the report entry on. Sources are contractually obliged
    /// to stamp every customer with an id.
    #[error("record failed validation but has no 'id' field")]
    MissingId,
}

/// Validates records field by field against the effective requirement set.
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    engine: RuleEngine,
}

impl RecordValidator {
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Validates one record.
    ///
    /// Walks the record's own fields in map order and evaluates each one that
    /// has a matching requirement; fields the rule set does not mention pass
    /// untouched. Note the converse as well: a required field whose key is
    /// missing from the record entirely is never visited here. Only an
    /// explicit `null` trips the required check.
    ///
    /// Returns `Ok(None)` for a clean record. A dirty record without an `id`
    /// is an input-contract violation and surfaces as an error.
    pub fn validate(
        &self,
        requirements: &RequirementSet,
        record: &Record,
    ) -> Result<Option<ValidationReport>, ValidateError> {
        let mut invalid_fields = Vec::new();
        for (field, value) in record {
            if let Some(requirement) = requirements.get(field) {
                if !self.engine.evaluate(Some(value), requirement) {
                    invalid_fields.push(field.clone());
                }
            }
        }

        if invalid_fields.is_empty() {
            return Ok(None);
        }

        let id = record.get("id").cloned().ok_or(ValidateError::MissingId)?;
        debug!(%id, fields = ?invalid_fields, "record failed validation");
        Ok(Some(ValidationReport::new(id, invalid_fields)))
    }
}
