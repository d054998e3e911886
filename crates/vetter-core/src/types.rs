//! Common types shared across the validation pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One customer record as it arrives from the source: a map from field name
/// to a dynamically typed JSON value (string, boolean, number, or null).
pub type Record = serde_json::Map<String, Value>;

/// Violation report for a single record.
///
/// Only materialized when at least one field is invalid; clean records
/// produce no report at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// The record's "id" field, passed through untouched (sources use both
    /// numeric and string ids).
    pub id: Value,
    /// Names of the failing fields, in the record's field-iteration order.
    pub invalid_fields: Vec<String>,
}

impl ValidationReport {
    /// Create a report for a record with the given failing fields.
    pub fn new(id: Value, invalid_fields: Vec<String>) -> Self {
        Self { id, invalid_fields }
    }
}

/// The full run output: every record that violated at least one rule.
///
/// Serializes to the canonical `{"invalid_customers": [...]}` shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Reports for violating records, in page-arrival order.
    pub invalid_customers: Vec<ValidationReport>,
}

impl AggregateReport {
    /// Report with no violations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether every validated record was clean.
    pub fn is_clean(&self) -> bool {
        self.invalid_customers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_serialization_shape() {
        let report = AggregateReport {
            invalid_customers: vec![ValidationReport::new(
                json!("c1"),
                vec!["age".to_string()],
            )],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({"invalid_customers": [{"id": "c1", "invalid_fields": ["age"]}]})
        );
    }

    #[test]
    fn test_empty_report_is_clean() {
        assert!(AggregateReport::empty().is_clean());
        assert_eq!(
            serde_json::to_value(AggregateReport::empty()).unwrap(),
            json!({"invalid_customers": []})
        );
    }
}
