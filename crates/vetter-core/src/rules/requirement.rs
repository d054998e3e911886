//! Requirement model: the declarative shape of a field constraint
//!
//! Requirements arrive from the wire as JSON fragments and are merged into a
//! single effective set before any record is evaluated.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A structurally invalid requirement.
///
/// These are authoring mistakes in the source's rule payload, not record
/// problems. The engine fails the affected field closed when it meets one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown type kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("length bounds are inverted: min {min} > max {max}")]
    InvalidBounds { min: u64, max: u64 },
}

/// The JSON type a field value must have.
///
/// Rule payloads are third-party input, so deserialization never rejects a
/// kind string outright; anything unrecognized is preserved verbatim and
/// surfaces later as [`SchemaError::UnknownKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    String,
    Boolean,
    Number,
    Unrecognized(String),
}

impl TypeKind {
    /// Whether `value` has this JSON kind.
    ///
    /// JSON keeps booleans and numbers distinct, so a `true` never satisfies
    /// `Number` and a `0` never satisfies `Boolean`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeKind::String => value.is_string(),
            TypeKind::Boolean => value.is_boolean(),
            TypeKind::Number => value.is_number(),
            TypeKind::Unrecognized(_) => false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeKind::String => "string",
            TypeKind::Boolean => "boolean",
            TypeKind::Number => "number",
            TypeKind::Unrecognized(kind) => kind,
        }
    }
}

impl From<&str> for TypeKind {
    fn from(kind: &str) -> Self {
        match kind {
            "string" => TypeKind::String,
            "boolean" => TypeKind::Boolean,
            "number" => TypeKind::Number,
            other => TypeKind::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for TypeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let kind = String::deserialize(deserializer)?;
        Ok(TypeKind::from(kind.as_str()))
    }
}

/// Inclusive character-count bounds for string values.
///
/// Either bound may be omitted; an omitted bound is unconstrained on that
/// side, and omitting both makes the constraint vacuous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LengthBounds {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl LengthBounds {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    /// Whether a string of `len` characters satisfies these bounds.
    pub fn allows(&self, len: u64) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= len && len <= max,
            (Some(min), None) => min <= len,
            (None, Some(max)) => len <= max,
            (None, None) => true,
        }
    }

    fn check(&self) -> Result<(), SchemaError> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(SchemaError::InvalidBounds { min, max });
            }
        }
        Ok(())
    }
}

/// One field's constraint as declared by the source.
///
/// `required` defaults to `false` when the fragment omits it, so a bare
/// `{"type": "string"}` reads as an optional string field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldRequirement {
    #[serde(default)]
    pub required: bool,

    #[serde(rename = "type")]
    pub kind: Option<TypeKind>,

    pub length: Option<LengthBounds>,
}

impl FieldRequirement {
    /// Structural sanity check, run once per evaluation before any value is
    /// consulted.
    pub fn check(&self) -> Result<(), SchemaError> {
        if let Some(TypeKind::Unrecognized(kind)) = &self.kind {
            return Err(SchemaError::UnknownKind { kind: kind.clone() });
        }
        if let Some(length) = &self.length {
            length.check()?;
        }
        Ok(())
    }

    /// Whether this requirement constrains anything beyond presence.
    pub fn has_constraints(&self) -> bool {
        self.kind.is_some() || self.length.is_some()
    }
}

/// One rule fragment as it appears on the wire: field name to requirement.
pub type Fragment = HashMap<String, FieldRequirement>;

/// The effective rule set after merging all fragments in publication order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementSet {
    fields: HashMap<String, FieldRequirement>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges fragments left to right. When two fragments constrain the same
    /// field, the later fragment replaces the earlier one wholesale; partial
    /// overrides are not a thing in this rule format.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut set = Self::new();
        for fragment in fragments {
            set.fields.extend(fragment);
        }
        set
    }

    pub fn insert(&mut self, field: impl Into<String>, requirement: FieldRequirement) {
        self.fields.insert(field.into(), requirement);
    }

    pub fn get(&self, field: &str) -> Option<&FieldRequirement> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldRequirement)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_fragment(value: Value) -> Fragment {
        serde_json::from_value(value).expect("fragment should deserialize")
    }

    #[test]
    fn test_type_kind_matches_json_kinds() {
        assert!(TypeKind::String.matches(&json!("hello")));
        assert!(!TypeKind::String.matches(&json!(42)));

        assert!(TypeKind::Boolean.matches(&json!(true)));
        assert!(!TypeKind::Boolean.matches(&json!("true")));

        assert!(TypeKind::Number.matches(&json!(42)));
        assert!(TypeKind::Number.matches(&json!(1.5)));
        assert!(!TypeKind::Number.matches(&json!("42")));
    }

    #[test]
    fn test_boolean_is_not_a_number() {
        assert!(!TypeKind::Number.matches(&json!(true)));
        assert!(!TypeKind::Number.matches(&json!(false)));
        assert!(!TypeKind::Boolean.matches(&json!(0)));
        assert!(!TypeKind::Boolean.matches(&json!(1)));
    }

    #[test]
    fn test_unrecognized_kind_is_preserved() {
        let requirement: FieldRequirement =
            serde_json::from_value(json!({"required": true, "type": "integer"})).unwrap();
        assert_eq!(
            requirement.kind,
            Some(TypeKind::Unrecognized("integer".to_string()))
        );
        assert_eq!(
            requirement.check(),
            Err(SchemaError::UnknownKind {
                kind: "integer".to_string()
            })
        );
    }

    #[test]
    fn test_length_bounds_allows() {
        let both = LengthBounds::new(Some(2), Some(5));
        assert!(!both.allows(1));
        assert!(both.allows(2));
        assert!(both.allows(5));
        assert!(!both.allows(6));

        let min_only = LengthBounds::new(Some(3), None);
        assert!(!min_only.allows(2));
        assert!(min_only.allows(3));
        assert!(min_only.allows(1_000));

        let max_only = LengthBounds::new(None, Some(4));
        assert!(max_only.allows(0));
        assert!(max_only.allows(4));
        assert!(!max_only.allows(5));

        let vacuous = LengthBounds::default();
        assert!(vacuous.allows(0));
        assert!(vacuous.allows(u64::MAX));
    }

    #[test]
    fn test_inverted_bounds_are_a_schema_error() {
        let requirement = FieldRequirement {
            required: true,
            kind: Some(TypeKind::String),
            length: Some(LengthBounds::new(Some(10), Some(2))),
        };
        assert_eq!(
            requirement.check(),
            Err(SchemaError::InvalidBounds { min: 10, max: 2 })
        );
    }

    #[test]
    fn test_required_defaults_to_false() {
        let requirement: FieldRequirement =
            serde_json::from_value(json!({"type": "string"})).unwrap();
        assert!(!requirement.required);
        assert_eq!(requirement.kind, Some(TypeKind::String));
    }

    #[test]
    fn test_fragment_deserializes_wire_shape() {
        let fragment = parse_fragment(json!({
            "name": {"required": true, "type": "string", "length": {"min": 1, "max": 64}},
            "active": {"required": false, "type": "boolean"}
        }));
        assert_eq!(fragment.len(), 2);
        assert!(fragment["name"].required);
        assert_eq!(fragment["name"].length, Some(LengthBounds::new(Some(1), Some(64))));
        assert_eq!(fragment["active"].kind, Some(TypeKind::Boolean));
    }

    #[test]
    fn test_merge_later_fragment_wins() {
        let first = parse_fragment(json!({
            "name": {"required": true, "type": "string", "length": {"min": 5}},
            "age": {"required": true, "type": "number"}
        }));
        let second = parse_fragment(json!({
            "name": {"required": false, "type": "string"}
        }));

        let set = RequirementSet::from_fragments([first, second]);
        assert_eq!(set.len(), 2);

        // The override replaces the whole requirement, including its bounds.
        let name = set.get("name").unwrap();
        assert!(!name.required);
        assert_eq!(name.length, None);

        let age = set.get("age").unwrap();
        assert!(age.required);
    }

    #[test]
    fn test_merge_is_order_sensitive() {
        let relaxed = parse_fragment(json!({"id": {"required": false}}));
        let strict = parse_fragment(json!({"id": {"required": true}}));

        let relaxed_last =
            RequirementSet::from_fragments([strict.clone(), relaxed.clone()]);
        assert!(!relaxed_last.get("id").unwrap().required);

        let strict_last = RequirementSet::from_fragments([relaxed, strict]);
        assert!(strict_last.get("id").unwrap().required);
    }

    #[test]
    fn test_empty_fragments_merge_to_empty_set() {
        let set = RequirementSet::from_fragments(Vec::<Fragment>::new());
        assert!(set.is_empty());
        assert_eq!(set.get("anything"), None);
    }
}
