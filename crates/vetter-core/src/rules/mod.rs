//! Declarative field rules and their evaluation
//!
//! Sources publish validation rules next to their data as an ordered list of
//! requirement fragments. This module provides:
//! - The constraint model (type kind, length bounds, required-ness)
//! - Fragment merging into an effective [`RequirementSet`]
//! - The [`RuleEngine`] that evaluates one field value against one requirement

mod engine;
mod requirement;

pub use engine::{AbsentPolicy, RuleEngine};
pub use requirement::{FieldRequirement, Fragment, LengthBounds, RequirementSet, SchemaError, TypeKind};
