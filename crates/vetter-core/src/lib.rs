//! Vetter core library
//!
//! Fetches a paginated collection of customer records from a remote source and
//! validates every record against the declarative field rules the source
//! publishes alongside its data. The pipeline is: probe the first page for
//! pagination metadata and validation rules, fan out concurrent fetches for
//! the remaining pages, then run each collected record through the rule
//! engine and report the ones that violate at least one rule.

pub mod aggregate;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod rules;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use aggregate::{AggregateError, AggregatorConfig, PageAggregator, PageFailure, PageSet};
pub use driver::{DriverConfig, ValidationDriver, ValidationRun};
pub use error::{VetterError, VetterResult};
pub use fetch::{FetchConfig, FetchError, HttpPageFetcher, PageFetcher, Pagination, RawPage};
pub use rules::{
    AbsentPolicy, FieldRequirement, Fragment, LengthBounds, RequirementSet, RuleEngine,
    SchemaError, TypeKind,
};
pub use types::{AggregateReport, Record, ValidationReport};
pub use validator::{RecordValidator, ValidateError};
