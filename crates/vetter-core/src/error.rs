//! Crate-level error type for validation runs

use crate::aggregate::AggregateError;
use crate::fetch::FetchError;
use crate::validator::ValidateError;
use thiserror::Error;

/// Result type alias for vetter operations
pub type VetterResult<T> = Result<T, VetterError>;

/// Errors that abort a whole validation run.
///
/// Per-page fetch failures are not represented here: they are isolated into
/// [`PageFailure`](crate::aggregate::PageFailure) entries and the run carries
/// on with the pages that did arrive. Everything in this enum is fatal.
#[derive(Debug, Error)]
pub enum VetterError {
    /// The initial metadata probe failed; nothing can be validated.
    #[error("metadata probe failed: {source}")]
    Probe {
        #[source]
        source: FetchError,
    },

    /// The probe returned data but no pagination block, so the total record
    /// count is unknown.
    #[error("source response has no pagination metadata")]
    MissingPagination,

    /// The page fan-out lost results (a worker panicked before reporting).
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A record violated its rules but carried no "id" to report against.
    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl VetterError {
    /// Wrap a probe-phase fetch failure.
    pub fn probe(source: FetchError) -> Self {
        Self::Probe { source }
    }
}
