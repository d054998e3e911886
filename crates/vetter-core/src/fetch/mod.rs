//! Page retrieval
//!
//! The pipeline only ever sees pages through the [`PageFetcher`] trait, which
//! keeps the aggregation and driver logic independent of any transport.
//! [`http::HttpPageFetcher`] is the production implementation.

pub mod http;

use async_trait::async_trait;
use serde::Deserialize;

use crate::rules::Fragment;
use crate::types::Record;

pub use http::{FetchConfig, HttpPageFetcher};

/// A failed page retrieval.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("source returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode page body: {0}")]
    Decode(String),

    #[error("fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Covers timeouts, transport-level failures and throttling or server
    /// errors. Client errors and undecodable bodies are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) | FetchError::Cancelled => false,
        }
    }
}

/// Pagination metadata published on the probe page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub total: u64,
}

/// One page as the source serves it. Every section is optional on the wire;
/// a missing section reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub pagination: Option<Pagination>,

    #[serde(default)]
    pub validations: Vec<Fragment>,

    #[serde(default)]
    pub customers: Vec<Record>,
}

impl RawPage {
    /// True when the page carries nothing at all: no metadata, no rules,
    /// no records. An empty probe page means an empty source.
    pub fn is_empty(&self) -> bool {
        self.pagination.is_none() && self.validations.is_empty() && self.customers.is_empty()
    }
}

/// Retrieves one page of the collection.
///
/// Page 0 is the unparameterized probe request; for any `page > 0` the
/// implementation addresses that specific page of the collection.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, locator: &str, page: u32) -> Result<RawPage, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_page_deserializes_full_shape() {
        let page: RawPage = serde_json::from_value(json!({
            "pagination": {"total": 12},
            "validations": [
                {"name": {"required": true, "type": "string"}}
            ],
            "customers": [
                {"id": "c1", "name": "Ada"}
            ]
        }))
        .unwrap();

        assert_eq!(page.pagination, Some(Pagination { total: 12 }));
        assert_eq!(page.validations.len(), 1);
        assert_eq!(page.customers.len(), 1);
        assert!(!page.is_empty());
    }

    #[test]
    fn test_raw_page_sections_default_when_absent() {
        let page: RawPage = serde_json::from_value(json!({
            "customers": [{"id": "c9"}]
        }))
        .unwrap();
        assert_eq!(page.pagination, None);
        assert!(page.validations.is_empty());
        assert_eq!(page.customers.len(), 1);
    }

    #[test]
    fn test_empty_body_is_an_empty_page() {
        let page: RawPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Transport("connection refused".into()).is_transient());
        assert!(FetchError::Timeout { secs: 30 }.is_transient());
        assert!(FetchError::Status { status: 429, url: "u".into() }.is_transient());
        assert!(FetchError::Status { status: 503, url: "u".into() }.is_transient());

        assert!(!FetchError::Status { status: 404, url: "u".into() }.is_transient());
        assert!(!FetchError::Decode("bad json".into()).is_transient());
        assert!(!FetchError::Cancelled.is_transient());
    }
}
