//! Run orchestration
//!
//! The [`ValidationDriver`] ties the pipeline together: probe the source for
//! metadata and rules, fan out the page fetches, validate every collected
//! record, and hand back one report for the whole run.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::aggregate::{AggregatorConfig, PageAggregator, PageFailure};
use crate::error::{VetterError, VetterResult};
use crate::fetch::{PageFetcher, RawPage};
use crate::rules::{AbsentPolicy, RequirementSet, RuleEngine};
use crate::types::{AggregateReport, Record};
use crate::validator::RecordValidator;

/// Driver settings.
///
/// The defaults reproduce the source contract exactly: probe-page customers
/// are discarded after metadata extraction, absent optional values pass, page
/// size 5.
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    /// Also validate the customers served on the probe page. The source
    /// repeats them on page 1, so turning this on usually double-counts;
    /// it exists for sources that do not repeat.
    pub include_first_page: bool,
    pub absent_policy: AbsentPolicy,
    pub aggregator: AggregatorConfig,
}

impl DriverConfig {
    pub fn with_include_first_page(mut self, include: bool) -> Self {
        self.include_first_page = include;
        self
    }

    pub fn with_absent_policy(mut self, policy: AbsentPolicy) -> Self {
        self.absent_policy = policy;
        self
    }

    pub fn with_aggregator(mut self, aggregator: AggregatorConfig) -> Self {
        self.aggregator = aggregator;
        self
    }
}

/// Summary of one completed validation run.
#[derive(Debug)]
pub struct ValidationRun {
    /// The serializable report of rule violations.
    pub report: AggregateReport,
    /// Pages that could not be fetched; their records are simply missing
    /// from the run.
    pub page_failures: Vec<PageFailure>,
    /// Total record count the source advertised.
    pub total: u64,
    /// Numbered pages that arrived intact.
    pub pages_fetched: u32,
    /// How many records were actually validated.
    pub records_checked: usize,
}

/// Runs one full fetch-and-validate pass against a source.
#[derive(Debug, Clone, Default)]
pub struct ValidationDriver {
    config: DriverConfig,
    aggregator: PageAggregator,
    validator: RecordValidator,
}

impl ValidationDriver {
    pub fn new(config: DriverConfig) -> Self {
        let aggregator = PageAggregator::new(config.aggregator.clone());
        let engine = RuleEngine::new().with_absent_policy(config.absent_policy);
        Self {
            config,
            aggregator,
            validator: RecordValidator::new(engine),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs a validation with a fresh cancellation scope.
    pub async fn run(
        &self,
        fetcher: Arc<dyn PageFetcher>,
        locator: &str,
    ) -> VetterResult<ValidationRun> {
        self.run_with_cancel(fetcher, locator, &CancellationToken::new())
            .await
    }

    /// Runs a validation under the caller's cancellation token.
    ///
    /// The probe is all-or-nothing: a fetch failure on page 0 aborts the run
    /// with nothing to show. From page 1 on, failures degrade to
    /// [`PageFailure`] entries and the run continues on whatever arrived.
    pub async fn run_with_cancel(
        &self,
        fetcher: Arc<dyn PageFetcher>,
        locator: &str,
        cancel: &CancellationToken,
    ) -> VetterResult<ValidationRun> {
        info!(locator, "starting validation run");

        let probe = fetcher
            .fetch_page(locator, 0)
            .await
            .map_err(VetterError::probe)?;

        if probe.is_empty() {
            info!(locator, "source is empty, nothing to validate");
            return Ok(ValidationRun {
                report: AggregateReport::empty(),
                page_failures: Vec::new(),
                total: 0,
                pages_fetched: 0,
                records_checked: 0,
            });
        }

        let RawPage {
            pagination,
            validations,
            customers: probe_customers,
        } = probe;

        let total = pagination
            .ok_or(VetterError::MissingPagination)?
            .total;
        let requirements = RequirementSet::from_fragments(validations);
        debug!(total, rules = requirements.len(), "probe decoded");

        let mut records: Vec<Record> = Vec::new();
        if self.config.include_first_page {
            records.extend(probe_customers);
        } else if !probe_customers.is_empty() {
            debug!(
                discarded = probe_customers.len(),
                "dropping probe-page customers, they reappear on page 1"
            );
        }

        let page_count = self.aggregator.page_count(total);
        let page_set = self
            .aggregator
            .collect(fetcher, locator, total, cancel)
            .await?;
        let pages_fetched = page_count - page_set.failures.len() as u32;
        records.extend(page_set.records);

        let mut invalid_customers = Vec::new();
        for record in &records {
            match self.validator.validate(&requirements, record) {
                Ok(Some(report)) => invalid_customers.push(report),
                Ok(None) => {}
                Err(err) => {
                    error!(%err, "record failed validation but cannot be reported, aborting run");
                    return Err(err.into());
                }
            }
        }

        info!(
            total,
            pages_fetched,
            records_checked = records.len(),
            invalid = invalid_customers.len(),
            failed_pages = page_set.failures.len(),
            "validation run finished"
        );

        Ok(ValidationRun {
            report: AggregateReport { invalid_customers },
            page_failures: page_set.failures,
            total,
            pages_fetched,
            records_checked: records.len(),
        })
    }
}
