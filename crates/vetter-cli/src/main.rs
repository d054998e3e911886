//! Vetter CLI
//!
//! Fetches a paginated customer collection, validates every record against
//! the rules the source publishes alongside its data, and prints the
//! violation report as JSON on stdout.
//!
//! ```bash
//! vetter http://example.com/customers
//! RUST_LOG=debug vetter http://example.com/customers --pretty
//! ```
//!
//! Pages that cannot be fetched are logged as warnings and their records are
//! simply missing from the report; only probe or accounting failures abort
//! the run with a non-zero exit.

mod args;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::warn;

use vetter_core::{
    AbsentPolicy, AggregatorConfig, DriverConfig, FetchConfig, HttpPageFetcher, ValidationDriver,
};

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with environment-based filtering
    // Set RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let fetch_config = FetchConfig::default()
        .with_request_timeout(Duration::from_secs(cli.timeout_secs))
        .with_max_retries(cli.retries);
    let fetcher = HttpPageFetcher::new(fetch_config).context("failed to build HTTP fetcher")?;

    let absent_policy = if cli.strict_absent {
        AbsentPolicy::Strict
    } else {
        AbsentPolicy::Permissive
    };
    let driver = ValidationDriver::new(
        DriverConfig::default()
            .with_include_first_page(cli.include_first_page)
            .with_absent_policy(absent_policy)
            .with_aggregator(
                AggregatorConfig::default()
                    .with_max_concurrency(cli.concurrency)
                    .with_fetch_timeout(Duration::from_secs(cli.timeout_secs)),
            ),
    );

    let run = driver
        .run(Arc::new(fetcher), &cli.url)
        .await
        .with_context(|| format!("validation run against {} failed", cli.url))?;

    for failure in &run.page_failures {
        warn!(page = failure.page, error = %failure.error, "page skipped");
    }

    let report = if cli.pretty {
        serde_json::to_string_pretty(&run.report)?
    } else {
        serde_json::to_string(&run.report)?
    };
    println!("{report}");

    Ok(())
}
