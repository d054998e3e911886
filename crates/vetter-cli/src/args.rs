//! CLI argument definitions using clap

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "vetter")]
#[command(about = "Validate paginated customer records against the rules their source publishes")]
#[command(version)]
pub struct Cli {
    /// Base URL of the record source; numbered pages are requested with
    /// an appended `page` query parameter
    pub url: String,

    /// Also validate the customers served on the metadata page (the source
    /// normally repeats them on page 1, so this double-counts)
    #[arg(long)]
    pub include_first_page: bool,

    /// Maximum number of pages fetched concurrently
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// Per-page fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Retry attempts for transient fetch failures
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Fail absent optional values that carry type or length constraints
    #[arg(long)]
    pub strict_absent: bool,

    /// Pretty-print the report JSON
    #[arg(long)]
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["vetter", "http://example.com/customers"]);
        assert_eq!(cli.url, "http://example.com/customers");
        assert!(!cli.include_first_page);
        assert_eq!(cli.concurrency, 8);
        assert_eq!(cli.timeout_secs, 30);
        assert_eq!(cli.retries, 3);
        assert!(!cli.strict_absent);
        assert!(!cli.pretty);
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::parse_from([
            "vetter",
            "http://example.com/customers",
            "--include-first-page",
            "--concurrency",
            "2",
            "--retries",
            "0",
            "--pretty",
        ]);
        assert!(cli.include_first_page);
        assert_eq!(cli.concurrency, 2);
        assert_eq!(cli.retries, 0);
        assert!(cli.pretty);
    }
}
