//! HTTP page fetcher
//!
//! Production [`PageFetcher`] backed by `reqwest`. Transient failures are
//! retried with exponential backoff and jitter; permanent failures return
//! immediately.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use tokio::time::sleep;
use tracing::warn;

use super::{FetchError, PageFetcher, RawPage};

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// HTTP fetcher settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl FetchConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Fetches pages over HTTP.
///
/// Page 0 requests the bare locator; any later page appends a `page` query
/// parameter. The body is decoded as a [`RawPage`] whatever the page number.
pub struct HttpPageFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpPageFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn request_for(&self, locator: &str, page: u32) -> reqwest::RequestBuilder {
        let request = self.client.get(locator);
        if page > 0 {
            request.query(&[("page", page)])
        } else {
            request
        }
    }

    async fn fetch_once(&self, locator: &str, page: u32) -> Result<RawPage, FetchError> {
        let response = self
            .request_for(locator, page)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: response.url().to_string(),
            });
        }

        response
            .json::<RawPage>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn classify_send_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                secs: self.config.request_timeout.as_secs(),
            }
        } else {
            FetchError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, locator: &str, page: u32) -> Result<RawPage, FetchError> {
        let max_retries = self.config.max_retries;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match self.fetch_once(locator, page).await {
                Ok(raw) => return Ok(raw),
                Err(error) => {
                    if !error.is_transient() {
                        return Err(error);
                    }

                    if attempt < max_retries {
                        let delay = retry_delay(attempt);
                        warn!(
                            page,
                            attempt = attempt + 1,
                            max_attempts = max_retries + 1,
                            delay_secs = delay.as_secs_f64(),
                            error = %error,
                            "transient fetch failure, retrying"
                        );
                        last_error = Some(error);
                        sleep(delay).await;
                    } else {
                        warn!(
                            page,
                            attempts = max_retries + 1,
                            error = %error,
                            "all fetch attempts exhausted"
                        );
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::Transport("fetch failed without error details".into())))
    }
}

/// Exponential backoff with jitter: 1s, 2s, 4s, ... plus up to 500ms of
/// random jitter per second of base delay.
fn retry_delay(attempt: u32) -> Duration {
    let base_delay_secs = 2_u64.pow(attempt.min(6));
    let jitter_ms = {
        let mut rng = rand::thread_rng();
        rng.gen_range(0..=(base_delay_secs * 500))
    };
    Duration::from_secs(base_delay_secs) + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_config_builders() {
        let config = FetchConfig::default()
            .with_connect_timeout(Duration::from_secs(2))
            .with_request_timeout(Duration::from_secs(5))
            .with_max_retries(0);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_probe_request_has_no_page_parameter() {
        let fetcher = HttpPageFetcher::new(FetchConfig::default()).unwrap();
        let request = fetcher
            .request_for("http://example.com/customers", 0)
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://example.com/customers");
    }

    #[test]
    fn test_numbered_pages_carry_page_parameter() {
        let fetcher = HttpPageFetcher::new(FetchConfig::default()).unwrap();
        let request = fetcher
            .request_for("http://example.com/customers", 3)
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://example.com/customers?page=3"
        );
    }

    #[test]
    fn test_retry_delay_grows_and_is_capped() {
        for attempt in 0..10 {
            let delay = retry_delay(attempt);
            let base = 2_u64.pow(attempt.min(6));
            assert!(delay >= Duration::from_secs(base));
            assert!(delay <= Duration::from_secs(base) + Duration::from_millis(base * 500));
        }
    }
}
