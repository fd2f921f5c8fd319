// client.rs
use crate::domain::RawListing;
use crate::scraper::ScraperError;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const JITTER_MAX_MS: u64 = 500;

/// Knobs shared by every connector.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    /// Pause between two requests to the same source.
    pub page_delay: Duration,
    pub attempts: u32,
    pub default_city: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            page_delay: Duration::from_millis(1500),
            attempts: 2,
            default_city: "Sydney".to_string(),
        }
    }
}

/// Blocking HTTP client that paces itself and retries with jittered backoff.
pub struct PoliteClient {
    client: Client,
    settings: FetchSettings,
}

impl PoliteClient {
    pub fn new(settings: FetchSettings) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-AU,en;q=0.9"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches a page, retrying up to `attempts` times.
    pub fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        let attempts = self.settings.attempts.max(1);
        let mut attempt = 1;

        loop {
            let start = Instant::now();
            match self.try_get_html(url) {
                Ok(html) => {
                    debug!(url, attempt, elapsed = ?start.elapsed(), "fetched page");
                    return Ok(html);
                }
                Err(e) if attempt < attempts => {
                    warn!(url, attempt, error = %e, "fetch failed, retrying");
                    let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MS);
                    std::thread::sleep(
                        self.settings.page_delay * attempt + Duration::from_millis(jitter),
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_get_html(&self, url: &str) -> Result<String, ScraperError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text()?)
    }

    /// Fetches each url in turn and parses it with `parse`.
    ///
    /// A failing page is logged and skipped. Only when every page failed does
    /// the source count as unavailable.
    pub fn collect_pages<F>(
        &self,
        source_name: &str,
        urls: &[&str],
        mut parse: F,
    ) -> Result<Vec<RawListing>, ScraperError>
    where
        F: FnMut(&str, &str) -> Result<Vec<RawListing>, ScraperError>,
    {
        let mut listings = Vec::new();
        let mut failures = 0;

        for (i, &url) in urls.iter().enumerate() {
            if i > 0 {
                std::thread::sleep(self.settings.page_delay);
            }

            match self.get_html(url).and_then(|html| parse(url, &html)) {
                Ok(found) => {
                    debug!(source = source_name, url, found = found.len(), "page parsed");
                    listings.extend(found);
                }
                Err(e) => {
                    warn!(source = source_name, url, error = %e, "page failed");
                    failures += 1;
                }
            }
        }

        if !urls.is_empty() && failures == urls.len() {
            return Err(ScraperError::Unavailable {
                source_name: source_name.to_string(),
                attempted: urls.len(),
            });
        }

        Ok(listings)
    }
}
