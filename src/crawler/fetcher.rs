//! HTTP fetching for listing and detail pages
//!
//! This module handles:
//! - Building the HTTP client with static browser-like headers
//! - GET requests for listing pages, with error classification
//! - Single-attempt detail fetches, made fail-soft by the batch scheduler

use crate::config::{DetailLabels, HttpConfig};
use crate::crawler::parser::PageParser;
use crate::inventory::{normalize_location, DetailFields};
use crate::{HarvestError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with the configured headers and timeouts
///
/// # Arguments
///
/// * `config` - Static header values and client timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - A header value is invalid or the client failed to build
///
/// # Example
///
/// ```no_run
/// use inventory_harvest::config::HttpConfig;
/// use inventory_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value("accept", &config.accept)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept-language", &config.accept_language)?,
    );

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        HarvestError::Config(crate::ConfigError::Validation(format!(
            "invalid {} header: {}",
            name, e
        )))
    })
}

/// Fetches one page and returns its body
///
/// Any non-2xx status is an error; redirects are followed by the client.
///
/// # Returns
///
/// * `Ok(String)` - The response body
/// * `Err(HarvestError::Timeout)` - The client timeout elapsed
/// * `Err(HarvestError::HttpStatus)` - The server answered with a non-success status
/// * `Err(HarvestError::Http)` - Any other transport failure
pub async fn fetch_listing(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify_error(url, e))
}

fn classify_error(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Picks the enrichment fields out of a detail page's label/value rows
///
/// Labels are compared case-insensitively, in the configured order; among
/// rows matching the same label, the first in page order wins. A location
/// is canonicalized; an empty value counts as missing.
pub fn extract_detail_fields(fields: &[(String, String)], labels: &DetailLabels) -> DetailFields {
    let lookup = |wanted: &[String]| -> Option<String> {
        wanted.iter().find_map(|label| {
            fields
                .iter()
                .find(|(key, value)| key.eq_ignore_ascii_case(label) && !value.trim().is_empty())
                .map(|(_, value)| value.trim().to_string())
        })
    };

    DetailFields {
        location: lookup(&labels.location)
            .map(|l| normalize_location(&l))
            .unwrap_or_default(),
        hours: lookup(&labels.hours),
    }
}

/// Single-attempt detail page fetcher
///
/// Each call is bounded by a fixed timeout. There are no retries. Failures
/// are returned to the caller; the crawl loop runs fetches through
/// [`BatchScheduler::process_with_fallback`](crate::crawler::BatchScheduler::process_with_fallback),
/// which logs them and substitutes [`DetailFields::unknown`].
pub struct DetailFetcher<'a> {
    client: &'a Client,
    parser: &'a dyn PageParser,
    labels: &'a DetailLabels,
    timeout: Duration,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(
        client: &'a Client,
        parser: &'a dyn PageParser,
        labels: &'a DetailLabels,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            parser,
            labels,
            timeout,
        }
    }

    /// Fetches a detail page and extracts its enrichment fields
    ///
    /// An empty URL yields unknown fields without a request.
    ///
    /// # Returns
    ///
    /// * `Ok(DetailFields)` - The page was fetched; fields may still be unknown
    /// * `Err(HarvestError::Timeout)` - The fetch outlived the per-call timeout
    /// * `Err(HarvestError)` - Transport failure or non-success status
    pub async fn try_fetch(&self, url: &str) -> Result<DetailFields> {
        if url.is_empty() {
            return Ok(DetailFields::unknown());
        }

        tracing::debug!("Fetching detail page {}", url);

        let body = tokio::time::timeout(self.timeout, fetch_listing(self.client, url))
            .await
            .map_err(|_| HarvestError::Timeout {
                url: url.to_string(),
            })??;

        let fields = self.parser.parse_detail(&body);
        let detail = extract_detail_fields(&fields, self.labels);
        if detail.location.is_empty() {
            tracing::debug!("No location found on {}", url);
        }

        Ok(detail)
    }
}
