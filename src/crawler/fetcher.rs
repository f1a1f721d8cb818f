//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building HTTP clients with the fixed browser-like header set
//! - GET requests with cookies and a per-request timeout
//! - Retry with Fibonacci backoff on any failure
//! - Optional rotation through a proxy pool
//!
//! Fetch failures are values, not errors: after the last attempt the caller
//! receives a [`FetchFailure`] and decides whether to skip or abort.

use crate::config::{Config, HeaderConfig, StrategyKind};
use crate::crawler::backoff::backoff_delay;
use crate::crawler::pause::Pause;
use crate::crawler::proxy::ProxyPool;
use crate::{ConfigError, HarvestError};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use scraper::Html;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The response a page was parsed from
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Page body content
    pub body: String,
}

/// A successfully fetched and parsed page
pub struct FetchedPage {
    pub document: Html,
    pub raw: RawResponse,
}

impl std::fmt::Debug for FetchedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedPage")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

/// Absent result of a fetch whose attempts were all exhausted
#[derive(Debug, Clone, Error)]
#[error("failed to fetch {url} after {attempts} attempts: {last_error}")]
pub struct FetchFailure {
    pub url: String,
    pub attempts: u32,
    pub last_error: String,
}

/// How each attempt reaches the network
enum Route {
    /// Same proxy-less client on every attempt
    Direct(Client),
    /// One client per pool entry, chosen by the pool
    Rotating { pool: ProxyPool, clients: Vec<Client> },
}

/// Page fetcher with retry/backoff, polymorphic over the strategy
pub struct Fetcher {
    route: Route,
    retries: u32,
    cookie_header: Option<String>,
    pause: Arc<dyn Pause>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("strategy", &self.strategy())
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

/// Builds an HTTP client with the fixed header set and timeout
///
/// A `proxy` routes every request through that endpoint; without one the
/// client ignores any proxy from the environment.
pub fn build_http_client(
    headers: &HeaderConfig,
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<Client, HarvestError> {
    let mut builder = Client::builder()
        .default_headers(default_headers(headers)?)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true);

    builder = match proxy {
        Some(endpoint) => builder.proxy(Proxy::all(endpoint)?),
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

fn default_headers(config: &HeaderConfig) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        (header::USER_AGENT, &config.user_agent),
        (header::ACCEPT, &config.accept),
        (header::ACCEPT_LANGUAGE, &config.accept_language),
        (header::ACCEPT_ENCODING, &config.accept_encoding),
        (header::CONNECTION, &config.connection),
    ] {
        let value = HeaderValue::from_str(value).map_err(|e| {
            ConfigError::Validation(format!("Invalid {} header value: {}", name, e))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Renders a cookie mapping as a single `Cookie` header value
pub fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

impl Fetcher {
    /// Creates a fetcher using the strategy named in the configuration
    pub fn from_config(config: &Config, pause: Arc<dyn Pause>) -> Result<Self, HarvestError> {
        Self::new(config.scraper.strategy, config, pause)
    }

    /// Creates a fetcher for an explicit strategy
    ///
    /// Fails when the rotative strategy has no proxies or a client cannot
    /// be built; both are configuration errors.
    pub fn new(
        strategy: StrategyKind,
        config: &Config,
        pause: Arc<dyn Pause>,
    ) -> Result<Self, HarvestError> {
        let timeout = Duration::from_secs(config.scraper.timeout_seconds);

        let route = match strategy {
            StrategyKind::Standard => {
                Route::Direct(build_http_client(&config.headers, timeout, None)?)
            }
            StrategyKind::Rotative => {
                let pool = ProxyPool::new(config.scraper.proxies.iter().cloned()).ok_or_else(
                    || {
                        ConfigError::Validation(
                            "the rotative strategy requires at least one proxy".to_string(),
                        )
                    },
                )?;
                let clients = pool
                    .entries()
                    .iter()
                    .map(|entry| build_http_client(&config.headers, timeout, Some(&entry.endpoint)))
                    .collect::<Result<Vec<_>, _>>()?;
                Route::Rotating { pool, clients }
            }
        };

        Ok(Self {
            route,
            retries: config.scraper.retries.max(1),
            cookie_header: cookie_header(&config.cookies),
            pause,
        })
    }

    pub fn strategy(&self) -> StrategyKind {
        match self.route {
            Route::Direct(_) => StrategyKind::Standard,
            Route::Rotating { .. } => StrategyKind::Rotative,
        }
    }

    /// Proxy pool state, for the rotative strategy only
    pub fn proxy_pool(&self) -> Option<&ProxyPool> {
        match &self.route {
            Route::Direct(_) => None,
            Route::Rotating { pool, .. } => Some(pool),
        }
    }

    /// Fetches `url` with the configured cookies and retry count
    pub async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchFailure> {
        let cookies = self.cookie_header.clone();
        self.fetch_attempts(url, cookies, self.retries).await
    }

    /// Fetches `url` with explicit cookies and an optional retry count
    ///
    /// `retries` falls back to the configured value when `None`.
    pub async fn fetch_with(
        &mut self,
        url: &str,
        cookies: Option<&BTreeMap<String, String>>,
        retries: Option<u32>,
    ) -> Result<FetchedPage, FetchFailure> {
        let cookies = cookies.and_then(cookie_header);
        let retries = retries.unwrap_or(self.retries).max(1);
        self.fetch_attempts(url, cookies, retries).await
    }

    async fn fetch_attempts(
        &mut self,
        url: &str,
        cookies: Option<String>,
        retries: u32,
    ) -> Result<FetchedPage, FetchFailure> {
        tracing::info!("Fetching: {}", url);

        if let Route::Rotating { pool, .. } = &mut self.route {
            pool.reset();
        }

        let mut last_error = String::new();

        for attempt in 1..=retries {
            let (client, proxy) = self.next_client();
            match proxy {
                Some(proxy) => {
                    tracing::info!("Attempt {}/{} via proxy {}", attempt, retries, proxy)
                }
                None => tracing::debug!("Attempt {}/{}", attempt, retries),
            }

            match send_request(&client, url, cookies.as_deref()).await {
                Ok(raw) => {
                    tracing::info!("Successfully fetched {} ({})", url, raw.status);
                    let document = Html::parse_document(&raw.body);
                    return Ok(FetchedPage { document, raw });
                }
                Err(error) => {
                    tracing::error!(
                        "Error fetching {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        retries,
                        error
                    );
                    last_error = error;

                    if attempt < retries {
                        let wait = backoff_delay(attempt);
                        tracing::warn!("Retrying in {} seconds...", wait.as_secs());
                        self.pause.pause(wait).await;
                    }
                }
            }
        }

        tracing::error!("Failed to fetch {} after {} attempts", url, retries);
        Err(FetchFailure {
            url: url.to_string(),
            attempts: retries,
            last_error,
        })
    }

    /// Picks the client for the next attempt, advancing the proxy pool
    fn next_client(&mut self) -> (Client, Option<String>) {
        match &mut self.route {
            Route::Direct(client) => (client.clone(), None),
            Route::Rotating { pool, clients } => {
                let index = pool.select();
                (
                    clients[index].clone(),
                    pool.endpoint(index).map(str::to_string),
                )
            }
        }
    }
}

/// Issues a single GET; any non-2xx status is a failure
async fn send_request(
    client: &Client,
    url: &str,
    cookies: Option<&str>,
) -> Result<RawResponse, String> {
    let mut request = client.get(url);
    if let Some(cookies) = cookies {
        request = request.header(header::COOKIE, cookies);
    }

    let response = request.send().await.map_err(|e| describe_error(&e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP status {}", status));
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.text().await.map_err(|e| describe_error(&e))?;

    Ok(RawResponse {
        url: final_url,
        status: status.as_u16(),
        content_type,
        body,
    })
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}
