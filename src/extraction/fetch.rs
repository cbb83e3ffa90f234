use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};

use super::config::{DEFAULT_USER_AGENT, ExtractorConfig};
use super::error::ExtractError;

/// Header sets sent with outbound requests.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderProfile {
    Browser,
    /// Browser headers plus cache busting, used against the guest API.
    BrowserNoCache,
}

#[derive(Debug)]
pub struct FetchResult {
    pub status: StatusCode,
    pub body: String,
    pub headers: HeaderMap,
}

#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str, profile: HeaderProfile) -> Result<FetchResult, ExtractError>;
}

pub struct HttpFetcher {
    client: Client,
    user_agent: HeaderValue,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(cfg: &ExtractorConfig) -> Result<Self, ExtractError> {
        // no idle connections are kept: every call opens its own
        let client = Client::builder()
            .timeout(cfg.timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ExtractError::Client(e.to_string()))?;
        let user_agent = HeaderValue::from_str(&cfg.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
        Ok(Self { client, user_agent, timeout: cfg.timeout })
    }

    fn headers(&self, profile: HeaderProfile) -> HeaderMap {
        build_headers(self.user_agent.clone(), profile)
    }
}

pub fn build_headers(user_agent: HeaderValue, profile: HeaderProfile) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::USER_AGENT, user_agent);
    h.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    h.insert(header::ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml"));
    h.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));
    h.insert(header::DNT, HeaderValue::from_static("1"));
    if profile == HeaderProfile::BrowserNoCache {
        h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        h.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    }
    h
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str, profile: HeaderProfile) -> Result<FetchResult, ExtractError> {
        let resp = self
            .client
            .get(url)
            .headers(self.headers(profile))
            .send()
            .await
            .map_err(|e| ExtractError::from_reqwest(url, e, self.timeout))?;

        let status = resp.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(ExtractError::HttpStatus { url: url.to_string(), status });
        }
        let headers = resp.headers().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| ExtractError::from_reqwest(url, e, self.timeout))?;
        Ok(FetchResult { status, body, headers })
    }
}
