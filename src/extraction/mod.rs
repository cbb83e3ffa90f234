use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::Instrument;

use crate::telemetry;
use crate::telemetry::ops::extract::Phase as ExtractPhase;

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod markup;
#[cfg(test)]
pub(crate) mod testing;

use config::ExtractorConfig;
use error::ExtractError;
use extractor::{ExtractionRequest, Route, generic, linkedin};
use fetch::{Fetch, HeaderProfile, HttpFetcher};

#[derive(Args)]
pub struct ExtractCmd {
    /// Page or job posting to extract
    pub url: String,
    /// Override JOBTEXT_TIMEOUT_SECS
    #[arg(long)] pub timeout_secs: Option<u64>,
}

#[derive(Serialize)]
struct ExtractResult<'a> {
    url: &'a str,
    route: &'static str,
    chars: usize,
    text: &'a str,
}

pub async fn run(args: ExtractCmd) -> Result<()> {
    let log = telemetry::extract();
    let _g = log.root_span_kv([
        ("url", args.url.clone()),
        ("timeout_secs", format!("{:?}", args.timeout_secs)),
    ]).entered();

    let mut cfg = ExtractorConfig::from_env();
    if let Some(secs) = args.timeout_secs.filter(|s| *s > 0) {
        cfg.timeout = std::time::Duration::from_secs(secs);
    }

    let text = match Extractor::from_config(cfg) {
        Ok(ex) => ex.extract(&args.url).await,
        Err(err) => err.into_outcome(),
    };

    let route = match extractor::route::route_for(&args.url) {
        Route::Generic => "generic",
        Route::LinkedInJob { .. } => "linkedin_job",
    };
    log.result(&ExtractResult { url: &args.url, route, chars: text.chars().count(), text: &text })?;
    Ok(())
}

/// Turns a URL into the best text available for it.
///
/// Platform URLs go to their dedicated extractor; everything else is fetched
/// once and reduced to visible text. Failures never escape [`Extractor::extract`]:
/// they come back as a message prefixed with `Error fetching URL:` or
/// `Error processing URL:`.
pub struct Extractor<F: Fetch = HttpFetcher> {
    fetcher: F,
    cfg: ExtractorConfig,
}

impl Extractor<HttpFetcher> {
    pub fn from_config(cfg: ExtractorConfig) -> Result<Self, ExtractError> {
        let fetcher = HttpFetcher::new(&cfg)?;
        Ok(Self { fetcher, cfg })
    }
}

impl<F: Fetch> Extractor<F> {
    pub fn with_fetcher(fetcher: F, cfg: ExtractorConfig) -> Self {
        Self { fetcher, cfg }
    }

    /// Always returns non-empty text.
    pub async fn extract(&self, url: &str) -> String {
        match self.try_extract(url).await {
            Ok(text) => text,
            Err(err) => {
                telemetry::extract().warn_kv("extraction failed", [("url", url.to_string()), ("error", err.to_string())]);
                err.into_outcome()
            }
        }
    }

    pub async fn try_extract(&self, url: &str) -> Result<String, ExtractError> {
        let log = telemetry::extract();
        let req = {
            let _s = log.span(&ExtractPhase::Route).entered();
            ExtractionRequest::parse(url)?
        };
        log.debug_kv("routed", [("url", req.original().to_string()), ("route", format!("{:?}", req.route()))]);

        match req.route() {
            Route::LinkedInJob { job_id } => {
                Ok(linkedin::extract_job(&self.fetcher, &self.cfg, job_id.as_deref(), req.original()).await)
            }
            Route::Generic => {
                let res = self
                    .fetcher
                    .get(req.url().as_str(), HeaderProfile::Browser)
                    .instrument(log.span_kv(&ExtractPhase::Fetch, [("url", req.url().to_string())]))
                    .await?;
                let content_type = res
                    .headers
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown")
                    .to_string();
                log.debug_kv("fetched", [
                    ("status", res.status.as_u16().to_string()),
                    ("content_type", content_type),
                    ("bytes", res.body.len().to_string()),
                ]);

                let text = {
                    let _s = log.span_kv(&ExtractPhase::Strategy, [("strategy", "generic".to_string())]).entered();
                    generic::scrape_generic(&res.body)
                };
                if text.is_empty() {
                    return Err(ExtractError::Parse(format!(
                        "no visible text in {} response from {}",
                        res.status,
                        req.original()
                    )));
                }
                Ok(text)
            }
        }
    }
}

/// One-shot extraction with configuration taken from the environment.
pub async fn extract_text(url: &str) -> String {
    match Extractor::from_config(ExtractorConfig::from_env()) {
        Ok(ex) => ex.extract(url).await,
        Err(err) => err.into_outcome(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::time::Duration;
    use super::testing::{Reply, StubFetcher, serve_once, stall};

    const PLATFORM_URL: &str = "https://www.linkedin.com/jobs/view/4012345";

    fn stubbed(reply: Reply) -> Extractor<StubFetcher> {
        Extractor::with_fetcher(StubFetcher::new(reply), ExtractorConfig::default())
    }

    #[tokio::test]
    async fn generic_page_end_to_end() {
        let ex = stubbed(Reply::Ok(
            StatusCode::OK,
            "<html><body><script>x()</script><h1>Backend Engineer</h1><p>We build systems.</p></body></html>",
        ));
        let out = ex.extract("https://example.com/careers/123").await;
        assert_eq!(out, "Backend Engineer\nWe build systems.");
        assert_eq!(ex.fetcher.calls(), vec![("https://example.com/careers/123".to_string(), HeaderProfile::Browser)]);
    }

    #[tokio::test]
    async fn platform_title_only_end_to_end() {
        let ex = stubbed(Reply::Ok(StatusCode::OK, r#"<h1 class="top-card-layout__title">Platform Engineer</h1>"#));
        let out = ex.extract(PLATFORM_URL).await;
        assert_eq!(
            out,
            "Job Title: Platform Engineer\nCompany: Unknown Company\nLocation: Unknown Location\n\nJob Description:\n\n\nOriginal URL: https://www.linkedin.com/jobs/view/4012345"
        );
        let calls = ex.fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://www.linkedin.com/jobs-guest/jobs/api/jobPosting/4012345");
        assert_ne!(calls[0].0, PLATFORM_URL);
    }

    #[tokio::test]
    async fn platform_connection_failure_end_to_end() {
        let ex = stubbed(Reply::ConnectionRefused);
        let out = ex.extract(PLATFORM_URL).await;
        assert_eq!(out, linkedin::guidance_message(Some("4012345"), PLATFORM_URL));
        assert!(out.contains("4012345"));
        assert!(out.contains(PLATFORM_URL));
    }

    #[tokio::test]
    async fn http_status_is_reported_as_fetch_error() {
        let ex = stubbed(Reply::Ok(StatusCode::FORBIDDEN, ""));
        let out = ex.extract("https://example.com/private").await;
        assert!(out.starts_with("Error fetching URL: 403 Forbidden"), "{out}");
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_network() {
        let ex = stubbed(Reply::Ok(StatusCode::OK, "<p>x</p>"));
        let out = ex.extract("definitely not a url").await;
        assert!(out.starts_with("Error processing URL: invalid URL"), "{out}");
        assert!(ex.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn textless_page_still_yields_message() {
        let ex = stubbed(Reply::Ok(StatusCode::OK, "<html><head><script>1</script></head><body></body></html>"));
        let out = ex.extract("https://example.com/blank").await;
        assert!(out.starts_with("Error processing URL: no visible text"), "{out}");
    }

    #[tokio::test]
    async fn outcome_is_never_empty() {
        let inputs = ["", " ", "https://", "https://example.com/", PLATFORM_URL, "https://www.linkedin.com/jobs/view/"];
        for reply in [Reply::Ok(StatusCode::OK, ""), Reply::ConnectionRefused] {
            let ex = stubbed(reply);
            for url in inputs {
                assert!(!ex.extract(url).await.trim().is_empty(), "empty outcome for {url:?}");
            }
        }
    }

    #[tokio::test]
    async fn timeout_on_generic_url() {
        let url = stall().await;
        let cfg = ExtractorConfig { timeout: Duration::from_millis(300), ..ExtractorConfig::default() };
        let out = Extractor::from_config(cfg).unwrap().extract(&url).await;
        assert!(out.starts_with("Error fetching URL:"), "{out}");
        assert!(out.contains("timed out"), "{out}");
    }

    #[tokio::test]
    async fn real_http_generic_fetch() {
        let (url, request) = serve_once("200 OK", "<h1>Hi</h1><style>h1{}</style><p>there</p>").await;
        let out = Extractor::from_config(ExtractorConfig::default()).unwrap().extract(&url).await;
        assert_eq!(out, "Hi\nthere");
        assert!(request.await.unwrap().starts_with("GET / HTTP/1.1"));
    }

    #[tokio::test]
    async fn real_http_guest_endpoint() {
        let (base, request) = serve_once("200 OK", r#"<h1 class="top-card-layout__title">Engineer</h1><a class="topcard__org-name-link">Acme</a>"#).await;
        let cfg = ExtractorConfig { guest_api_base: format!("{base}jobPosting"), ..ExtractorConfig::default() };
        let out = Extractor::from_config(cfg).unwrap().extract(PLATFORM_URL).await;
        assert!(out.starts_with("Job Title: Engineer\nCompany: Acme\n"), "{out}");
        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /jobPosting/4012345 HTTP/1.1"), "{raw}");
        assert!(raw.to_ascii_lowercase().contains("pragma: no-cache"));
    }
}
