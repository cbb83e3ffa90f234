use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::extraction::error::ExtractError;

const LINKEDIN_JOB_VIEW: &str = "linkedin.com/jobs/view/";

fn linkedin_job_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // plain numeric ids and "<slug>-<id>" path segments
    RE.get_or_init(|| Regex::new(r"linkedin\.com/jobs/view/(?:[^/?#]*-)?(\d+)").expect("static regex"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Generic,
    LinkedInJob { job_id: Option<String> },
}

/// A validated URL together with the path chosen for it.
#[derive(Clone, Debug)]
pub struct ExtractionRequest {
    url: Url,
    raw: String,
    route: Route,
}

impl ExtractionRequest {
    pub fn parse(raw: &str) -> Result<Self, ExtractError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed)
            .map_err(|e| ExtractError::InvalidUrl { url: raw.to_string(), reason: e.to_string() })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        let route = route_for(trimmed);
        Ok(Self { url, raw: trimmed.to_string(), route })
    }

    pub fn url(&self) -> &Url { &self.url }

    /// The URL as the caller supplied it, echoed back in outcomes.
    pub fn original(&self) -> &str { &self.raw }

    pub fn route(&self) -> &Route { &self.route }
}

pub fn route_for(url: &str) -> Route {
    if !url.contains(LINKEDIN_JOB_VIEW) {
        return Route::Generic;
    }
    let job_id = linkedin_job_id_re()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    Route::LinkedInJob { job_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_job_view_is_platform() {
        assert_eq!(
            route_for("https://www.linkedin.com/jobs/view/4012345"),
            Route::LinkedInJob { job_id: Some("4012345".into()) }
        );
        assert_eq!(
            route_for("https://www.linkedin.com/jobs/view/4012345/?refId=abc"),
            Route::LinkedInJob { job_id: Some("4012345".into()) }
        );
    }

    #[test]
    fn slugged_job_view_yields_trailing_id() {
        assert_eq!(
            route_for("https://www.linkedin.com/jobs/view/senior-rust-engineer-at-acme-3987654321"),
            Route::LinkedInJob { job_id: Some("3987654321".into()) }
        );
    }

    #[test]
    fn job_view_without_id_still_routes_to_platform() {
        assert_eq!(route_for("https://www.linkedin.com/jobs/view/"), Route::LinkedInJob { job_id: None });
    }

    #[test]
    fn other_urls_are_generic() {
        assert_eq!(route_for("https://example.com/careers/123"), Route::Generic);
        assert_eq!(route_for("https://www.linkedin.com/company/acme"), Route::Generic);
    }

    #[test]
    fn request_rejects_malformed_and_non_http() {
        assert!(matches!(ExtractionRequest::parse("not a url"), Err(ExtractError::InvalidUrl { .. })));
        assert!(matches!(ExtractionRequest::parse("ftp://example.com/x"), Err(ExtractError::InvalidUrl { .. })));
        let req = ExtractionRequest::parse(" https://example.com/careers/123 ").unwrap();
        assert_eq!(req.original(), "https://example.com/careers/123");
        assert_eq!(req.route(), &Route::Generic);
    }
}
