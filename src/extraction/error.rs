use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures inside the extraction pipeline. These never cross the public
/// boundary: `Extractor::extract` folds them into the outcome text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{status} for url ({url})")]
    HttpStatus { url: String, status: StatusCode },

    #[error("{0}")]
    Parse(String),

    #[error("http client unavailable: {0}")]
    Client(String),
}

impl ExtractError {
    pub fn from_reqwest(url: &str, err: reqwest::Error, timeout: Duration) -> Self {
        let reason = if err.is_timeout() {
            format!("timed out after {timeout:?} ({err})")
        } else if err.is_connect() {
            format!("connection failed ({err})")
        } else {
            err.to_string()
        };
        ExtractError::Fetch { url: url.to_string(), reason }
    }

    /// Network and status failures are reported as fetch errors; everything
    /// else is a processing error.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ExtractError::Fetch { .. } | ExtractError::HttpStatus { .. })
    }

    pub fn into_outcome(self) -> String {
        if self.is_fetch() {
            format!("Error fetching URL: {self}")
        } else {
            format!("Error processing URL: {self}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_collapse_to_fetch_prefix() {
        let err = ExtractError::HttpStatus { url: "https://example.com/x".into(), status: StatusCode::NOT_FOUND };
        assert_eq!(err.into_outcome(), "Error fetching URL: 404 Not Found for url (https://example.com/x)");
    }

    #[test]
    fn parse_errors_collapse_to_processing_prefix() {
        let err = ExtractError::Parse("no visible text".into());
        assert_eq!(err.into_outcome(), "Error processing URL: no visible text");
    }

    #[test]
    fn invalid_url_is_not_a_fetch_error() {
        let err = ExtractError::InvalidUrl { url: "nope".into(), reason: "relative URL without a base".into() };
        assert!(!err.is_fetch());
        assert!(err.into_outcome().starts_with("Error processing URL: invalid URL"));
    }
}
