use std::env;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_GUEST_API_BASE: &str = "https://www.linkedin.com/jobs-guest/jobs/api/jobPosting";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub guest_api_base: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            guest_api_base: DEFAULT_GUEST_API_BASE.to_string(),
        }
    }
}

impl ExtractorConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(timeout) = env::var("JOBTEXT_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                if parsed > 0 { cfg.timeout = Duration::from_secs(parsed); }
            }
        }
        if let Ok(ua) = env::var("JOBTEXT_USER_AGENT") {
            if !ua.trim().is_empty() { cfg.user_agent = ua; }
        }
        if let Ok(base) = env::var("JOBTEXT_GUEST_API_BASE") {
            if !base.trim().is_empty() { cfg.guest_api_base = base; }
        }
        cfg
    }

    pub fn guest_posting_url(&self, job_id: &str) -> String {
        format!("{}/{}", self.guest_api_base.trim_end_matches('/'), job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_url_joins_base_and_id() {
        let cfg = ExtractorConfig::default();
        assert_eq!(
            cfg.guest_posting_url("4012345"),
            "https://www.linkedin.com/jobs-guest/jobs/api/jobPosting/4012345"
        );
    }

    #[test]
    fn guest_url_tolerates_trailing_slash() {
        let cfg = ExtractorConfig { guest_api_base: "http://127.0.0.1:9/api/".into(), ..ExtractorConfig::default() };
        assert_eq!(cfg.guest_posting_url("7"), "http://127.0.0.1:9/api/7");
    }
}
