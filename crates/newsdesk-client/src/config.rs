use std::time::Duration;

use crate::endp::Deadline;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Connection settings for the analytics backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Timeout for ordinary lookups.
    pub timeout: Duration,
    /// Timeout for the rate-limit probe.
    pub quick_timeout: Duration,
    /// Timeout for pulling news from external sources.
    pub fetch_timeout: Duration,
    /// Timeout for a full AI analysis.
    pub analysis_timeout: Duration,
    /// Timeout for generating the HTML report.
    pub report_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            quick_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(60),
            analysis_timeout: Duration::from_secs(2 * 60),
            report_timeout: Duration::from_secs(5 * 60),
            user_agent: format!("newsdesk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `NEWSDESK_API_URL`, `NEWSDESK_TIMEOUT_SECS` and `USER_AGENT`
    /// where those are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("NEWSDESK_API_URL") {
            config.base_url = url;
        }
        if let Ok(secs) = std::env::var("NEWSDESK_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(e) => log::warn!("ignoring NEWSDESK_TIMEOUT_SECS={secs:?}: {e}"),
            }
        }
        if let Ok(agent) = std::env::var("USER_AGENT") {
            config.user_agent = agent;
        }
        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_for(&self, deadline: Deadline) -> Duration {
        match deadline {
            Deadline::Standard => self.timeout,
            Deadline::Quick => self.quick_timeout,
            Deadline::Fetch => self.fetch_timeout,
            Deadline::Analysis => self.analysis_timeout,
            Deadline::Report => self.report_timeout,
        }
    }
}
