//! The backend's HTTP surface, one constructor per endpoint.
//!
//! Constructors only describe a request; nothing is sent until the [`ApiCall`] is handed to a
//! [`Transport`].
//!
//! [`Transport`]: ../trait.Transport.html

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use url::Url;

use crate::result::RequestResult;

/// Which configured timeout a call runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Standard,
    Quick,
    Fetch,
    Analysis,
    Report,
}

/// A single request against the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: Method,
    /// Unencoded path segments, e.g. `["api", "engine", "analyze", "BRK B"]`.
    pub segments: Vec<String>,
    /// Keep the trailing `/` (`/health/` is not `/health`).
    pub trailing_slash: bool,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub deadline: Deadline,
}

impl ApiCall {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            trailing_slash: path.ends_with('/'),
            query: Vec::new(),
            body: None,
            deadline: Deadline::Standard,
        }
    }

    fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    fn post(path: &str, body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::new(Method::POST, path)
        }
    }

    fn segment(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    fn deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Full URL below `base`, with every segment and query value percent-encoded.
    pub fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            path.pop_if_empty();
            path.extend(&self.segments);
            if self.trailing_slash {
                path.push("");
            }
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method, self.segments.join("/"))?;
        if self.trailing_slash {
            write!(f, "/")?;
        }
        Ok(())
    }
}

/// One news item as the backend ingests it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NewsSubmission {
    pub ticker: String,
    pub title: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

// -------------------------------------------------------------------------------------------------
// health

pub fn health_live() -> ApiCall {
    ApiCall::get("/health/live")
}

pub fn health_details() -> ApiCall {
    ApiCall::get("/health/")
}

/// `true` when a liveness probe answered 200 with `"alive": true`.
pub fn is_alive(result: &RequestResult) -> bool {
    result.status_code() == 200 && result.doc().flag("alive")
}

// -------------------------------------------------------------------------------------------------
// engine

pub fn rate_limit() -> ApiCall {
    ApiCall::get("/api/engine/rate-limit").deadline(Deadline::Quick)
}

pub fn submit_news(items: &[NewsSubmission], request_analysis: bool) -> ApiCall {
    ApiCall::post(
        "/api/engine/news",
        json!({ "items": items, "request_analysis": request_analysis }),
    )
}

pub fn cached_news(ticker: Option<&str>, limit: u32) -> ApiCall {
    let call = ApiCall::get("/api/engine/news").param("limit", limit);
    match ticker.filter(|t| !t.is_empty()) {
        Some(ticker) => call.param("ticker", ticker),
        None => call,
    }
}

pub fn analyze(tickers: &[String], language: &str) -> ApiCall {
    ApiCall::post(
        "/api/engine/analyze",
        json!({ "tickers": tickers, "language": language }),
    )
    .deadline(Deadline::Analysis)
}

pub fn cached_analysis(ticker: &str) -> ApiCall {
    ApiCall::get("/api/engine/analyze").segment(ticker)
}

pub fn fetch_news(tickers: &[String], max_per_ticker: u32) -> ApiCall {
    ApiCall::post(
        "/api/engine/fetch",
        json!({ "tickers": tickers, "max_per_ticker": max_per_ticker }),
    )
    .deadline(Deadline::Fetch)
}

// -------------------------------------------------------------------------------------------------
// lookups

pub fn resolve_ticker(query: &str) -> ApiCall {
    ApiCall::get("/resolve/ticker").param("query", query)
}

pub fn resolve_sector(query: &str) -> ApiCall {
    ApiCall::get("/resolve/sector").param("query", query)
}

pub fn fundamentals(ticker: &str) -> ApiCall {
    ApiCall::get("/api/fundamentals").param("ticker", ticker)
}

pub fn price_history(ticker: &str, period: &str) -> ApiCall {
    ApiCall::get("/api/price_history")
        .param("ticker", ticker)
        .param("period", period)
}

pub fn sector_news(sector: &str) -> ApiCall {
    ApiCall::get("/api/sector_news").param("sector", sector)
}

/// The language travels as a query parameter; the body only names the stocks.
pub fn full_report(tickers: &[String], language: &str) -> ApiCall {
    ApiCall::post("/analyze/full_report", json!({ "query_stocks": tickers }))
        .param("language", language)
        .deadline(Deadline::Report)
}
