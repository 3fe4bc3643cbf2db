//! Observable view state and the records it is built from.

use newsdesk_common::{interp, Doc, Profile};
use std::collections::VecDeque;
use std::fmt;

/// Activity log capacity; the oldest entry is evicted first.
pub const ACTIVITY_LOG_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartPeriod {
    Day,
    Week,
    Month,
    Quarter,
    #[default]
    Year,
    Decade,
}

impl ChartPeriod {
    pub const ALL: [ChartPeriod; 6] = [
        ChartPeriod::Day,
        ChartPeriod::Week,
        ChartPeriod::Month,
        ChartPeriod::Quarter,
        ChartPeriod::Year,
        ChartPeriod::Decade,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartPeriod::Day => "24h",
            ChartPeriod::Week => "1w",
            ChartPeriod::Month => "1m",
            ChartPeriod::Quarter => "3m",
            ChartPeriod::Year => "1y",
            ChartPeriod::Decade => "10y",
        }
    }

    /// Case-insensitive; also accepts the backend's long forms (`1wk`, `1mo`, `3mo`).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "24h" | "1d" => Some(ChartPeriod::Day),
            "1w" | "1wk" => Some(ChartPeriod::Week),
            "1m" | "1mo" => Some(ChartPeriod::Month),
            "3m" | "3mo" => Some(ChartPeriod::Quarter),
            "1y" => Some(ChartPeriod::Year),
            "10y" => Some(ChartPeriod::Decade),
            _ => None,
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chart sample. `label` is a date, or an intraday time for the 24h chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub label: String,
    pub close: f64,
}

impl PricePoint {
    pub fn new(label: impl Into<String>, close: f64) -> Self {
        Self {
            label: label.into(),
            close,
        }
    }

    /// A `data[]` record from `/api/price_history`; `None` without a date and a close.
    pub fn from_record(record: &Doc) -> Option<Self> {
        let date = record.opt_text("date")?;
        let close = record.float("close")?;
        let label = record.opt_text("time").unwrap_or(date);
        Some(Self { label, close })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub ticker: String,
    pub title: String,
    pub source: String,
    pub date: String,
}

impl NewsItem {
    pub fn new(
        ticker: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            title: title.into(),
            source: source.into(),
            date: date.into(),
        }
    }

    /// An `items[]` record. Untitled records are dropped; the remaining fields default to
    /// `ticker`, `Unknown` and `Just now`. `published` wins over `date` and timestamps are
    /// cut to their `YYYY-MM-DD` prefix.
    pub fn from_record(record: &Doc, ticker: &str) -> Option<Self> {
        let title = record.opt_text("title")?;
        let date = record
            .opt_text("published")
            .or_else(|| record.opt_text("date"))
            .map(|d| d.chars().take(10).collect::<String>())
            .unwrap_or_else(|| "Just now".to_string());
        Some(Self {
            ticker: record.opt_text("ticker").unwrap_or_else(|| ticker.to_string()),
            title,
            source: record
                .opt_text("source")
                .unwrap_or_else(|| "Unknown".to_string()),
            date,
        })
    }
}

impl fmt::Display for NewsItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.ticker, self.title, self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorNewsItem {
    pub title: String,
    pub source: String,
    pub date: String,
}

impl SectorNewsItem {
    pub fn from_record(record: &Doc) -> Option<Self> {
        Some(Self {
            title: record.opt_text("title")?,
            source: record.text("source"),
            date: record.text("date"),
        })
    }
}

impl fmt::Display for SectorNewsItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.source)
    }
}

/// Display-ready fundamentals. Metrics default to `-`, summaries to empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fundamentals {
    pub pe_ratio: String,
    pub peg_ratio: String,
    pub roe: String,
    pub debt_to_equity: String,
    pub target_mean: String,
    pub target_high: String,
    pub target_low: String,
    pub recommendation: String,
    pub business_summary: String,
    pub executive_summary: String,
}

impl Default for Fundamentals {
    fn default() -> Self {
        Self {
            pe_ratio: interp::MISSING.to_string(),
            peg_ratio: interp::MISSING.to_string(),
            roe: interp::MISSING.to_string(),
            debt_to_equity: interp::MISSING.to_string(),
            target_mean: interp::MISSING.to_string(),
            target_high: interp::MISSING.to_string(),
            target_low: interp::MISSING.to_string(),
            recommendation: interp::MISSING.to_string(),
            business_summary: String::new(),
            executive_summary: String::new(),
        }
    }
}

impl Fundamentals {
    pub fn from_doc(doc: &Doc) -> Self {
        let recommendation = doc.text("recommendation").to_uppercase();
        Self {
            pe_ratio: doc.number("pe_ratio"),
            peg_ratio: doc.number("peg_ratio"),
            roe: decorate(doc.number("roe"), "", "%"),
            debt_to_equity: doc.number("debt_to_equity"),
            target_mean: decorate(doc.number("target_mean_price"), "$", ""),
            target_high: decorate(doc.number("target_high_price"), "$", ""),
            target_low: decorate(doc.number("target_low_price"), "$", ""),
            recommendation: if recommendation.is_empty() {
                interp::MISSING.to_string()
            } else {
                recommendation
            },
            business_summary: doc.text("business_summary"),
            executive_summary: doc.text("executive_summary"),
        }
    }
}

// placeholders stay bare
fn decorate(value: String, prefix: &str, suffix: &str) -> String {
    if value == interp::MISSING || value == interp::NOT_APPLICABLE {
        value
    } else {
        format!("{prefix}{value}{suffix}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        })
    }
}

/// The user-visible activity log, bounded at [`ACTIVITY_LOG_CAPACITY`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityLog {
    entries: VecDeque<String>,
}

impl ActivityLog {
    /// Append `[HH:MM:SS.mmm] [LEVEL] message`, mirroring it to the `log` facade.
    pub fn push(&mut self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        match level {
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Warn => log::warn!("{message}"),
            LogLevel::Error => log::error!("{message}"),
            LogLevel::Debug => log::debug!("{message}"),
        }
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        self.entries.push_back(format!("[{timestamp}] [{level}] {message}"));
        while self.entries.len() > ACTIVITY_LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.entries.iter().map(String::as_str)
    }

    /// The newest `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &str> {
        self.iter().skip(self.len().saturating_sub(n))
    }
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub connected: bool,
    pub loading: bool,
    pub rate_limited: bool,
    pub status_message: String,
    pub rate_limit_message: String,

    pub selected_ticker: String,
    pub selected_sector: String,
    pub selected_language: String,

    pub fundamentals: Fundamentals,
    pub analysis_result: String,
    pub report_path: String,

    pub chart_period: ChartPeriod,
    pub price_history: Vec<PricePoint>,
    pub chart_date_label: String,
    pub chart_is_historical: bool,
    /// The chart currently shows generated data, not the backend's.
    pub chart_is_mock: bool,

    pub news_items: Vec<NewsItem>,
    pub sector_news: Vec<SectorNewsItem>,
    pub activity_log: ActivityLog,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_profile(&Profile::default())
    }
}

impl ViewState {
    pub fn from_profile(profile: &Profile) -> Self {
        let chart_period = ChartPeriod::parse(&profile.chart_period).unwrap_or_else(|| {
            log::warn!(
                "unknown chart period {:?} in profile; using {}",
                profile.chart_period,
                ChartPeriod::default()
            );
            ChartPeriod::default()
        });
        Self {
            connected: false,
            loading: false,
            rate_limited: false,
            status_message: "Not connected".to_string(),
            rate_limit_message: String::new(),
            selected_ticker: profile.ticker.clone(),
            selected_sector: profile.sector.clone(),
            selected_language: profile.language.clone(),
            fundamentals: Fundamentals::default(),
            analysis_result: String::new(),
            report_path: String::new(),
            chart_period,
            price_history: Vec::new(),
            chart_date_label: String::new(),
            chart_is_historical: false,
            chart_is_mock: false,
            news_items: Vec::new(),
            sector_news: Vec::new(),
            activity_log: ActivityLog::default(),
        }
    }
}
