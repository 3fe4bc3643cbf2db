//! The dashboard's single source of truth.
//!
//! Every operation is split in two. A `begin` method (`check_connection()`,
//! `request_analysis()`, ...) updates the state for the start of the operation and hands back
//! a [`Pending`] request, or `None` when a guard stops it before any network traffic. Once the
//! request has been carried by a [`Transport`], [`ViewModel::complete()`] folds the
//! [`RequestResult`] into the state and returns any [`Followup`] work.
//!
//! Only the newest request of each [`OpKind`] may write to the state; older responses are
//! logged at DEBUG and dropped.
//!
//! [`Transport`]: ../../newsdesk_client/trait.Transport.html

use newsdesk_client::{endp, ApiCall, NewsSubmission, RequestResult};
use newsdesk_common::Doc;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;

use crate::countdown::{RateLimitCountdown, Tick};
use crate::fallback;
use crate::state::{
    ChartPeriod, Fundamentals, LogLevel, NewsItem, PricePoint, SectorNewsItem, ViewState,
};

/// Items per ticker requested from the news fetcher.
pub const FETCH_PER_TICKER: u32 = 50;
/// Items requested from the news cache.
pub const CACHED_NEWS_LIMIT: u32 = 50;

/// Shortest query worth sending to a resolver.
const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Connection,
    RateLimit,
    ResolveTicker,
    ResolveSector,
    Fundamentals,
    Analysis,
    CachedAnalysis,
    Report,
    FetchNews,
    CachedNews,
    SubmitNews,
    PriceHistory,
    SectorNews,
}

/// An operation in flight, with the inputs its completion needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    CheckConnection,
    RateLimitStatus,
    ResolveTicker { query: String },
    ResolveSector { query: String },
    LoadFundamentals { ticker: String },
    RequestAnalysis { ticker: String },
    CachedAnalysis { ticker: String },
    ExportReport { ticker: String },
    FetchNews { ticker: String },
    LoadCachedNews { ticker: String },
    SubmitNews { count: usize },
    PriceHistory { ticker: String, period: String },
    SectorNews { sector: String },
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Op::CheckConnection => OpKind::Connection,
            Op::RateLimitStatus => OpKind::RateLimit,
            Op::ResolveTicker { .. } => OpKind::ResolveTicker,
            Op::ResolveSector { .. } => OpKind::ResolveSector,
            Op::LoadFundamentals { .. } => OpKind::Fundamentals,
            Op::RequestAnalysis { .. } => OpKind::Analysis,
            Op::CachedAnalysis { .. } => OpKind::CachedAnalysis,
            Op::ExportReport { .. } => OpKind::Report,
            Op::FetchNews { .. } => OpKind::FetchNews,
            Op::LoadCachedNews { .. } => OpKind::CachedNews,
            Op::SubmitNews { .. } => OpKind::SubmitNews,
            Op::PriceHistory { .. } => OpKind::PriceHistory,
            Op::SectorNews { .. } => OpKind::SectorNews,
        }
    }
}

/// Identifies one issued request when its result comes back.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub op: Op,
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// A request the view model wants sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub ticket: Ticket,
    pub call: ApiCall,
}

impl Pending {
    pub fn op(&self) -> &Op {
        &self.ticket.op
    }
}

/// Work a completion leaves for whoever drives the view model.
#[derive(Debug, Clone, PartialEq)]
pub enum Followup {
    Issue(Pending),
    OpenReport(String),
    /// Tick [`ViewModel::tick_countdown()`] once a second with this epoch.
    StartCountdown { epoch: u64 },
    StopCountdown,
}

/// The result of feeding one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Running(u32),
    Expired,
    /// The tick belongs to a countdown that has since been replaced or stopped.
    Stale,
}

#[derive(Debug)]
pub struct ViewModel {
    state: ViewState,
    countdown: RateLimitCountdown,
    countdown_epoch: u64,
    latest: HashMap<OpKind, u64>,
    next_seq: u64,
    in_flight: usize,
    rng: StdRng,
}

impl ViewModel {
    pub fn new(state: ViewState) -> Self {
        Self::with_rng(state, StdRng::from_entropy())
    }

    /// A view model whose mock chart data is reproducible.
    pub fn with_seed(state: ViewState, seed: u64) -> Self {
        Self::with_rng(state, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut state: ViewState, rng: StdRng) -> Self {
        state.activity_log.push(LogLevel::Info, "Application started");
        Self {
            state,
            countdown: RateLimitCountdown::Inactive,
            countdown_epoch: 0,
            latest: HashMap::new(),
            next_seq: 0,
            in_flight: 0,
            rng,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn countdown(&self) -> RateLimitCountdown {
        self.countdown
    }

    pub fn countdown_epoch(&self) -> u64 {
        self.countdown_epoch
    }

    /// Requests issued and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn log(&mut self, level: LogLevel, message: impl AsRef<str>) {
        self.state.activity_log.push(level, message);
    }

    // ---------------------------------------------------------------------------------------------
    // selections

    pub fn set_ticker(&mut self, ticker: impl Into<String>) {
        self.state.selected_ticker = ticker.into();
    }

    pub fn set_sector(&mut self, sector: impl Into<String>) {
        self.state.selected_sector = sector.into();
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.state.selected_language = language.into();
    }

    pub fn set_chart_period(&mut self, period: ChartPeriod) {
        self.state.chart_period = period;
    }

    // ---------------------------------------------------------------------------------------------
    // operations

    pub fn check_connection(&mut self) -> Option<Pending> {
        self.set_status("Checking connection...");
        Some(self.begin(Op::CheckConnection, endp::health_live()))
    }

    pub fn check_rate_limit_status(&mut self) -> Option<Pending> {
        Some(self.begin(Op::RateLimitStatus, endp::rate_limit()))
    }

    /// Resolve the typed ticker text to a canonical symbol; queries shorter than two
    /// characters are ignored.
    pub fn resolve_ticker(&mut self) -> Option<Pending> {
        let query = self.state.selected_ticker.trim().to_string();
        if query.chars().count() < MIN_QUERY_LEN {
            return None;
        }
        self.set_status(format!("Resolving '{query}'..."));
        let call = endp::resolve_ticker(&query);
        Some(self.begin(Op::ResolveTicker { query }, call))
    }

    pub fn resolve_sector(&mut self) -> Option<Pending> {
        let query = self.state.selected_sector.trim().to_string();
        if query.chars().count() < MIN_QUERY_LEN {
            return None;
        }
        self.set_status(format!("Resolving sector '{query}'..."));
        let call = endp::resolve_sector(&query);
        Some(self.begin(Op::ResolveSector { query }, call))
    }

    pub fn load_fundamentals(&mut self) -> Option<Pending> {
        let ticker = self.state.selected_ticker.trim().to_string();
        if ticker.chars().count() < MIN_QUERY_LEN {
            return None;
        }
        self.set_status(format!("Loading fundamentals for {ticker}..."));
        let call = endp::fundamentals(&ticker);
        Some(self.begin(Op::LoadFundamentals { ticker }, call))
    }

    pub fn request_analysis(&mut self) -> Option<Pending> {
        let ticker = self.require_ticker()?;
        self.set_status("Requesting AI analysis...");
        self.log(LogLevel::Info, format!("Requesting analysis for {ticker}"));
        let call = endp::analyze(&[ticker.clone()], &self.state.selected_language);
        Some(self.begin(Op::RequestAnalysis { ticker }, call))
    }

    pub fn load_cached_analysis(&mut self) -> Option<Pending> {
        let ticker = self.require_ticker()?;
        self.set_status(format!("Loading cached analysis for {ticker}..."));
        let call = endp::cached_analysis(&ticker);
        Some(self.begin(Op::CachedAnalysis { ticker }, call))
    }

    pub fn export_html_report(&mut self) -> Option<Pending> {
        let ticker = self.require_ticker()?;
        self.set_status("Generating premium HTML report...");
        self.log(LogLevel::Info, format!("Generating HTML report for {ticker}"));
        let call = endp::full_report(&[ticker.clone()], &self.state.selected_language);
        Some(self.begin(Op::ExportReport { ticker }, call))
    }

    pub fn fetch_news(&mut self) -> Option<Pending> {
        let ticker = self.require_ticker()?;
        self.set_status("Fetching news from external sources...");
        self.log(LogLevel::Info, format!("Fetching news for {ticker}"));
        let call = endp::fetch_news(&[ticker.clone()], FETCH_PER_TICKER);
        Some(self.begin(Op::FetchNews { ticker }, call))
    }

    /// Cached news for the selected ticker, or for every ticker when none is selected.
    pub fn load_cached_news(&mut self) -> Option<Pending> {
        let ticker = self.state.selected_ticker.trim().to_string();
        self.set_status("Loading cached news...");
        let call = endp::cached_news(Some(&ticker), CACHED_NEWS_LIMIT);
        Some(self.begin(Op::LoadCachedNews { ticker }, call))
    }

    pub fn submit_news(
        &mut self,
        items: &[NewsSubmission],
        request_analysis: bool,
    ) -> Option<Pending> {
        if items.is_empty() {
            self.set_status("No news items to submit");
            return None;
        }
        self.set_status(format!("Submitting {} news items...", items.len()));
        let call = endp::submit_news(items, request_analysis);
        Some(self.begin(Op::SubmitNews { count: items.len() }, call))
    }

    /// Price history for the selected ticker and chart period. The chart is cleared at once.
    pub fn load_price_history(&mut self) -> Option<Pending> {
        let ticker = self.state.selected_ticker.trim().to_string();
        let period = self.state.chart_period.to_string();
        self.load_price_history_for(&ticker, &period)
    }

    /// Like [`load_price_history()`] for any ticker and period label; unknown periods fall back
    /// to generic mock data when the backend has nothing.
    ///
    /// [`load_price_history()`]: #method.load_price_history
    pub fn load_price_history_for(&mut self, ticker: &str, period: &str) -> Option<Pending> {
        self.state.price_history.clear();
        self.state.chart_is_mock = false;
        self.set_status(format!("Loading {period} prices for {ticker}..."));
        let call = endp::price_history(ticker, period);
        Some(self.begin(
            Op::PriceHistory {
                ticker: ticker.to_string(),
                period: period.to_string(),
            },
            call,
        ))
    }

    pub fn load_sector_news(&mut self) -> Option<Pending> {
        let sector = self.state.selected_sector.trim().to_string();
        if sector.is_empty() {
            return None;
        }
        self.set_status(format!("Loading {sector} news..."));
        let call = endp::sector_news(&sector);
        Some(self.begin(Op::SectorNews { sector }, call))
    }

    // ---------------------------------------------------------------------------------------------
    // completion

    /// Apply the result of a request issued by this view model.
    pub fn complete(&mut self, ticket: Ticket, result: RequestResult) -> Vec<Followup> {
        self.in_flight = self.in_flight.saturating_sub(1);

        let followups = if let Some(reason) = self.staleness(&ticket) {
            self.log(
                LogLevel::Debug,
                format!("Discarding stale {:?} response ({reason})", ticket.op.kind()),
            );
            Vec::new()
        } else {
            self.apply(ticket.op, result)
        };

        self.state.loading = self.in_flight > 0;
        followups
    }

    fn staleness(&self, ticket: &Ticket) -> Option<&'static str> {
        if self.latest.get(&ticket.op.kind()) != Some(&ticket.seq) {
            return Some("superseded");
        }
        match &ticket.op {
            Op::LoadFundamentals { ticker } | Op::PriceHistory { ticker, .. }
                if !ticker.eq_ignore_ascii_case(self.state.selected_ticker.trim()) =>
            {
                Some("ticker changed")
            }
            _ => None,
        }
    }

    fn apply(&mut self, op: Op, result: RequestResult) -> Vec<Followup> {
        match op {
            Op::CheckConnection => {
                self.finish_connection(&result);
                Vec::new()
            }
            Op::RateLimitStatus => self.finish_rate_limit(&result),
            Op::ResolveTicker { query } => self.finish_resolve_ticker(&query, &result),
            Op::ResolveSector { query } => {
                self.finish_resolve_sector(&query, &result);
                Vec::new()
            }
            Op::LoadFundamentals { ticker } => {
                self.finish_fundamentals(&ticker, &result);
                Vec::new()
            }
            Op::RequestAnalysis { ticker } => {
                self.finish_analysis(&ticker, &result, false);
                Vec::new()
            }
            Op::CachedAnalysis { ticker } => {
                self.finish_analysis(&ticker, &result, true);
                Vec::new()
            }
            Op::ExportReport { ticker } => self.finish_report(&ticker, &result),
            Op::FetchNews { ticker } => {
                self.finish_fetch_news(&ticker, &result);
                Vec::new()
            }
            Op::LoadCachedNews { ticker } => {
                self.finish_cached_news(&ticker, &result);
                Vec::new()
            }
            Op::SubmitNews { count } => {
                self.finish_submit_news(count, &result);
                Vec::new()
            }
            Op::PriceHistory { ticker, period } => {
                self.finish_price_history(&ticker, &period, &result);
                Vec::new()
            }
            Op::SectorNews { sector } => {
                self.finish_sector_news(&sector, &result);
                Vec::new()
            }
        }
    }

    fn finish_connection(&mut self, result: &RequestResult) {
        self.state.connected = endp::is_alive(result);
        if self.state.connected {
            self.set_status("Connected to AI Service");
            self.log(LogLevel::Info, "Connected to AI Service");
        } else {
            let reason = if result.is_success() {
                "service not alive"
            } else {
                result.error()
            };
            self.set_status("Connection failed");
            self.log(LogLevel::Error, format!("Connection failed: {reason}"));
        }
    }

    fn finish_rate_limit(&mut self, result: &RequestResult) -> Vec<Followup> {
        if !result.is_success() {
            self.log(
                LogLevel::Warn,
                format!("Rate limit status unavailable: {}", result.error()),
            );
            return Vec::new();
        }

        let doc = result.doc();
        if doc.flag("rate_limited") {
            let seconds = doc
                .integer("remaining_seconds")
                .unwrap_or(0)
                .clamp(0, u32::MAX as i64) as u32;
            self.log(LogLevel::Warn, format!("Rate limited for {seconds}s"));
            vec![self.start_countdown(seconds)]
        } else {
            vec![self.stop_countdown()]
        }
    }

    fn finish_resolve_ticker(&mut self, query: &str, result: &RequestResult) -> Vec<Followup> {
        if !result.is_success() {
            self.set_status(format!("Could not resolve '{query}': {}", result.error()));
            self.log(
                LogLevel::Error,
                format!("Ticker resolution failed for '{query}': {}", result.error()),
            );
            return Vec::new();
        }

        let doc = result.doc();
        if let Some(symbol) = doc.opt_text("symbol") {
            if symbol != query {
                self.log(LogLevel::Info, format!("Resolved '{query}' to {symbol}"));
                self.state.selected_ticker = symbol;
            }
        }
        if let Some(sector) = doc.opt_text("sector") {
            self.state.selected_sector = sector;
        }
        self.set_status(format!("Resolved {}", self.state.selected_ticker));
        self.load_fundamentals()
            .map(Followup::Issue)
            .into_iter()
            .collect()
    }

    fn finish_resolve_sector(&mut self, query: &str, result: &RequestResult) {
        if !result.is_success() {
            self.set_status(format!("Could not resolve sector '{query}': {}", result.error()));
            self.log(
                LogLevel::Warn,
                format!("Sector resolution failed for '{query}': {}", result.error()),
            );
            return;
        }

        if let Some(sector) = result.doc().opt_text("sector") {
            if !sector.eq_ignore_ascii_case(query) {
                self.log(LogLevel::Info, format!("Resolved sector '{query}' to {sector}"));
                self.state.selected_sector = sector;
            }
        }
        self.set_status(format!("Sector: {}", self.state.selected_sector));
    }

    fn finish_fundamentals(&mut self, ticker: &str, result: &RequestResult) {
        if result.is_success() {
            self.state.fundamentals = Fundamentals::from_doc(&result.doc());
            self.set_status(format!("Loaded fundamentals for {ticker}"));
            self.log(LogLevel::Info, format!("Loaded fundamentals for {ticker}"));
        } else {
            self.state.fundamentals = Fundamentals::default();
            self.set_status(format!("Fundamentals unavailable: {}", result.error()));
            self.log(
                LogLevel::Error,
                format!("Failed to load fundamentals for {ticker}: {}", result.error()),
            );
        }
    }

    fn finish_analysis(&mut self, ticker: &str, result: &RequestResult, cached: bool) {
        if result.is_success() {
            let body = result.body().unwrap_or_default();
            self.state.analysis_result = Doc::parse(body)
                .opt_text("essay")
                .unwrap_or_else(|| body.to_string());
            if cached {
                self.set_status("Loaded cached analysis");
                self.log(LogLevel::Info, format!("Loaded cached analysis for {ticker}"));
            } else {
                self.set_status("Analysis complete");
                self.log(LogLevel::Info, format!("Analysis completed for {ticker}"));
            }
        } else {
            let error = result.error().to_string();
            self.state.analysis_result = format!("Error: {error}");
            self.set_status(format!("Analysis failed: {error}"));
            self.log(
                LogLevel::Error,
                format!("Analysis failed for {ticker}: {error}"),
            );
        }
    }

    fn finish_report(&mut self, ticker: &str, result: &RequestResult) -> Vec<Followup> {
        if !result.is_success() {
            self.set_status(format!("Export failed: {}", result.error()));
            self.log(
                LogLevel::Error,
                format!("Report generation failed: {}", result.error()),
            );
            return Vec::new();
        }

        let doc = result.doc();
        self.state.news_items = news_from(&doc, ticker);
        if !self.state.news_items.is_empty() {
            self.log(
                LogLevel::Info,
                format!("Report included {} news items", self.state.news_items.len()),
            );
        }

        match doc.opt_text("report_path") {
            Some(path) => {
                self.state.report_path = path.clone();
                self.set_status(format!("Report exported to: {path}"));
                self.log(LogLevel::Info, format!("Report exported to: {path}"));
                vec![Followup::OpenReport(path)]
            }
            None => {
                self.set_status("Report generated without a file path");
                self.log(LogLevel::Warn, "Report response carried no report_path");
                Vec::new()
            }
        }
    }

    fn finish_fetch_news(&mut self, ticker: &str, result: &RequestResult) {
        if result.is_success() {
            self.state.news_items = news_from(&result.doc(), ticker);
            self.set_status("Fetched news successfully");
            self.log(
                LogLevel::Info,
                format!("Fetched {} news items for {ticker}", self.state.news_items.len()),
            );
        } else {
            self.set_status(format!("Fetch failed: {}", result.error()));
            self.log(
                LogLevel::Error,
                format!("News fetch failed: {}", result.error()),
            );
        }
    }

    fn finish_cached_news(&mut self, ticker: &str, result: &RequestResult) {
        if result.is_success() {
            self.state.news_items = news_from(&result.doc(), ticker);
            let count = self.state.news_items.len();
            self.set_status(format!("Loaded {count} cached news items"));
            self.log(LogLevel::Info, format!("Loaded {count} news items from cache"));
        } else {
            self.set_status(format!("Loading cached news failed: {}", result.error()));
            self.log(
                LogLevel::Error,
                format!("Cached news unavailable: {}", result.error()),
            );
        }
    }

    fn finish_submit_news(&mut self, count: usize, result: &RequestResult) {
        if result.is_success() {
            let doc = result.doc();
            let processed = doc.integer("processed").unwrap_or(count as i64);
            self.set_status(format!("Submitted {count} news items"));
            match doc.opt_text("message") {
                Some(message) => self.log(
                    LogLevel::Info,
                    format!("Submitted {count} news items ({processed} processed): {message}"),
                ),
                None => self.log(
                    LogLevel::Info,
                    format!("Submitted {count} news items ({processed} processed)"),
                ),
            }
        } else {
            self.set_status(format!("Submit failed: {}", result.error()));
            self.log(
                LogLevel::Error,
                format!("News submission failed: {}", result.error()),
            );
        }
    }

    fn finish_price_history(&mut self, ticker: &str, period: &str, result: &RequestResult) {
        if !result.is_success() {
            self.log(
                LogLevel::Error,
                format!("Failed to load prices for {ticker}: {}", result.error()),
            );
            self.fill_mock_chart(period);
            return;
        }

        let doc = result.doc();
        let points: Vec<PricePoint> = doc
            .records("data")
            .iter()
            .filter_map(PricePoint::from_record)
            .collect();
        if points.is_empty() {
            self.log(
                LogLevel::Warn,
                format!("No price data for {ticker} ({period})"),
            );
            self.fill_mock_chart(period);
            return;
        }

        self.state.chart_date_label = doc.text("trading_date");
        self.state.chart_is_historical = doc.flag("is_historical_day");
        self.state.chart_is_mock = false;
        self.set_status(format!("Loaded {} price points for {ticker}", points.len()));
        self.log(
            LogLevel::Info,
            format!("Loaded {} price points for {ticker} ({period})", points.len()),
        );
        self.state.price_history = points;
    }

    fn fill_mock_chart(&mut self, period: &str) {
        let period = ChartPeriod::parse(period);
        self.state.price_history = fallback::generate(period, &mut self.rng);
        self.state.chart_date_label = fallback::label(period);
        self.state.chart_is_historical = false;
        self.state.chart_is_mock = true;
        self.set_status("Showing mock chart data");
        self.log(LogLevel::Warn, "Backend has no chart data; showing mock data");
    }

    fn finish_sector_news(&mut self, sector: &str, result: &RequestResult) {
        if result.is_success() {
            self.state.sector_news = result
                .doc()
                .records("news")
                .iter()
                .filter_map(SectorNewsItem::from_record)
                .collect();
            let count = self.state.sector_news.len();
            self.set_status(format!("Loaded {count} {sector} headlines"));
            self.log(LogLevel::Info, format!("Loaded {count} sector news items for {sector}"));
        } else {
            self.set_status(format!("Sector news unavailable: {}", result.error()));
            self.log(
                LogLevel::Warn,
                format!("Failed to load sector news for {sector}: {}", result.error()),
            );
        }
    }

    // ---------------------------------------------------------------------------------------------
    // countdown

    /// Feed one timer tick. Ticks carrying an old epoch change nothing.
    pub fn tick_countdown(&mut self, epoch: u64) -> CountdownTick {
        if epoch != self.countdown_epoch {
            return CountdownTick::Stale;
        }
        match self.countdown.tick() {
            Tick::Running(remaining) => {
                self.state.rate_limit_message = self.countdown.message();
                CountdownTick::Running(remaining)
            }
            Tick::Expired => {
                self.state.rate_limited = false;
                self.state.rate_limit_message.clear();
                self.log(LogLevel::Info, "Rate limit expired");
                CountdownTick::Expired
            }
            Tick::Idle => CountdownTick::Stale,
        }
    }

    fn start_countdown(&mut self, seconds: u32) -> Followup {
        self.countdown = RateLimitCountdown::start(seconds);
        self.countdown_epoch += 1;
        self.state.rate_limited = self.countdown.is_active();
        self.state.rate_limit_message = self.countdown.message();
        if self.countdown.is_active() {
            Followup::StartCountdown {
                epoch: self.countdown_epoch,
            }
        } else {
            Followup::StopCountdown
        }
    }

    fn stop_countdown(&mut self) -> Followup {
        self.countdown.stop();
        self.countdown_epoch += 1;
        self.state.rate_limited = false;
        self.state.rate_limit_message.clear();
        Followup::StopCountdown
    }

    // ---------------------------------------------------------------------------------------------

    fn begin(&mut self, op: Op, call: ApiCall) -> Pending {
        self.next_seq += 1;
        self.latest.insert(op.kind(), self.next_seq);
        self.in_flight += 1;
        self.state.loading = true;
        log::debug!("issuing {call} as #{}", self.next_seq);
        Pending {
            ticket: Ticket {
                op,
                seq: self.next_seq,
            },
            call,
        }
    }

    fn require_ticker(&mut self) -> Option<String> {
        let ticker = self.state.selected_ticker.trim().to_string();
        if ticker.is_empty() {
            self.set_status("Please select a ticker");
            return None;
        }
        Some(ticker)
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.state.status_message = message.into();
    }
}

fn news_from(doc: &Doc, ticker: &str) -> Vec<NewsItem> {
    doc.records("items")
        .iter()
        .filter_map(|record| NewsItem::from_record(record, ticker))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_client::Deadline;

    fn vm() -> ViewModel {
        ViewModel::with_seed(ViewState::default(), 7)
    }

    fn ok(body: &str) -> RequestResult {
        RequestResult::ok(body)
    }

    #[test]
    fn starts_with_a_log_entry() {
        let vm = vm();
        assert_eq!(vm.state().activity_log.len(), 1);
        assert!(vm
            .state()
            .activity_log
            .iter()
            .next()
            .unwrap()
            .ends_with("[INFO] Application started"));
    }

    #[test]
    fn empty_ticker_is_guarded() {
        let mut vm = vm();
        vm.set_ticker("  ");
        assert!(vm.request_analysis().is_none());
        assert_eq!(vm.state().status_message, "Please select a ticker");
        assert!(vm.export_html_report().is_none());
        assert!(vm.fetch_news().is_none());
        assert!(vm.load_cached_analysis().is_none());
        assert!(!vm.state().loading);
        assert_eq!(vm.in_flight(), 0);
    }

    #[test]
    fn short_queries_are_not_resolved() {
        let mut vm = vm();
        vm.set_ticker("M");
        assert!(vm.resolve_ticker().is_none());
        assert!(vm.load_fundamentals().is_none());
        vm.set_sector("");
        assert!(vm.resolve_sector().is_none());
        assert!(vm.load_sector_news().is_none());
    }

    #[test]
    fn connection() {
        let mut vm = vm();
        let pending = vm.check_connection().unwrap();
        assert!(vm.state().loading);
        assert_eq!(vm.state().status_message, "Checking connection...");
        assert_eq!(pending.call.to_string(), "GET /health/live");

        vm.complete(pending.ticket, ok(r#"{"alive": true}"#));
        assert!(vm.state().connected);
        assert!(!vm.state().loading);
        assert_eq!(vm.state().status_message, "Connected to AI Service");

        let pending = vm.check_connection().unwrap();
        vm.complete(pending.ticket, RequestResult::from_failure("refused"));
        assert!(!vm.state().connected);
        assert_eq!(vm.state().status_message, "Connection failed");
    }

    #[test]
    fn resolve_ticker_updates_selection_and_chains_fundamentals() {
        let mut vm = vm();
        vm.set_ticker("Mercedes");
        let pending = vm.resolve_ticker().unwrap();
        assert_eq!(
            pending.op(),
            &Op::ResolveTicker {
                query: "Mercedes".into()
            }
        );

        let followups = vm.complete(
            pending.ticket,
            ok(r#"{"symbol": "MBG.DE", "sector": "Automotive"}"#),
        );
        assert_eq!(vm.state().selected_ticker, "MBG.DE");
        assert_eq!(vm.state().selected_sector, "Automotive");
        assert!(vm.state().loading);

        let [Followup::Issue(next)] = followups.as_slice() else {
            panic!("expected a fundamentals request, got {followups:?}");
        };
        assert_eq!(
            next.op(),
            &Op::LoadFundamentals {
                ticker: "MBG.DE".into()
            }
        );
    }

    #[test]
    fn resolve_sector_ignores_case_only_changes() {
        let mut vm = vm();
        vm.set_sector("biotechnology");
        let pending = vm.resolve_sector().unwrap();
        vm.complete(pending.ticket, ok(r#"{"sector": "Biotechnology"}"#));
        assert_eq!(vm.state().selected_sector, "biotechnology");

        vm.set_sector("cars");
        let pending = vm.resolve_sector().unwrap();
        vm.complete(pending.ticket, ok(r#"{"sector": "Automotive"}"#));
        assert_eq!(vm.state().selected_sector, "Automotive");
    }

    #[test]
    fn fundamentals_reset_on_failure() {
        let mut vm = vm();
        let pending = vm.load_fundamentals().unwrap();
        vm.complete(pending.ticket, ok(r#"{"pe_ratio": 12, "recommendation": "hold"}"#));
        assert_eq!(vm.state().fundamentals.pe_ratio, "12.00");

        let pending = vm.load_fundamentals().unwrap();
        vm.complete(pending.ticket, RequestResult::from_response(500, String::new()));
        assert_eq!(vm.state().fundamentals, Fundamentals::default());
    }

    #[test]
    fn fundamentals_for_a_previous_ticker_are_dropped() {
        let mut vm = vm();
        let pending = vm.load_fundamentals().unwrap();
        vm.set_ticker("NVDA");
        vm.complete(pending.ticket, ok(r#"{"pe_ratio": 12}"#));
        assert_eq!(vm.state().fundamentals, Fundamentals::default());
        assert!(!vm.state().loading);
    }

    #[test]
    fn superseded_responses_are_dropped() {
        let mut vm = vm();
        let first = vm.load_cached_analysis().unwrap();
        let second = vm.load_cached_analysis().unwrap();

        vm.complete(second.ticket, ok(r#"{"essay": "newer"}"#));
        assert!(vm.state().loading);
        vm.complete(first.ticket, ok(r#"{"essay": "older"}"#));
        assert_eq!(vm.state().analysis_result, "newer");
        assert!(!vm.state().loading);
    }

    #[test]
    fn analysis_prefers_essay() {
        let mut vm = vm();
        let pending = vm.request_analysis().unwrap();
        assert_eq!(pending.call.deadline, Deadline::Analysis);
        vm.complete(pending.ticket, ok(r#"{"essay": "Strong buy."}"#));
        assert_eq!(vm.state().analysis_result, "Strong buy.");
        assert_eq!(vm.state().status_message, "Analysis complete");

        let pending = vm.request_analysis().unwrap();
        vm.complete(pending.ticket, ok(r#"{"summary": "raw"}"#));
        assert_eq!(vm.state().analysis_result, r#"{"summary": "raw"}"#);

        let pending = vm.request_analysis().unwrap();
        vm.complete(
            pending.ticket,
            RequestResult::from_response(429, r#"{"detail": "quota"}"#.into()),
        );
        assert_eq!(vm.state().analysis_result, "Error: quota");
        assert_eq!(vm.state().status_message, "Analysis failed: quota");
    }

    #[test]
    fn report_opens_path_and_collects_news() {
        let mut vm = vm();
        let pending = vm.export_html_report().unwrap();
        let followups = vm.complete(
            pending.ticket,
            ok(r#"{"report_path": "/tmp/absi.html",
                  "items": [{"title": "Absci raises", "source": "FT"}]}"#),
        );
        assert_eq!(followups, vec![Followup::OpenReport("/tmp/absi.html".into())]);
        assert_eq!(vm.state().report_path, "/tmp/absi.html");
        assert_eq!(vm.state().status_message, "Report exported to: /tmp/absi.html");
        assert_eq!(
            vm.state().news_items,
            vec![NewsItem::new("ABSI", "Absci raises", "FT", "Just now")]
        );

        let pending = vm.export_html_report().unwrap();
        let followups = vm.complete(pending.ticket, RequestResult::from_failure("timed out"));
        assert!(followups.is_empty());
        assert_eq!(vm.state().status_message, "Export failed: timed out");
    }

    #[test]
    fn news_operations() {
        let mut vm = vm();
        let pending = vm.fetch_news().unwrap();
        vm.complete(
            pending.ticket,
            ok(r#"{"items": [{"title": "A"}, {"title": "B", "ticker": "X"}]}"#),
        );
        assert_eq!(vm.state().news_items.len(), 2);
        assert_eq!(vm.state().status_message, "Fetched news successfully");

        let pending = vm.load_cached_news().unwrap();
        assert!(pending.call.query.contains(&("limit".into(), "50".into())));
        vm.complete(pending.ticket, ok(r#"{"items": []}"#));
        assert!(vm.state().news_items.is_empty());

        assert!(vm.submit_news(&[], true).is_none());
        assert_eq!(vm.state().status_message, "No news items to submit");

        let item = NewsSubmission {
            ticker: "ABSI".into(),
            title: "Absci partners with AZ".into(),
            source: "PR Newswire".into(),
            url: None,
            published: None,
            summary: None,
        };
        let pending = vm.submit_news(&[item], true).unwrap();
        vm.complete(
            pending.ticket,
            ok(r#"{"message": "queued", "processed": 1}"#),
        );
        assert_eq!(vm.state().status_message, "Submitted 1 news items");
        assert!(vm
            .state()
            .activity_log
            .iter()
            .last()
            .unwrap()
            .ends_with("(1 processed): queued"));
    }

    #[test]
    fn price_history_success() {
        let mut vm = vm();
        vm.set_chart_period(ChartPeriod::Day);
        let pending = vm.load_price_history().unwrap();
        assert!(vm.state().price_history.is_empty());
        vm.complete(
            pending.ticket,
            ok(r#"{"trading_date": "2025-01-03", "is_historical_day": true,
                  "data": [{"date": "2025-01-03", "time": "09:30", "close": 10.5},
                           {"date": "2025-01-03", "time": "10:30", "close": 11}]}"#),
        );
        let state = vm.state();
        assert_eq!(state.price_history.len(), 2);
        assert_eq!(state.price_history[0].label, "09:30");
        assert_eq!(state.chart_date_label, "2025-01-03");
        assert!(state.chart_is_historical);
        assert!(!state.chart_is_mock);
    }

    #[test]
    fn price_history_falls_back_to_mock_data() {
        let mut vm = vm();
        let pending = vm.load_price_history_for("ABSI", "1w").unwrap();
        vm.complete(pending.ticket, RequestResult::from_failure("refused"));
        let state = vm.state();
        assert_eq!(state.price_history.len(), 7);
        assert!(state.chart_date_label.contains("Mock"));
        assert!(state.chart_is_mock);

        let pending = vm.load_price_history_for("ABSI", "5y").unwrap();
        vm.complete(pending.ticket, ok(r#"{"data": []}"#));
        assert_eq!(vm.state().price_history.len(), 30);
        assert_eq!(vm.state().chart_date_label, "Mock Data (Backend Unavailable)");
    }

    #[test]
    fn sector_news() {
        let mut vm = vm();
        let pending = vm.load_sector_news().unwrap();
        vm.complete(
            pending.ticket,
            ok(r#"{"news": [{"title": "Biotech rallies", "source": "WSJ", "date": "2025-01-02"},
                           {"source": "nobody"}]}"#),
        );
        assert_eq!(vm.state().sector_news.len(), 1);
        assert_eq!(vm.state().sector_news[0].to_string(), "Biotech rallies (WSJ)");
    }

    #[test]
    fn rate_limit_countdown() {
        let mut vm = vm();
        let pending = vm.check_rate_limit_status().unwrap();
        assert_eq!(pending.call.deadline, Deadline::Quick);
        let followups = vm.complete(
            pending.ticket,
            ok(r#"{"rate_limited": true, "remaining_seconds": 2}"#),
        );
        let epoch = vm.countdown_epoch();
        assert_eq!(followups, vec![Followup::StartCountdown { epoch }]);
        assert!(vm.state().rate_limited);
        assert_eq!(vm.state().rate_limit_message, "Rate limit: 2s");

        assert_eq!(vm.tick_countdown(epoch - 1), CountdownTick::Stale);
        assert_eq!(vm.tick_countdown(epoch), CountdownTick::Running(1));
        assert_eq!(vm.state().rate_limit_message, "Rate limit: 1s");
        assert_eq!(vm.tick_countdown(epoch), CountdownTick::Expired);
        assert!(!vm.state().rate_limited);
        assert_eq!(vm.state().rate_limit_message, "");
    }

    #[test]
    fn zero_second_limit_is_inactive() {
        let mut vm = vm();
        let pending = vm.check_rate_limit_status().unwrap();
        let followups = vm.complete(
            pending.ticket,
            ok(r#"{"rate_limited": true, "remaining_seconds": 0}"#),
        );
        assert_eq!(followups, vec![Followup::StopCountdown]);
        assert!(!vm.state().rate_limited);
        assert_eq!(vm.state().rate_limit_message, "");
    }

    #[test]
    fn chart_for_a_previous_ticker_is_dropped() {
        let mut vm = vm();
        vm.set_ticker("Mercedes");
        let resolve = vm.resolve_ticker().unwrap();
        let chart = vm.load_price_history().unwrap();

        vm.complete(resolve.ticket, ok(r#"{"symbol": "MBG.DE"}"#));
        vm.complete(
            chart.ticket,
            ok(r#"{"data": [{"date": "2024-01-02", "close": 999.0}]}"#),
        );
        assert_eq!(vm.state().selected_ticker, "MBG.DE");
        assert!(vm.state().price_history.is_empty());
        assert!(!vm.state().chart_is_mock);
    }

    #[test]
    fn report_without_items_clears_previous_news() {
        let mut vm = vm();
        vm.set_ticker("NVDA");
        let pending = vm.fetch_news().unwrap();
        assert_eq!(pending.call.body.as_ref().unwrap()["max_per_ticker"], 50);
        vm.complete(pending.ticket, ok(r#"{"items": [{"title": "NVDA old"}]}"#));
        assert_eq!(vm.state().news_items.len(), 1);

        vm.set_ticker("ABSI");
        let pending = vm.export_html_report().unwrap();
        vm.complete(pending.ticket, ok(r#"{"report_path": "/tmp/a.html"}"#));
        assert!(vm.state().news_items.is_empty());
        assert_eq!(vm.state().report_path, "/tmp/a.html");
    }

    #[test]
    fn rate_limit_check_keeps_the_status_message() {
        let mut vm = vm();
        let connection = vm.check_connection().unwrap();
        let limit = vm.check_rate_limit_status().unwrap();
        vm.complete(connection.ticket, ok(r#"{"alive": true}"#));
        vm.complete(limit.ticket, ok(r#"{"rate_limited": false}"#));
        assert_eq!(vm.state().status_message, "Connected to AI Service");

        let limit = vm.check_rate_limit_status().unwrap();
        vm.complete(limit.ticket, RequestResult::from_failure("refused"));
        assert_eq!(vm.state().status_message, "Connected to AI Service");
        assert!(!vm.state().loading);
    }
}
