use newsdesk_client::{ApiCall, RequestResult, Transport};
use newsdesk_view::{Launcher, Session, ViewModel, ViewState};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// -------------------------------------------------------------------------------------------------
// test doubles

#[derive(Clone)]
struct Reply {
    delay: Duration,
    result: RequestResult,
}

/// Canned responses keyed by path (`api/engine/analyze/ABSI`). Queued replies are used in
/// order and the last one repeats; unknown paths are refused.
#[derive(Clone, Default)]
struct StubTransport {
    replies: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
}

impl StubTransport {
    fn reply(self, path: &str, body: &str) -> Self {
        self.reply_after(path, Duration::ZERO, RequestResult::ok(body))
    }

    fn reply_after(self, path: &str, delay: Duration, result: RequestResult) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Reply { delay, result });
        self
    }

    fn paths(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.segments.join("/"))
            .collect()
    }
}

impl Transport for StubTransport {
    async fn send(&self, call: ApiCall) -> RequestResult {
        let path = call.segments.join("/");
        self.calls.lock().unwrap().push(call);
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            let reply = match replies.get_mut(&path) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            };
            reply
        };
        match reply {
            Some(Reply { delay, result }) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => RequestResult::from_failure("connection refused"),
        }
    }
}

#[derive(Clone, Default)]
struct RecordingLauncher {
    opened: Arc<Mutex<Vec<String>>>,
    starts: Arc<Mutex<usize>>,
}

impl Launcher for RecordingLauncher {
    fn open_report(&self, path: &str) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn start_backend(&self) -> anyhow::Result<()> {
        *self.starts.lock().unwrap() += 1;
        Ok(())
    }
}

fn session(transport: StubTransport) -> (Session<StubTransport, RecordingLauncher>, RecordingLauncher) {
    let launcher = RecordingLauncher::default();
    let vm = ViewModel::with_seed(ViewState::default(), 11);
    (Session::new(vm, transport, launcher.clone()), launcher)
}

// -------------------------------------------------------------------------------------------------

#[tokio::test]
async fn resolving_a_company_name_loads_its_fundamentals() {
    let transport = StubTransport::default()
        .reply("resolve/ticker", r#"{"symbol": "MBG.DE", "sector": "Automotive"}"#)
        .reply(
            "api/fundamentals",
            r#"{"pe_ratio": 5.1, "roe": 12.5, "recommendation": "buy"}"#,
        );
    let (mut session, _) = session(transport.clone());

    session.view_mut().set_ticker("Mercedes");
    assert!(session.issue(ViewModel::resolve_ticker));
    session.settle().await;

    let state = session.state();
    assert_eq!(state.selected_ticker, "MBG.DE");
    assert_eq!(state.selected_sector, "Automotive");
    assert_eq!(state.fundamentals.pe_ratio, "5.10");
    assert_eq!(state.fundamentals.roe, "12.50%");
    assert_eq!(state.fundamentals.recommendation, "BUY");
    assert!(!state.loading);
    assert_eq!(transport.paths(), ["resolve/ticker", "api/fundamentals"]);
}

#[tokio::test]
async fn guarded_operations_send_nothing() {
    let transport = StubTransport::default();
    let (mut session, _) = session(transport.clone());

    session.view_mut().set_ticker("");
    assert!(!session.issue(ViewModel::request_analysis));
    session.settle().await;

    assert_eq!(session.state().status_message, "Please select a ticker");
    assert!(transport.paths().is_empty());
}

#[tokio::test]
async fn report_is_opened_once_exported() {
    let transport = StubTransport::default().reply(
        "analyze/full_report",
        r#"{"report_path": "/tmp/reports/ABSI.html", "items": []}"#,
    );
    let (mut session, launcher) = session(transport);

    session.issue(ViewModel::export_html_report);
    session.settle().await;

    assert_eq!(*launcher.opened.lock().unwrap(), ["/tmp/reports/ABSI.html"]);
    assert_eq!(session.state().report_path, "/tmp/reports/ABSI.html");
    assert!(session
        .state()
        .activity_log
        .iter()
        .any(|entry| entry.ends_with("Opened report in browser")));
}

#[tokio::test]
async fn unreachable_backend_still_draws_a_chart() {
    let (mut session, _) = session(StubTransport::default());

    session.issue(ViewModel::check_connection);
    session.issue(ViewModel::load_price_history);
    session.settle().await;

    let state = session.state();
    assert!(!state.connected);
    assert_eq!(state.price_history.len(), 52);
    assert!(state.chart_date_label.contains("Mock"));
    assert!(state.chart_is_mock);
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn slower_superseded_response_is_ignored() {
    let transport = StubTransport::default()
        .reply_after(
            "api/engine/analyze/ABSI",
            Duration::from_secs(5),
            RequestResult::ok(r#"{"essay": "older"}"#),
        )
        .reply_after(
            "api/engine/analyze/ABSI",
            Duration::from_secs(1),
            RequestResult::ok(r#"{"essay": "newer"}"#),
        );
    let (mut session, _) = session(transport);

    session.issue(ViewModel::load_cached_analysis);
    session.issue(ViewModel::load_cached_analysis);
    session.settle().await;

    assert_eq!(session.state().analysis_result, "newer");
    assert!(!session.state().loading);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_counts_down_once_a_second() {
    let transport = StubTransport::default().reply(
        "api/engine/rate-limit",
        r#"{"rate_limited": true, "remaining_seconds": 3}"#,
    );
    let (mut session, _) = session(transport);
    let started = Instant::now();

    session.issue(ViewModel::check_rate_limit_status);
    session.settle().await;
    assert!(session.state().rate_limited);
    assert_eq!(session.state().rate_limit_message, "Rate limit: 3s");

    let mut messages = Vec::new();
    while session.step().await {
        messages.push(session.state().rate_limit_message.clone());
    }
    assert_eq!(messages, ["Rate limit: 2s", "Rate limit: 1s", ""]);
    assert!(!session.state().rate_limited);
    assert!(!session.view().countdown().is_active());

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn lifted_rate_limit_stops_the_countdown() {
    let transport = StubTransport::default()
        .reply(
            "api/engine/rate-limit",
            r#"{"rate_limited": true, "remaining_seconds": 60}"#,
        )
        .reply("api/engine/rate-limit", r#"{"rate_limited": false}"#);
    let (mut session, _) = session(transport);
    let started = Instant::now();

    session.issue(ViewModel::check_rate_limit_status);
    session.settle().await;
    assert!(session.state().rate_limited);

    session.issue(ViewModel::check_rate_limit_status);
    session.drain().await;

    assert!(!session.state().rate_limited);
    assert_eq!(session.state().rate_limit_message, "");
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn backend_start_is_delegated() {
    let (mut session, launcher) = session(StubTransport::default());
    session.start_backend().unwrap();
    assert_eq!(*launcher.starts.lock().unwrap(), 1);
}
