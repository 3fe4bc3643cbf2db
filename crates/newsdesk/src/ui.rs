use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use newsdesk_view::{Fundamentals, PricePoint, ViewState};
use std::time::Duration;

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// -------------------------------------------------------------------------------------------------

pub fn status(state: &ViewState) {
    let connection = if state.connected {
        "● connected".green()
    } else {
        "● offline".red()
    };
    println!(
        "{} {}  {} / {} / {}",
        connection,
        state.status_message.bold(),
        state.selected_ticker.cyan(),
        state.selected_sector,
        state.selected_language
    );
    if state.rate_limited {
        println!("{}", state.rate_limit_message.yellow());
    }
}

pub fn fundamentals(ticker: &str, f: &Fundamentals) {
    println!("\n{}", format!("Fundamentals: {ticker}").bold().underline());
    for (label, value) in [
        ("P/E", &f.pe_ratio),
        ("PEG", &f.peg_ratio),
        ("ROE", &f.roe),
        ("Debt/Equity", &f.debt_to_equity),
        ("Target (mean)", &f.target_mean),
        ("Target (high)", &f.target_high),
        ("Target (low)", &f.target_low),
        ("Recommendation", &f.recommendation),
    ] {
        println!("  {:<16}{}", label.dimmed(), value);
    }
    if !f.business_summary.is_empty() {
        println!("\n  {}", f.business_summary);
    }
    if !f.executive_summary.is_empty() {
        println!("\n  {}", f.executive_summary.italic());
    }
}

pub fn chart(state: &ViewState) {
    let title = format!("Chart {} ({})", state.selected_ticker, state.chart_period);
    println!("\n{}", title.bold().underline());

    let label = if state.chart_is_mock {
        state.chart_date_label.yellow()
    } else if state.chart_is_historical {
        format!("{} (last trading day)", state.chart_date_label).normal()
    } else {
        state.chart_date_label.normal()
    };
    if !state.chart_date_label.is_empty() {
        println!("  {label}");
    }

    let points = &state.price_history;
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        println!("  {}", "no data".dimmed());
        return;
    };
    let (low, high) = bounds(points);
    let change = (last.close - first.close) / first.close * 100.0;
    let change = if change >= 0.0 {
        format!("+{change:.2}%").green()
    } else {
        format!("{change:.2}%").red()
    };
    println!("  {}", sparkline(points));
    println!(
        "  {} .. {}  last {:.2}  low {:.2}  high {:.2}  {}",
        first.label, last.label, last.close, low, high, change
    );
}

pub fn analysis(text: &str) {
    if text.is_empty() {
        return;
    }
    println!("\n{}", "Analysis".bold().underline());
    if let Some(error) = text.strip_prefix("Error: ") {
        println!("  {}", error.red());
    } else {
        println!("{text}");
    }
}

pub fn news(state: &ViewState) {
    println!("\n{}", "News".bold().underline());
    if state.news_items.is_empty() {
        println!("  {}", "no news".dimmed());
    }
    for item in &state.news_items {
        println!(
            "  {} {} {} {}",
            item.date.dimmed(),
            format!("[{}]", item.ticker).cyan(),
            item.title,
            format!("({})", item.source).dimmed()
        );
    }
}

pub fn sector_news(state: &ViewState) {
    println!(
        "\n{}",
        format!("Sector news: {}", state.selected_sector)
            .bold()
            .underline()
    );
    if state.sector_news.is_empty() {
        println!("  {}", "no headlines".dimmed());
    }
    for item in &state.sector_news {
        println!(
            "  {} {} {}",
            item.date.dimmed(),
            item.title,
            format!("({})", item.source).dimmed()
        );
    }
}

/// The newest `n` activity entries, coloured by level.
pub fn activity(state: &ViewState, n: usize) {
    println!("\n{}", "Activity".bold().underline());
    for entry in state.activity_log.tail(n) {
        let line = if entry.contains("] [ERROR] ") {
            entry.red()
        } else if entry.contains("] [WARN] ") {
            entry.yellow()
        } else {
            entry.dimmed()
        };
        println!("  {line}");
    }
}

// -------------------------------------------------------------------------------------------------

fn bounds(points: &[PricePoint]) -> (f64, f64) {
    points.iter().fold((f64::MAX, f64::MIN), |(low, high), p| {
        (low.min(p.close), high.max(p.close))
    })
}

fn sparkline(points: &[PricePoint]) -> String {
    let (low, high) = bounds(points);
    let span = (high - low).max(f64::EPSILON);
    points
        .iter()
        .map(|p| {
            let level = ((p.close - low) / span * (SPARKS.len() - 1) as f64).round() as usize;
            SPARKS[level.min(SPARKS.len() - 1)]
        })
        .collect()
}
