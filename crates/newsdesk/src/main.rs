use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use newsdesk_client::prelude::*;
use newsdesk_client::NewsSubmission;
use newsdesk_common::{read_json, Profile};
use newsdesk_view::{ChartPeriod, Session, SystemLauncher, ViewModel, ViewState};

mod cli;
mod ui;

/// Activity entries shown after each command.
const LOG_TAIL: usize = 8;

type Desk = Session<Backend, SystemLauncher>;

fn preprocess() {
    // grant access to .env
    dotenv::dotenv().ok();

    // initialise logger
    env_logger::init();
}

#[tokio::main]
async fn main() -> Result<()> {
    preprocess();
    let cli = cli::Cli::parse();
    log::info!("Command line input recorded: {cli:#?}");

    let profile = Profile::load(cli.profile.as_deref()).await?;
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url.clone().or_else(|| profile.api_url.clone()) {
        config = config.with_base_url(url);
    }
    let backend = Backend::new(config)?;

    let mut state = ViewState::from_profile(&profile);
    if let Some(ticker) = &cli.ticker {
        state.selected_ticker = ticker.clone();
    }
    if let Some(sector) = &cli.sector {
        state.selected_sector = sector.clone();
    }
    if let Some(language) = &cli.language {
        state.selected_language = language.clone();
    }
    let mut desk = Session::new(
        ViewModel::new(state),
        backend.clone(),
        SystemLauncher::from_env(),
    );

    // cli framework:
    // "> newsdesk [--ticker T] <COMMAND>"
    match &cli.command {
        // "> newsdesk health [--details]"
        cli::Commands::Health { details } => {
            desk.issue(ViewModel::check_connection);
            settle(&mut desk, "Checking connection").await;
            ui::status(desk.state());
            if *details {
                println!("{}", backend.health_details().await);
            }
        }

        // "> newsdesk resolve <query>"
        // canonical ticker, then its fundamentals
        cli::Commands::Resolve { query } => {
            desk.view_mut().set_ticker(query.as_str());
            desk.issue(ViewModel::resolve_ticker);
            settle(&mut desk, "Resolving ticker").await;
            ui::status(desk.state());
            ui::fundamentals(&desk.state().selected_ticker, &desk.state().fundamentals);
        }

        // "> newsdesk sector <query>"
        cli::Commands::Sector { query } => {
            desk.view_mut().set_sector(query.as_str());
            desk.issue(ViewModel::resolve_sector);
            settle(&mut desk, "Resolving sector").await;
            ui::status(desk.state());
        }

        cli::Commands::Fundamentals => {
            desk.issue(ViewModel::load_fundamentals);
            settle(&mut desk, "Loading fundamentals").await;
            ui::status(desk.state());
            ui::fundamentals(&desk.state().selected_ticker, &desk.state().fundamentals);
        }

        // "> newsdesk chart [--period 3m]"
        // unknown periods are passed through; the backend decides
        cli::Commands::Chart { period } => {
            match period.as_deref() {
                Some(label) => match ChartPeriod::parse(label) {
                    Some(period) => {
                        desk.view_mut().set_chart_period(period);
                        desk.issue(ViewModel::load_price_history);
                    }
                    None => {
                        let ticker = desk.state().selected_ticker.clone();
                        desk.issue(|vm| vm.load_price_history_for(&ticker, label));
                    }
                },
                None => {
                    desk.issue(ViewModel::load_price_history);
                }
            }
            settle(&mut desk, "Loading prices").await;
            ui::status(desk.state());
            ui::chart(desk.state());
        }

        cli::Commands::Analyze => {
            desk.issue(ViewModel::request_analysis);
            settle(&mut desk, "Waiting for analysis").await;
            ui::status(desk.state());
            ui::analysis(&desk.state().analysis_result);
        }

        cli::Commands::CachedAnalysis => {
            desk.issue(ViewModel::load_cached_analysis);
            settle(&mut desk, "Loading cached analysis").await;
            ui::status(desk.state());
            ui::analysis(&desk.state().analysis_result);
        }

        cli::Commands::Report => {
            desk.issue(ViewModel::export_html_report);
            settle(&mut desk, "Generating report").await;
            ui::status(desk.state());
            if !desk.state().report_path.is_empty() {
                println!("{}", desk.state().report_path.green());
            }
        }

        cli::Commands::FetchNews => {
            desk.issue(ViewModel::fetch_news);
            settle(&mut desk, "Fetching news").await;
            ui::status(desk.state());
            ui::news(desk.state());
        }

        cli::Commands::News => {
            desk.issue(ViewModel::load_cached_news);
            settle(&mut desk, "Loading cached news").await;
            ui::status(desk.state());
            ui::news(desk.state());
        }

        // "> newsdesk submit-news items.json [--analyze]"
        cli::Commands::SubmitNews { file, analyze } => {
            let items: Vec<NewsSubmission> = read_json(file).await?;
            log::info!("Read {} news items from {file}", items.len());
            desk.issue(|vm| vm.submit_news(&items, *analyze));
            settle(&mut desk, "Submitting news").await;
            ui::status(desk.state());
        }

        cli::Commands::SectorNews => {
            desk.issue(ViewModel::load_sector_news);
            settle(&mut desk, "Loading sector news").await;
            ui::status(desk.state());
            ui::sector_news(desk.state());
        }

        // "> newsdesk rate-limit [--watch]"
        cli::Commands::RateLimit { watch } => {
            desk.issue(ViewModel::check_rate_limit_status);
            settle(&mut desk, "Checking rate limit").await;
            ui::status(desk.state());
            if *watch {
                watch_countdown(&mut desk).await;
            }
        }

        // "> newsdesk dashboard"
        // the selection is resolved first; chart and sector news follow for the resolved names
        cli::Commands::Dashboard => {
            desk.issue(ViewModel::check_connection);
            desk.issue(ViewModel::check_rate_limit_status);
            desk.issue(ViewModel::resolve_ticker);
            settle(&mut desk, "Resolving selection").await;

            desk.issue(ViewModel::load_price_history);
            desk.issue(ViewModel::load_sector_news);
            settle(&mut desk, "Loading dashboard").await;

            let state = desk.state();
            ui::status(state);
            ui::fundamentals(&state.selected_ticker, &state.fundamentals);
            ui::chart(state);
            ui::sector_news(state);
        }

        cli::Commands::StartServer => {
            desk.start_backend()?;
            ui::status(desk.state());
        }
    }

    ui::activity(desk.state(), LOG_TAIL);
    Ok(())
}

/// Run the session until every request is answered, behind a spinner.
async fn settle(desk: &mut Desk, msg: &str) {
    let pb = ui::spinner(msg);
    desk.settle().await;
    pb.finish_and_clear();
}

async fn watch_countdown(desk: &mut Desk) {
    let pb = ui::spinner(&desk.state().rate_limit_message);
    while desk.step().await {
        pb.set_message(desk.state().rate_limit_message.clone());
    }
    pb.finish_and_clear();
    println!("{}", "Rate limit lifted".green());
}
