use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Backend base URL; overrides the profile and `NEWSDESK_API_URL`.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// JSON file with the initial ticker, sector, language and chart period.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub ticker: Option<String>,

    #[arg(long, global = true)]
    pub sector: Option<String>,

    /// Language of generated analyses and reports.
    #[arg(long, global = true)]
    pub language: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the backend is alive.
    Health {
        /// Also print the backend's detailed health document.
        #[arg(long)]
        details: bool,
    },

    /// Resolve a company name or symbol to a ticker, then load its fundamentals.
    Resolve { query: String },

    /// Resolve free text to a sector name.
    Sector { query: String },

    /// Show fundamentals for the selected ticker.
    Fundamentals,

    /// Show the price chart for the selected ticker.
    Chart {
        /// One of 24h, 1w, 1m, 3m, 1y, 10y.
        #[arg(long)]
        period: Option<String>,
    },

    /// Request a fresh AI analysis of the selected ticker.
    Analyze,

    /// Show the most recent stored analysis of the selected ticker.
    CachedAnalysis,

    /// Generate the HTML report for the selected ticker and open it.
    Report,

    /// Fetch news for the selected ticker from external sources.
    FetchNews,

    /// List cached news for the selected ticker.
    News,

    /// Submit news items from a JSON file (an array of items).
    SubmitNews {
        file: String,

        /// Ask the backend to analyse the submitted items.
        #[arg(long)]
        analyze: bool,
    },

    /// List headlines for the selected sector.
    SectorNews,

    /// Show the backend's rate-limit state.
    RateLimit {
        /// Keep counting down until the limit expires.
        #[arg(long)]
        watch: bool,
    },

    /// Load connection, ticker, chart, sector news and rate limit at once.
    Dashboard,

    /// Start the backend service in the background.
    StartServer,
}
