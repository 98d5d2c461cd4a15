//! QuoteFeed CLI: inspect quote pages and refresh configured securities.
//!
//! Commands:
//! - `html`: extract prices (or corporate events) from one HTML page
//! - `json`: extract prices from one JSON document with the given paths
//! - `refresh`: fetch historical prices for every security in a config file
//! - `latest`: fetch the latest price for every security in a config file
//!
//! Sources are URLs or local file paths. Logging goes to stderr and is
//! controlled by `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use quotefeed_core::config::HttpConfig;
use quotefeed_core::fetch::{HttpFetcher, PageFetcher};
use quotefeed_core::json::{JsonPath, JsonPaths};
use quotefeed_core::money::format_quote;
use quotefeed_core::refresh::{refresh_all, LogProgress, SecurityRefresh};
use quotefeed_core::{
    FeedError, FeedRegistry, FeedResult, HtmlTableFeed, JsonFeed, PriceRecord, QuoteFeedConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quotefeed",
    about = "QuoteFeed CLI: historical prices from HTML tables and JSON APIs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract prices from the first matching table of an HTML page.
    Html {
        /// URL or path of the page.
        source: String,

        /// Extract corporate events instead of prices.
        #[arg(long, default_value_t = false)]
        events: bool,

        /// Print records as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Extract prices from a JSON document.
    Json {
        /// URL or path of the document.
        source: String,

        /// Path to the dates, e.g. `$.data[*].date`.
        #[arg(long)]
        date_path: String,

        /// Path to the close prices.
        #[arg(long)]
        close_path: String,

        #[arg(long)]
        high_path: Option<String>,

        #[arg(long)]
        low_path: Option<String>,

        #[arg(long)]
        volume_path: Option<String>,

        /// chrono format of date strings, e.g. `%d.%m.%Y`.
        #[arg(long)]
        date_format: Option<String>,

        /// Print records as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Refresh historical prices of all configured securities.
    Refresh {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Write all records as CSV to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Refresh one security at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Fetch the latest price of all configured securities.
    Latest {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Html {
            source,
            events,
            json,
        } => run_html(&source, events, json),
        Commands::Json {
            source,
            date_path,
            close_path,
            high_path,
            low_path,
            volume_path,
            date_format,
            json,
        } => {
            let mut paths = JsonPaths::new(&date_path, &close_path)?;
            paths.high = high_path.as_deref().map(JsonPath::compile).transpose()?;
            paths.low = low_path.as_deref().map(JsonPath::compile).transpose()?;
            paths.volume = volume_path.as_deref().map(JsonPath::compile).transpose()?;
            paths.date_format = date_format;
            run_json(&source, &paths, json)
        }
        Commands::Refresh {
            config,
            output,
            sequential,
        } => run_refresh(&config, output.as_deref(), !sequential),
        Commands::Latest { config } => run_latest(&config),
    }
}

/// Read a local file, or fetch the source as a URL.
fn load_source(source: &str) -> Result<String> {
    let path = Path::new(source);
    if path.is_file() {
        return std::fs::read_to_string(path).with_context(|| format!("read {source}"));
    }
    let fetcher = HttpFetcher::new(&HttpConfig::default())?;
    Ok(fetcher.fetch(source)?)
}

fn run_html(source: &str, events: bool, as_json: bool) -> Result<()> {
    let html = load_source(source)?;

    if events {
        let result = HtmlTableFeed::events_from_html(&html, source);
        report_errors(&result.errors);
        if as_json {
            println!("{}", serde_json::to_string_pretty(&result.events)?);
        } else {
            for event in &result.events {
                let amount = event.amount.map(format_quote).unwrap_or_default();
                let ratio = event
                    .ratio
                    .map(|r| format!("{}:{}", r.from, r.to))
                    .unwrap_or_default();
                println!("{}\t{:?}\t{ratio}\t{amount}", event.date, event.kind);
            }
        }
        return Ok(());
    }

    print_result(&HtmlTableFeed::quotes_from_html(&html, source), as_json)
}

fn run_json(source: &str, paths: &JsonPaths, as_json: bool) -> Result<()> {
    let json = load_source(source)?;
    print_result(&JsonFeed::quotes_from_json(&json, source, paths), as_json)
}

fn print_result(result: &FeedResult, as_json: bool) -> Result<()> {
    report_errors(result.errors());

    if as_json {
        let records: Vec<&PriceRecord> = result.records().collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("date\tclose\thigh\tlow\tvolume");
        for r in result.records() {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                r.date,
                format_quote(r.value),
                r.high.map(format_quote).unwrap_or_default(),
                r.low.map(format_quote).unwrap_or_default(),
                r.volume.map(|v| v.to_string()).unwrap_or_default(),
            );
        }
    }

    if result.series().is_empty() {
        bail!("no records extracted");
    }
    Ok(())
}

fn report_errors(errors: &[FeedError]) {
    for error in errors {
        warn!(kind = ?error.kind(), "{error}");
    }
}

fn registry_for(config: &QuoteFeedConfig) -> Result<FeedRegistry> {
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.http)?);
    Ok(FeedRegistry::from_config(fetcher, config))
}

fn run_refresh(config_path: &Path, output: Option<&Path>, parallel: bool) -> Result<()> {
    let config = QuoteFeedConfig::load(config_path)?;
    if config.securities.is_empty() {
        bail!("no securities configured in {}", config_path.display());
    }

    let registry = registry_for(&config)?;
    let summary = refresh_all(&registry, &config.securities, parallel, &LogProgress);

    let csv = export_csv(&summary.refreshes)?;
    match output {
        Some(path) => std::fs::write(path, csv)
            .with_context(|| format!("write {}", path.display()))?,
        None => print!("{csv}"),
    }

    for refresh in summary.refreshes.iter().filter(|r| !r.succeeded()) {
        eprintln!("FAIL: {}", refresh.security);
        report_errors(refresh.result.errors());
    }
    eprintln!(
        "Refresh complete: {}/{} succeeded, {} failed",
        summary.succeeded(),
        summary.total(),
        summary.failed()
    );

    if !summary.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: security, date, close, high, low, volume.
fn export_csv(refreshes: &[SecurityRefresh]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["security", "date", "close", "high", "low", "volume"])?;

    for refresh in refreshes {
        for r in refresh.result.records() {
            wtr.write_record([
                &refresh.security,
                &r.date.format("%Y-%m-%d").to_string(),
                &format_quote(r.value),
                &r.high.map(format_quote).unwrap_or_default(),
                &r.low.map(format_quote).unwrap_or_default(),
                &r.volume.map(|v| v.to_string()).unwrap_or_default(),
            ])?;
        }
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn run_latest(config_path: &Path) -> Result<()> {
    let config = QuoteFeedConfig::load(config_path)?;
    let registry = registry_for(&config)?;

    println!("security\tdate\tclose\tprevious_close");
    for security in &config.securities {
        let latest = registry.latest_quote(security);
        report_errors(&latest.errors);
        match latest.price {
            Some(p) => println!(
                "{}\t{}\t{}\t{}",
                security.name,
                p.date,
                format_quote(p.value),
                format_quote(p.previous_close)
            ),
            None => eprintln!("FAIL: {}: no latest price", security.name),
        }
    }
    Ok(())
}
