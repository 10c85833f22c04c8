mod cache;
mod config;
mod error;
mod highlight;
mod matrix;
mod models;
mod pipeline;
mod provider;
mod report;
mod session;
mod utils;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::pipeline::{AnalysisRequest, HistoryRequest, Pipeline, parse_tickers, validate_range};
use crate::provider::YahooProvider;
use crate::session::Session;

#[derive(Parser)]
#[command(
    name = "ticker-compare",
    about = "Side-by-side financial indicators and price history for up to three tickers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Compare indicators of up to three tickers (comma-separated)
    Analyze {
        /// e.g. "GOOG, AAPL, MSFT"
        tickers: String,

        /// Skip the company descriptions
        #[arg(long)]
        no_profiles: bool,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Closing-price history, exported to CSV per ticker
    History {
        tickers: String,

        /// First day (default from config: 2020-01-01)
        #[arg(short, long)]
        start: Option<NaiveDate>,

        /// Day after the last bar (default: today)
        #[arg(short, long)]
        end: Option<NaiveDate>,

        /// Directory for <TICKER>.csv files
        #[arg(short, long, env = "TICKER_COMPARE_HISTORY_DIR")]
        out: Option<PathBuf>,
    },

    /// Print the indicator legend
    Legend,

    /// Interactive session with cached lookups
    Session,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "ticker_compare=info,warn",
        1 => "ticker_compare=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Analyze {
            tickers,
            no_profiles,
            format,
        } => {
            let tickers = parse_tickers(&tickers, config.report.max_tickers)?;
            let provider = YahooProvider::new(&config.provider).context("Failed to build provider")?;

            let _t = utils::Timer::start("analyze");
            let report = Pipeline::new(&provider)
                .analyze(&AnalysisRequest {
                    tickers,
                    include_profiles: !no_profiles,
                })
                .await;

            match format {
                OutputFormat::Table => println!("{}", report::render_analysis(&report, true)),
                OutputFormat::Json => println!("{}", report::analysis_json(&report)?),
            }
        }

        Command::History {
            tickers,
            start,
            end,
            out,
        } => {
            let tickers = parse_tickers(&tickers, config.report.max_tickers)?;
            let start = start.unwrap_or(config.report.default_start);
            let end = end.unwrap_or_else(|| Local::now().date_naive());
            validate_range(start, end)?;
            let provider = YahooProvider::new(&config.provider).context("Failed to build provider")?;

            let _t = utils::Timer::start("history");
            let report = Pipeline::new(&provider)
                .history(&HistoryRequest { tickers, start, end })
                .await;

            println!("{}", report::render_history(&report));

            let dir = out.unwrap_or_else(|| config.report.history_dir.clone());
            let written = report::write_history_csv(&dir, &report)?;
            info!("{} CSV files in {:?}", written.len(), dir);
        }

        Command::Legend => {
            println!("{}", report::render_legend());
        }

        Command::Session => {
            let provider = YahooProvider::new(&config.provider).context("Failed to build provider")?;
            Session::new(provider, config).run().await?;
        }
    }

    Ok(())
}
