//! Interactive mode: one long-lived session answering `analyze` / `history`
//! commands typed on stdin.
//!
//! The session owns the last analyzed ticker list, and memoizes provider
//! responses until a different ticker list is analyzed.

use crate::cache::CachedProvider;
use crate::config::AppConfig;
use crate::models::Ticker;
use crate::pipeline::{
    AnalysisReport, AnalysisRequest, HistoryRequest, Pipeline, parse_tickers, validate_range,
};
use crate::provider::MarketDataProvider;
use crate::report::{render_analysis, render_column, render_history, render_legend};
use crate::utils::Timer;
use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  analyze <T1,T2,T3>      compare up to three tickers (e.g. analyze GOOG, AAPL, MSFT)
  history [START [END]]   closing prices for the last analyzed tickers (YYYY-MM-DD)
  show <TICKER>           indicators of one ticker from the last comparison
  legend                  indicator legend
  help                    this text
  quit                    leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Analyze(String),
    History {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Show(String),
    Legend,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let cmd = match verb.to_lowercase().as_str() {
        "analyze" | "a" => Command::Analyze(rest.to_string()),
        "history" | "h" => {
            let mut dates = rest.split_whitespace().map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .with_context(|| format!("invalid date {:?}, expected YYYY-MM-DD", s))
            });
            let start = dates.next().transpose()?;
            let end = dates.next().transpose()?;
            if dates.next().is_some() {
                bail!("history takes at most two dates");
            }
            Command::History { start, end }
        }
        "show" | "s" => Command::Show(rest.to_string()),
        "legend" | "l" => Command::Legend,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command {:?} (type `help`)", other),
    };
    Ok(Some(cmd))
}

pub struct Session<P> {
    provider: CachedProvider<P>,
    config: AppConfig,
    last_tickers: Vec<Ticker>,
    last_report: Option<AnalysisReport>,
}

impl<P: MarketDataProvider> Session<P> {
    pub fn new(provider: P, config: AppConfig) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        Self {
            provider: CachedProvider::new(provider, ttl),
            config,
            last_tickers: Vec::new(),
            last_report: None,
        }
    }

    pub fn last_tickers(&self) -> &[Ticker] {
        &self.last_tickers
    }

    /// Run one command and return the text to show.
    pub async fn handle(&mut self, cmd: Command, today: NaiveDate) -> Result<String> {
        match cmd {
            Command::Analyze(input) => {
                let tickers = parse_tickers(&input, self.config.report.max_tickers)?;
                if tickers != self.last_tickers {
                    self.provider.invalidate_all().await;
                }

                let _t = Timer::start("analyze");
                let report = Pipeline::new(&self.provider)
                    .analyze(&AnalysisRequest {
                        tickers: tickers.clone(),
                        include_profiles: true,
                    })
                    .await;
                debug!("{} responses cached", self.provider.len().await);

                let text = render_analysis(&report, false);
                self.last_tickers = tickers;
                self.last_report = Some(report);
                Ok(text)
            }
            Command::History { start, end } => {
                if self.last_tickers.is_empty() {
                    bail!("analyze some tickers first");
                }
                let start = start.unwrap_or(self.config.report.default_start);
                let end = end.unwrap_or(today);
                validate_range(start, end)?;

                let _t = Timer::start("history");
                let report = Pipeline::new(&self.provider)
                    .history(&HistoryRequest {
                        tickers: self.last_tickers.clone(),
                        start,
                        end,
                    })
                    .await;
                Ok(render_history(&report))
            }
            Command::Show(symbol) => {
                let Some(report) = &self.last_report else {
                    bail!("analyze some tickers first");
                };
                render_column(&report.matrix, &report.mask, &symbol)
                    .with_context(|| format!("{:?} is not in the last comparison", symbol.trim()))
            }
            Command::Legend => Ok(render_legend()),
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        println!("{}\n", HELP);
        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let cmd = match parse_command(&line) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(e) => {
                    println!("error: {:#}", e);
                    continue;
                }
            };
            if cmd == Command::Quit {
                break;
            }

            debug!("session command: {:?}", cmd);
            match self.handle(cmd, Local::now().date_naive()).await {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    warn!("{:#}", e);
                    println!("error: {:#}", e);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::FakeProvider;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn session() -> Session<FakeProvider> {
        Session::new(FakeProvider::sample(), AppConfig::default())
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(
            parse_command("analyze goog, aapl").unwrap(),
            Some(Command::Analyze("goog, aapl".into()))
        );
        assert_eq!(
            parse_command("history 2021-01-01").unwrap(),
            Some(Command::History {
                start: NaiveDate::from_ymd_opt(2021, 1, 1),
                end: None
            })
        );
        assert_eq!(parse_command("QUIT").unwrap(), Some(Command::Quit));
        assert!(parse_command("history 01/01/2021").is_err());
        assert!(parse_command("plot").is_err());
    }

    #[tokio::test]
    async fn test_repeat_analyze_uses_cache() {
        let mut s = session();
        let out = s.handle(Command::Analyze("aapl,goog".into()), today()).await.unwrap();
        assert!(out.contains("Comparativo dos Indicadores"));
        // profile + indicators per ticker
        assert_eq!(s.provider.inner().call_count(), 4);

        s.handle(Command::Analyze(" AAPL , GOOG ".into()), today()).await.unwrap();
        assert_eq!(s.provider.inner().call_count(), 4);
    }

    #[tokio::test]
    async fn test_new_ticker_list_invalidates_cache() {
        let mut s = session();
        s.handle(Command::Analyze("aapl".into()), today()).await.unwrap();
        s.handle(Command::Analyze("aapl,goog".into()), today()).await.unwrap();

        assert_eq!(s.provider.inner().call_count(), 2 + 4);
        let syms: Vec<&str> = s.last_tickers().iter().map(Ticker::as_str).collect();
        assert_eq!(syms, vec!["AAPL", "GOOG"]);
    }

    #[tokio::test]
    async fn test_history_needs_tickers_and_valid_range() {
        let mut s = session();
        let history = Command::History { start: None, end: None };
        assert!(s.handle(history.clone(), today()).await.is_err());

        s.handle(Command::Analyze("aapl".into()), today()).await.unwrap();
        let out = s.handle(history, today()).await.unwrap();
        assert!(out.contains("2020-01-01 → 2024-06-01"));
        assert!(out.contains("AAPL"));

        let inverted = Command::History {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2023, 1, 1),
        };
        assert!(s.handle(inverted, today()).await.is_err());
    }

    #[tokio::test]
    async fn test_show_resolves_any_spelling() {
        let mut s = session();
        assert!(s.handle(Command::Show("aapl".into()), today()).await.is_err());

        s.handle(Command::Analyze("aapl, zzzz".into()), today()).await.unwrap();
        let upper = s.handle(Command::Show("AAPL".into()), today()).await.unwrap();
        let mixed = s.handle(Command::Show(" AaPl ".into()), today()).await.unwrap();
        assert_eq!(upper, mixed);
        assert!(upper.contains("Rend. de Dividendos"));
        // failed ticker has no column
        assert!(s.handle(Command::Show("zzzz".into()), today()).await.is_err());
    }

    #[tokio::test]
    async fn test_too_many_tickers_rejected() {
        let mut s = session();
        let err = s
            .handle(Command::Analyze("a,b,c,d".into()), today())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("at most 3"));
        assert_eq!(s.provider.inner().call_count(), 0);
    }
}
