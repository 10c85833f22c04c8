//! Request/response orchestration for the two user actions.
//!
//! `analyze`: profiles (optional) + indicator matrix + highlight mask.
//! `history`: daily closing prices over a date range.
//!
//! Both walk the tickers one at a time and never fail as a whole: a ticker
//! that cannot be fetched turns into a [`TickerWarning`].

use crate::highlight::{HighlightMask, highlight_matrix};
use crate::matrix::{IndicatorMatrix, fetch_matrix};
use crate::models::{CompanyProfile, PricePoint, Ticker, TickerWarning};
use crate::provider::MarketDataProvider;
use crate::provider::cleaner::{clean_history, parse_ticker_list};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

// ── Requests / responses ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub tickers: Vec<Ticker>,
    pub include_profiles: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub matrix: IndicatorMatrix,
    pub mask: HighlightMask,
    /// One entry per requested ticker; `None` when the profile fetch failed.
    pub profiles: Vec<(Ticker, Option<CompanyProfile>)>,
    pub warnings: Vec<TickerWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub tickers: Vec<Ticker>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSeries {
    pub ticker: Ticker,
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Only tickers with at least one bar.
    pub series: Vec<TickerSeries>,
    pub warnings: Vec<TickerWarning>,
}

// ── Input validation ──────────────────────────────────────────────────────────

/// Parse the comma-separated ticker field and enforce the ticker limit.
pub fn parse_tickers(input: &str, max_tickers: usize) -> Result<Vec<Ticker>> {
    let tickers = parse_ticker_list(input);
    if tickers.is_empty() {
        bail!("no ticker given (example: GOOG, AAPL, MSFT)");
    }
    if tickers.len() > max_tickers {
        bail!("at most {} tickers can be compared, got {}", max_tickers, tickers.len());
    }
    Ok(tickers)
}

pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start >= end {
        bail!("start date {} must be before end date {}", start, end);
    }
    Ok(())
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline<'a, P: ?Sized> {
    provider: &'a P,
}

impl<'a, P: MarketDataProvider + ?Sized> Pipeline<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisReport {
        let mut warnings = Vec::new();
        let mut profiles = Vec::new();

        if request.include_profiles {
            for ticker in &request.tickers {
                match self.provider.fetch_profile(ticker).await {
                    Ok(profile) => profiles.push((ticker.clone(), Some(profile))),
                    Err(e) => {
                        warn!("{}: profile: {}", ticker, e);
                        warnings.push(TickerWarning {
                            ticker: ticker.clone(),
                            message: format!("could not fetch company profile: {}", e),
                        });
                        profiles.push((ticker.clone(), None));
                    }
                }
            }
        }

        let outcome = fetch_matrix(self.provider, &request.tickers).await;
        warnings.extend(outcome.warnings);
        let mask = highlight_matrix(&outcome.matrix);

        info!(
            "Analysis done: {} tickers requested, {} in table, {} warnings",
            request.tickers.len(),
            outcome.matrix.tickers().len(),
            warnings.len()
        );

        AnalysisReport {
            matrix: outcome.matrix,
            mask,
            profiles,
            warnings,
        }
    }

    pub async fn history(&self, request: &HistoryRequest) -> HistoryReport {
        let mut series = Vec::new();
        let mut warnings = Vec::new();

        for ticker in &request.tickers {
            match self.provider.fetch_history(ticker, request.start, request.end).await {
                Ok(points) => {
                    let points = clean_history(ticker, points);
                    if points.is_empty() {
                        warn!("{}: no bars between {} and {}", ticker, request.start, request.end);
                        warnings.push(TickerWarning {
                            ticker: ticker.clone(),
                            message: "no historical data available".to_string(),
                        });
                    } else {
                        series.push(TickerSeries {
                            ticker: ticker.clone(),
                            points,
                        });
                    }
                }
                Err(e) => {
                    warn!("{}: history: {}", ticker, e);
                    warnings.push(TickerWarning {
                        ticker: ticker.clone(),
                        message: format!("could not fetch history: {}", e),
                    });
                }
            }
        }

        info!(
            "History done: {} of {} tickers with data",
            series.len(),
            request.tickers.len()
        );

        HistoryReport {
            start: request.start,
            end: request.end,
            series,
            warnings,
        }
    }
}
