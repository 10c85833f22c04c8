//! Indicator matrix: one column per successfully fetched ticker, one row per
//! indicator in [`Indicator::ALL`] order.
//!
//! Records are fetched one ticker at a time. A ticker whose fetch fails is
//! reported as a [`TickerWarning`] and left out of the matrix; every column
//! that does make it in is complete, with the sentinel standing in for
//! missing data.

use crate::error::ProviderError;
use crate::models::{Indicator, IndicatorRecord, Ticker, TickerWarning, Value};
use crate::provider::MarketDataProvider;
use crate::provider::cleaner::clean_indicators;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub indicator: Indicator,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorMatrix {
    tickers: Vec<Ticker>,
    rows: Vec<IndicatorRow>,
}

impl IndicatorMatrix {
    /// Transpose per-ticker records into indicator rows. A ticker seen
    /// twice keeps only its first record.
    pub fn from_records(records: &[IndicatorRecord]) -> Self {
        let mut columns: Vec<&IndicatorRecord> = Vec::with_capacity(records.len());
        for rec in records {
            if columns.iter().any(|c| c.ticker == rec.ticker) {
                warn!("{}: duplicate record ignored", rec.ticker);
                continue;
            }
            columns.push(rec);
        }

        let rows = Indicator::ALL
            .iter()
            .map(|&indicator| IndicatorRow {
                indicator,
                values: columns.iter().map(|rec| rec.get(indicator)).collect(),
            })
            .collect();

        Self {
            tickers: columns.iter().map(|rec| rec.ticker.clone()).collect(),
            rows,
        }
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Column position for a ticker in any spelling (" aapl " finds AAPL).
    pub fn column_index(&self, symbol: &str) -> Option<usize> {
        let ticker = Ticker::new(symbol)?;
        self.tickers.iter().position(|t| *t == ticker)
    }

    /// All indicators for one ticker, in row order.
    pub fn column(&self, symbol: &str) -> Option<Vec<(Indicator, Value)>> {
        let col = self.column_index(symbol)?;
        Some(self.rows.iter().map(|r| (r.indicator, r.values[col])).collect())
    }
}

/// A matrix plus the notices for tickers that did not make it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatrixOutcome {
    pub matrix: IndicatorMatrix,
    pub warnings: Vec<TickerWarning>,
}

/// Aggregate per-ticker results: successes become columns (in input order),
/// failures become warnings.
pub fn build_matrix(results: Vec<(Ticker, Result<IndicatorRecord, ProviderError>)>) -> MatrixOutcome {
    let mut records = Vec::with_capacity(results.len());
    let mut warnings = Vec::new();

    for (ticker, result) in results {
        match result {
            Ok(rec) => records.push(rec),
            Err(e) => {
                warn!("{}: {}", ticker, e);
                warnings.push(TickerWarning {
                    ticker,
                    message: format!("could not fetch indicators: {}", e),
                });
            }
        }
    }

    MatrixOutcome {
        matrix: IndicatorMatrix::from_records(&records),
        warnings,
    }
}

/// Fetch indicators for each ticker in turn and build the matrix.
pub async fn fetch_matrix<P>(provider: &P, tickers: &[Ticker]) -> MatrixOutcome
where
    P: MarketDataProvider + ?Sized,
{
    let mut results = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let result = provider
            .fetch_indicators(ticker)
            .await
            .map(|raw| clean_indicators(ticker, &raw));
        results.push((ticker.clone(), result));
    }

    let outcome = build_matrix(results);
    info!(
        "Indicator matrix: {} of {} tickers",
        outcome.matrix.tickers().len(),
        tickers.len()
    );
    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::RawIndicators;

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn record(symbol: &str, raw: RawIndicators) -> IndicatorRecord {
        clean_indicators(&ticker(symbol), &raw)
    }

    pub(crate) fn cell(m: &IndicatorMatrix, symbol: &str, ind: Indicator) -> Option<Value> {
        m.column(symbol)?.into_iter().find(|(i, _)| *i == ind).map(|(_, v)| v)
    }

    fn sample_results() -> Vec<(Ticker, Result<IndicatorRecord, ProviderError>)> {
        vec![
            (
                ticker("AAPL"),
                Ok(record("AAPL", RawIndicators::default().with("returnOnEquity", 1.5))),
            ),
            (
                ticker("XXXX"),
                Err(ProviderError::Provider {
                    symbol: "XXXX".into(),
                    reason: "Quote not found".into(),
                }),
            ),
            (
                ticker("MSFT"),
                Ok(record("MSFT", RawIndicators::default().with("dividendYield", 0.0072))),
            ),
        ]
    }

    #[test]
    fn test_every_column_has_all_indicators() {
        let outcome = build_matrix(sample_results());
        let m = &outcome.matrix;

        assert_eq!(m.rows().len(), 15);
        for (row, ind) in m.rows().iter().zip(Indicator::ALL) {
            assert_eq!(row.indicator, ind);
            assert_eq!(row.values.len(), m.tickers().len());
        }
        assert_eq!(m.column("AAPL").unwrap().len(), 15);
        assert_eq!(cell(m, "AAPL", Indicator::DividendYield), Some(Value::Unavailable));
    }

    #[test]
    fn test_failed_ticker_is_absent() {
        let outcome = build_matrix(sample_results());
        let syms: Vec<&str> = outcome.matrix.tickers().iter().map(Ticker::as_str).collect();

        assert_eq!(syms, vec!["AAPL", "MSFT"]);
        assert!(outcome.matrix.column_index("XXXX").is_none());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].ticker.as_str(), "XXXX");
    }

    #[test]
    fn test_lookup_normalizes_symbol() {
        let outcome = build_matrix(sample_results());
        let m = &outcome.matrix;

        let idx = m.column_index("AAPL");
        assert!(idx.is_some());
        assert_eq!(m.column_index(" aapl "), idx);
        assert_eq!(m.column_index("AaPl"), idx);
        assert_eq!(cell(m, "aapl", Indicator::ReturnOnEquity), Some(Value::Numeric(1.5)));
    }

    #[test]
    fn test_duplicate_records_collapse() {
        let recs = vec![
            record("AAPL", RawIndicators::default().with("priceToBook", 1.0)),
            record("AAPL", RawIndicators::default().with("priceToBook", 2.0)),
        ];
        let m = IndicatorMatrix::from_records(&recs);
        assert_eq!(m.tickers().len(), 1);
        assert_eq!(cell(&m, "AAPL", Indicator::PriceToBook), Some(Value::Numeric(1.0)));
    }

    #[test]
    fn test_all_failed_gives_empty_matrix() {
        let outcome = build_matrix(vec![(ticker("A"), Err(ProviderError::MissingCrumb))]);
        assert!(outcome.matrix.is_empty());
        assert_eq!(outcome.matrix.rows().len(), 15);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = serde_json::to_string(&build_matrix(sample_results())).unwrap();
        let b = serde_json::to_string(&build_matrix(sample_results())).unwrap();
        assert_eq!(a, b);
    }
}
