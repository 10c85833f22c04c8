use crate::models::{Indicator, IndicatorRecord, PricePoint, RawIndicators, Ticker, Value};
use std::collections::BTreeMap;
use tracing::warn;

// ── Ticker input ──────────────────────────────────────────────────────────────

/// Split a comma-separated ticker list. Entries are normalized, blanks are
/// dropped and repeated symbols keep only their first position.
/// " aapl, msft,,AAPL " → [AAPL, MSFT]
pub fn parse_ticker_list(input: &str) -> Vec<Ticker> {
    let mut tickers: Vec<Ticker> = Vec::new();
    for ticker in input.split(',').filter_map(Ticker::new) {
        if !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}

// ── RawIndicators → IndicatorRecord ──────────────────────────────────────────

/// Pick the fifteen comparison indicators out of a raw provider payload.
/// Scaling only touches values that are present; an absent field stays the
/// sentinel.
pub fn clean_indicators(ticker: &Ticker, raw: &RawIndicators) -> IndicatorRecord {
    let values: BTreeMap<Indicator, Value> = Indicator::ALL
        .iter()
        .map(|&ind| {
            let value = raw.get(ind.source_field()).map(|v| v * ind.scale());
            (ind, Value::from_option(value))
        })
        .collect();

    IndicatorRecord::new(ticker.clone(), values)
}

// ── Price history ─────────────────────────────────────────────────────────────

/// Sort by date, drop non-positive closes and keep the last bar of any
/// repeated date.
pub fn clean_history(ticker: &Ticker, mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.retain(|p| {
        if p.close > 0.0 {
            true
        } else {
            warn!("Invalid close {} for {} on {}", p.close, ticker, p.date);
            false
        }
    });

    points.sort_by_key(|p| p.date);

    let mut cleaned: Vec<PricePoint> = Vec::with_capacity(points.len());
    for p in points {
        match cleaned.last_mut() {
            Some(last) if last.date == p.date => *last = p,
            _ => cleaned.push(p),
        }
    }
    cleaned
}
