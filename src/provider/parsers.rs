//! JSON extraction for the Yahoo Finance `quoteSummary` and `chart` APIs.
//!
//! Numeric fields arrive either bare or wrapped as `{"raw": 1.23, "fmt": "1.23"}`;
//! a missing value shows up as `{}`, `null` or no key at all.

use crate::error::ProviderError;
use crate::models::{CompanyProfile, PricePoint, RawIndicators};
use chrono::DateTime;
use serde_json::Value;

/// quoteSummary modules carrying the comparison fields, in lookup priority.
pub const INDICATOR_MODULES: [&str; 3] = ["financialData", "defaultKeyStatistics", "summaryDetail"];

pub const PROFILE_MODULES: [&str; 2] = ["assetProfile", "price"];

// ── Field helpers ─────────────────────────────────────────────────────────────

pub fn raw_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("raw").and_then(Value::as_f64),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn raw_string(v: Option<&Value>) -> Option<String> {
    let s = match v? {
        Value::String(s) => s.trim(),
        Value::Object(map) => map.get("fmt")?.as_str()?.trim(),
        _ => return None,
    };
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// The provider's own error description, wherever the envelope puts it.
pub fn provider_error_message(json: &Value) -> Option<String> {
    ["quoteSummary", "chart", "finance"].iter().find_map(|root| {
        let err = json.get(root)?.get("error")?;
        if err.is_null() {
            return None;
        }
        err.get("description")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(err.to_string()))
    })
}

/// Unwrap `{root: {result: [first, ..], error: ..}}`.
fn first_result<'a>(json: &'a Value, root: &str, symbol: &str) -> Result<&'a Value, ProviderError> {
    let envelope = json
        .get(root)
        .ok_or_else(|| ProviderError::Malformed(format!("missing `{}` envelope", root)))?;

    if let Some(reason) = provider_error_message(json) {
        return Err(ProviderError::Provider {
            symbol: symbol.to_string(),
            reason,
        });
    }

    envelope
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .ok_or_else(|| ProviderError::NoData(symbol.to_string()))
}

// ── quoteSummary → indicators ─────────────────────────────────────────────────

/// Collect every numeric field across the indicator modules. When a field
/// appears in more than one module the first module wins.
pub fn parse_quote_summary(json: &Value, symbol: &str) -> Result<RawIndicators, ProviderError> {
    let result = first_result(json, "quoteSummary", symbol)?;
    let mut raw = RawIndicators::default();

    for module in INDICATOR_MODULES {
        let Some(fields) = result.get(module).and_then(Value::as_object) else {
            continue;
        };
        for (name, value) in fields {
            if raw.fields.contains_key(name) {
                continue;
            }
            if let Some(n) = raw_number(value) {
                raw.fields.insert(name.clone(), n);
            }
        }
    }

    Ok(raw)
}

// ── quoteSummary → profile ────────────────────────────────────────────────────

pub fn parse_profile(json: &Value, symbol: &str) -> Result<CompanyProfile, ProviderError> {
    let result = first_result(json, "quoteSummary", symbol)?;
    let asset = result.get("assetProfile");
    let price = result.get("price");
    let field = |module: Option<&Value>, name: &str| raw_string(module.and_then(|m| m.get(name)));

    Ok(CompanyProfile {
        symbol: symbol.to_string(),
        name: field(price, "longName").or_else(|| field(price, "shortName")),
        summary: field(asset, "longBusinessSummary"),
        industry: field(asset, "industry"),
        sector: field(asset, "sector"),
        employees: asset
            .and_then(|a| a.get("fullTimeEmployees"))
            .and_then(raw_number)
            .map(|n| n as i64),
        country: field(asset, "country"),
        website: field(asset, "website"),
    })
}

// ── chart → closing prices ────────────────────────────────────────────────────

/// Daily closes in provider order. Bars without a close are skipped; dates
/// are taken in the exchange's local time.
pub fn parse_chart(json: &Value, symbol: &str) -> Result<Vec<PricePoint>, ProviderError> {
    let result = first_result(json, "chart", symbol)?;

    let offset = result
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(Value::as_i64)
        .unwrap_or(0);

    // An empty date range comes back without a timestamp array
    let Some(timestamps) = result.get("timestamp").and_then(Value::as_array) else {
        return Ok(vec![]);
    };

    let closes = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(Value::as_array)
        .and_then(|q| q.first())
        .and_then(|q| q.get("close"))
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed(format!("{}: chart without close series", symbol)))?;

    if closes.len() != timestamps.len() {
        return Err(ProviderError::Malformed(format!(
            "{}: {} timestamps but {} closes",
            symbol,
            timestamps.len(),
            closes.len()
        )));
    }

    let points = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts.as_i64()? + offset, 0)?.date_naive();
            Some(PricePoint {
                date,
                close: raw_number(close)?,
            })
        })
        .collect();

    Ok(points)
}

// ── crumb ─────────────────────────────────────────────────────────────────────

/// The crumb endpoint answers with the bare token as plain text.
pub fn parse_crumb(body: &str) -> Result<String, ProviderError> {
    let crumb = body.trim();
    if crumb.is_empty() || crumb.contains(char::is_whitespace) || crumb.contains('<') {
        return Err(ProviderError::MissingCrumb);
    }
    Ok(crumb.to_string())
}
