use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Ticker ────────────────────────────────────────────────────────────────────

/// Normalized ticker symbol: trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Returns `None` when nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let symbol = normalise_symbol(raw);
        if symbol.is_empty() { None } else { Some(Self(symbol)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn normalise_symbol(s: &str) -> String {
    s.trim().to_uppercase()
}

// ── Indicators ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Indicator {
    PriceToBook,
    DividendYield,
    EbitdaMargin,
    EarningsPerShare,
    ReturnOnAssets,
    ReturnOnEquity,
    DebtToEquity,
    OperatingMargin,
    RevenueGrowth,
    EarningsGrowth,
    PriceToSales,
    TrailingPe,
    ForwardPe,
    // English-labelled duplicates of the two growth rows
    RevenueGrowthEn,
    EarningsGrowthEn,
}

impl Indicator {
    /// Display order of the comparison table.
    pub const ALL: [Indicator; 15] = [
        Indicator::PriceToBook,
        Indicator::DividendYield,
        Indicator::EbitdaMargin,
        Indicator::EarningsPerShare,
        Indicator::ReturnOnAssets,
        Indicator::ReturnOnEquity,
        Indicator::DebtToEquity,
        Indicator::OperatingMargin,
        Indicator::RevenueGrowth,
        Indicator::EarningsGrowth,
        Indicator::PriceToSales,
        Indicator::TrailingPe,
        Indicator::ForwardPe,
        Indicator::RevenueGrowthEn,
        Indicator::EarningsGrowthEn,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Indicator::PriceToBook => "P/VP",
            Indicator::DividendYield => "Rend. de Dividendos",
            Indicator::EbitdaMargin => "Margem EBITDA",
            Indicator::EarningsPerShare => "LPA (EPS)",
            Indicator::ReturnOnAssets => "ROA",
            Indicator::ReturnOnEquity => "ROE",
            Indicator::DebtToEquity => "Dívida/Equidade",
            Indicator::OperatingMargin => "Margem Operacional",
            Indicator::RevenueGrowth => "Crescimento de Receita",
            Indicator::EarningsGrowth => "Crescimento de Lucro",
            Indicator::PriceToSales => "Preço/Vendas",
            Indicator::TrailingPe => "PE Trailing",
            Indicator::ForwardPe => "PE Forward",
            Indicator::RevenueGrowthEn => "Revenue Growth",
            Indicator::EarningsGrowthEn => "Earnings Growth",
        }
    }

    /// Field name in the provider's quote summary.
    pub fn source_field(self) -> &'static str {
        match self {
            Indicator::PriceToBook => "priceToBook",
            Indicator::DividendYield => "dividendYield",
            Indicator::EbitdaMargin => "ebitdaMargins",
            Indicator::EarningsPerShare => "trailingEps",
            Indicator::ReturnOnAssets => "returnOnAssets",
            Indicator::ReturnOnEquity => "returnOnEquity",
            Indicator::DebtToEquity => "debtToEquity",
            Indicator::OperatingMargin => "operatingMargins",
            Indicator::RevenueGrowth | Indicator::RevenueGrowthEn => "revenueGrowth",
            Indicator::EarningsGrowth | Indicator::EarningsGrowthEn => "earningsGrowth",
            Indicator::PriceToSales => "priceToSalesTrailing12Months",
            Indicator::TrailingPe => "trailingPE",
            Indicator::ForwardPe => "forwardPE",
        }
    }

    /// Multiplier applied to a present raw value. Only dividend yield is
    /// delivered as a fraction meant for percent display; margins stay raw.
    pub fn scale(self) -> f64 {
        match self {
            Indicator::DividendYield => 100.0,
            _ => 1.0,
        }
    }

    /// Long form shown in the legend.
    pub fn description(self) -> &'static str {
        match self {
            Indicator::PriceToBook => "Preço/Valor Patrimonial",
            Indicator::DividendYield => "Rendimento de Dividendos",
            Indicator::EbitdaMargin => "Margem EBITDA",
            Indicator::EarningsPerShare => "Lucro por Ação",
            Indicator::ReturnOnAssets => "Retorno sobre Ativos",
            Indicator::ReturnOnEquity => "Retorno sobre Patrimônio",
            Indicator::DebtToEquity => "Dívida sobre Patrimônio",
            Indicator::OperatingMargin => "Margem Operacional",
            Indicator::RevenueGrowth => "Crescimento de Receita",
            Indicator::EarningsGrowth => "Crescimento de Lucro",
            Indicator::PriceToSales => "Preço sobre Vendas",
            Indicator::TrailingPe => "P/E Trailing",
            Indicator::ForwardPe => "P/E Forward",
            Indicator::RevenueGrowthEn => "Crescimento de Receita",
            Indicator::EarningsGrowthEn => "Crescimento de Lucro",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Cell value ────────────────────────────────────────────────────────────────

pub const NOT_AVAILABLE: &str = "N/A";

/// A single table cell: a number, or the explicit "not available" marker.
/// Serializes as a JSON number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Numeric(f64),
    Unavailable,
}

impl Value {
    pub fn from_option(v: Option<f64>) -> Self {
        match v {
            Some(n) if n.is_finite() => Value::Numeric(n),
            _ => Value::Unavailable,
        }
    }

    /// Coerce display text back into a cell. Anything that is not a finite
    /// number (including `N/A`, blanks and dashes) is `Unavailable`.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == NOT_AVAILABLE || s == "-" || s == "—" {
            return Value::Unavailable;
        }
        Value::from_option(s.parse::<f64>().ok())
    }

    /// Numeric view of the cell; `None` for the sentinel and for NaN.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Numeric(n) if !n.is_nan() => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(n) => write!(f, "{}", n),
            Value::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

// ── Provider payloads ─────────────────────────────────────────────────────────

/// Numeric fields returned by the provider for one ticker, keyed by the
/// provider's field name. Absent fields are simply not present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIndicators {
    pub fields: BTreeMap<String, f64>,
}

impl RawIndicators {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }

    #[cfg(test)]
    pub fn with(mut self, field: &str, value: f64) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }
}

/// One indicator set per ticker. Always holds all fifteen indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRecord {
    pub ticker: Ticker,
    values: BTreeMap<Indicator, Value>,
}

impl IndicatorRecord {
    /// Missing entries in `values` are filled with the sentinel.
    pub fn new(ticker: Ticker, mut values: BTreeMap<Indicator, Value>) -> Self {
        for ind in Indicator::ALL {
            values.entry(ind).or_insert(Value::Unavailable);
        }
        Self { ticker, values }
    }

    pub fn get(&self, indicator: Indicator) -> Value {
        self.values.get(&indicator).copied().unwrap_or(Value::Unavailable)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

// ── Price history ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

// ── Company profile ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub employees: Option<i64>,
    pub country: Option<String>,
    pub website: Option<String>,
}

// ── Warnings ──────────────────────────────────────────────────────────────────

/// Per-ticker notice surfaced to the user instead of aborting a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerWarning {
    pub ticker: Ticker,
    pub message: String,
}

impl fmt::Display for TickerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.ticker, self.message)
    }
}
