//! Terminal rendering of analysis and history reports, plus CSV export of
//! price history.

use crate::highlight::HighlightMask;
use crate::matrix::IndicatorMatrix;
use crate::models::{CompanyProfile, Indicator, NOT_AVAILABLE, Ticker, TickerWarning, Value};
use crate::pipeline::{AnalysisReport, HistoryReport, TickerSeries};
use crate::utils::fmt_number;
use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const RULE: &str = "─────────────────────────────────";

const TABLE_NOTE: &str = "\
Each row is a financial indicator and each column a company. Cells marked *
hold the highest value of their row. A higher value is not always better:
a high Dívida/Equidade means more leverage, while a high LPA (EPS) usually
points to stronger profitability. Treat this as a starting point only.";

// ── Cells ─────────────────────────────────────────────────────────────────────

/// Display text for one cell: up to four decimals, trailing zeros trimmed.
pub fn format_value(value: Value) -> String {
    match value.as_f64() {
        Some(n) => {
            let s = format!("{:.4}", n);
            let s = s.trim_end_matches('0').trim_end_matches('.');
            if s == "-0" { "0".to_string() } else { s.to_string() }
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_na(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or(NOT_AVAILABLE)
}

// ── Comparison table ──────────────────────────────────────────────────────────

pub fn render_comparison(matrix: &IndicatorMatrix, mask: &HighlightMask) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Indicador").add_attribute(Attribute::Bold)];
    header.extend(
        matrix
            .tickers()
            .iter()
            .map(|t| Cell::new(t.as_str()).add_attribute(Attribute::Bold)),
    );
    table.set_header(header);

    for (r, row) in matrix.rows().iter().enumerate() {
        let mut cells = vec![Cell::new(row.indicator.label())];
        for (c, value) in row.values.iter().enumerate() {
            let text = format_value(*value);
            let cell = if mask.is_max(r, c) {
                Cell::new(format!("{} *", text))
                    .fg(Color::Black)
                    .bg(Color::Yellow)
            } else {
                Cell::new(text)
            };
            cells.push(cell.set_alignment(CellAlignment::Right));
        }
        table.add_row(cells);
    }

    table.to_string()
}

/// One ticker's indicators as a two-column listing.
pub fn render_column(
    matrix: &IndicatorMatrix,
    mask: &HighlightMask,
    symbol: &str,
) -> Option<String> {
    let col = matrix.column_index(symbol)?;
    let ticker = &matrix.tickers()[col];
    let column = matrix.column(symbol)?;

    let mut out = format!("{}\n{}\n", ticker, RULE);
    for (r, (indicator, value)) in column.into_iter().enumerate() {
        let marker = if mask.is_max(r, col) { " *" } else { "" };
        let _ = writeln!(out, "  {:<24}{}{}", indicator.label(), format_value(value), marker);
    }
    Some(out)
}

// ── Profiles ──────────────────────────────────────────────────────────────────

pub fn render_profile(profile: &CompanyProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", profile.name.as_deref().unwrap_or(&profile.symbol));
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  Resumo       : {}", or_na(&profile.summary));
    let _ = writeln!(out, "  Indústria    : {}", or_na(&profile.industry));
    let _ = writeln!(out, "  Setor        : {}", or_na(&profile.sector));
    let _ = writeln!(
        out,
        "  Funcionários : {}",
        profile.employees.map(fmt_number).unwrap_or_else(|| NOT_AVAILABLE.into())
    );
    let _ = writeln!(out, "  País         : {}", or_na(&profile.country));
    let _ = writeln!(out, "  Site         : {}", or_na(&profile.website));
    out
}

pub fn render_profiles(profiles: &[(Ticker, Option<CompanyProfile>)]) -> String {
    profiles
        .iter()
        .map(|(ticker, profile)| match profile {
            Some(p) => render_profile(p),
            None => format!("No data found for {}\n", ticker),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Legend / warnings ─────────────────────────────────────────────────────────

pub fn render_legend() -> String {
    let mut out = String::from("Legenda:\n");
    for ind in Indicator::ALL {
        let _ = writeln!(out, "  {:<24}{}", ind.label(), ind.description());
    }
    out
}

pub fn render_warnings(warnings: &[TickerWarning]) -> String {
    warnings.iter().map(|w| format!("warning: {}\n", w)).collect()
}

pub fn render_analysis(report: &AnalysisReport, with_legend: bool) -> String {
    let mut out = String::new();

    if !report.profiles.is_empty() {
        out.push_str(&render_profiles(&report.profiles));
        out.push('\n');
    }

    if report.matrix.is_empty() {
        out.push_str("No indicators could be fetched for the requested tickers.\n");
    } else {
        out.push_str("Comparativo dos Indicadores\n");
        out.push_str(&render_comparison(&report.matrix, &report.mask));
        out.push('\n');
        out.push_str(TABLE_NOTE);
        out.push('\n');
    }

    if with_legend {
        out.push('\n');
        out.push_str(&render_legend());
    }

    if !report.warnings.is_empty() {
        out.push('\n');
        out.push_str(&render_warnings(&report.warnings));
    }
    out
}

// ── JSON view ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonRow<'a> {
    indicator: &'static str,
    values: &'a [Value],
    highlighted: &'a [bool],
}

#[derive(Serialize)]
struct JsonComparison<'a> {
    tickers: &'a [Ticker],
    rows: Vec<JsonRow<'a>>,
    warnings: &'a [TickerWarning],
}

/// Matrix and mask side by side, rows keyed by indicator label.
pub fn analysis_json(report: &AnalysisReport) -> Result<String> {
    let rows = report
        .matrix
        .rows()
        .iter()
        .zip(report.mask.rows())
        .map(|(row, highlighted)| JsonRow {
            indicator: row.indicator.label(),
            values: &row.values,
            highlighted,
        })
        .collect();

    let view = JsonComparison {
        tickers: report.matrix.tickers(),
        rows,
        warnings: &report.warnings,
    };
    serde_json::to_string_pretty(&view).context("Failed to serialize comparison")
}

// ── History ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub first: (chrono::NaiveDate, f64),
    pub last: (chrono::NaiveDate, f64),
    pub min: f64,
    pub max: f64,
    pub change_pct: f64,
}

pub fn summarize(series: &TickerSeries) -> Option<SeriesSummary> {
    let first = series.points.first()?;
    let last = series.points.last()?;
    let closes = series.points.iter().map(|p| p.close);
    let min = closes.clone().fold(f64::INFINITY, f64::min);
    let max = closes.fold(f64::NEG_INFINITY, f64::max);

    Some(SeriesSummary {
        first: (first.date, first.close),
        last: (last.date, last.close),
        min,
        max,
        change_pct: (last.close / first.close - 1.0) * 100.0,
    })
}

pub fn render_history(report: &HistoryReport) -> String {
    let mut out = format!("Histórico de Preço das Ações ({} → {})\n", report.start, report.end);

    if !report.series.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Ticker", "Dias", "De", "Até", "Abertura", "Fechamento", "Mín", "Máx", "Var. %"]);

        for s in &report.series {
            let Some(sum) = summarize(s) else { continue };
            table.add_row(vec![
                s.ticker.to_string(),
                s.points.len().to_string(),
                sum.first.0.to_string(),
                sum.last.0.to_string(),
                format_value(Value::Numeric(sum.first.1)),
                format_value(Value::Numeric(sum.last.1)),
                format_value(Value::Numeric(sum.min)),
                format_value(Value::Numeric(sum.max)),
                format!("{:+.2}", sum.change_pct),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push_str(&render_warnings(&report.warnings));
    out
}

/// Write one `<TICKER>.csv` with `date,close` rows per series.
pub fn write_history_csv(dir: &Path, report: &HistoryReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Could not create dir {:?}", dir))?;

    let mut written = Vec::with_capacity(report.series.len());
    for s in &report.series {
        let path = dir.join(format!("{}.csv", s.ticker));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {:?}", path))?;
        for point in &s.points {
            writer
                .serialize(point)
                .with_context(|| format!("write {} {}", s.ticker, point.date))?;
        }
        writer.flush()?;
        info!("{}: {} rows written to {:?}", s.ticker, s.points.len(), path);
        written.push(path);
    }
    Ok(written)
}
