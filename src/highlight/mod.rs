//! Row-maximum highlighting for the comparison table.
//!
//! Only cells with a numeric value take part; the sentinel and anything that
//! does not parse as a number are skipped and never marked. Every cell equal
//! to the row maximum is marked, so ties all light up.

use crate::matrix::IndicatorMatrix;
use crate::models::Value;
use serde::Serialize;

/// Boolean table with the same shape as the matrix it was computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightMask {
    rows: Vec<Vec<bool>>,
}

impl HighlightMask {
    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> &[bool] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_max(&self, row: usize, col: usize) -> bool {
        self.row(row).get(col).copied().unwrap_or(false)
    }
}

/// A cell that may or may not hold a number.
pub trait NumericCell {
    fn numeric(&self) -> Option<f64>;
}

impl NumericCell for Value {
    fn numeric(&self) -> Option<f64> {
        self.as_f64()
    }
}

/// Display text is coerced the same way provider text is.
impl NumericCell for &str {
    fn numeric(&self) -> Option<f64> {
        Value::parse(self).as_f64()
    }
}

impl NumericCell for String {
    fn numeric(&self) -> Option<f64> {
        Value::parse(self).as_f64()
    }
}

pub fn highlight_row<C: NumericCell>(cells: &[C]) -> Vec<bool> {
    let max = cells
        .iter()
        .filter_map(C::numeric)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    match max {
        Some(max) => cells.iter().map(|c| c.numeric() == Some(max)).collect(),
        None => vec![false; cells.len()],
    }
}

pub fn highlight_matrix(matrix: &IndicatorMatrix) -> HighlightMask {
    HighlightMask {
        rows: matrix.rows().iter().map(|r| highlight_row(&r.values)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndicatorRecord, RawIndicators, Ticker};
    use crate::provider::cleaner::clean_indicators;

    #[test]
    fn test_simple_max() {
        assert_eq!(highlight_row(&["10", "25", "7"]), vec![false, true, false]);
    }

    #[test]
    fn test_ties_are_all_marked() {
        assert_eq!(highlight_row(&["5", "5", "3"]), vec![true, true, false]);
    }

    #[test]
    fn test_all_unavailable() {
        assert_eq!(highlight_row(&["N/A", "N/A"]), vec![false, false]);
        assert_eq!(highlight_row::<Value>(&[]), Vec::<bool>::new());
    }

    #[test]
    fn test_malformed_cell_only_excludes_itself() {
        assert_eq!(
            highlight_row(&["abc", "-1", "N/A", "-3"]),
            vec![false, true, false, false]
        );
        assert_eq!(
            highlight_row(&[Value::Numeric(f64::NAN), Value::Numeric(0.0)]),
            vec![false, true]
        );
    }

    #[test]
    fn test_text_and_typed_rows_agree() {
        let typed = [Value::Numeric(1.25), Value::Unavailable, Value::Numeric(1.25)];
        let text: Vec<String> = typed.iter().map(Value::to_string).collect();
        assert_eq!(highlight_row(&typed), highlight_row(&text));
    }

    #[test]
    fn test_mask_matches_matrix_shape() {
        let recs: Vec<IndicatorRecord> = [("AAPL", 45.0), ("MSFT", 12.0), ("GOOG", 45.0)]
            .iter()
            .map(|(s, pb)| {
                let raw = RawIndicators::default().with("priceToBook", *pb);
                clean_indicators(&Ticker::new(s).unwrap(), &raw)
            })
            .collect();
        let matrix = IndicatorMatrix::from_records(&recs);
        let mask = highlight_matrix(&matrix);

        assert_eq!(mask.rows().len(), matrix.rows().len());
        assert!(mask.rows().iter().all(|r| r.len() == 3));
        // P/VP is row 0; AAPL and GOOG tie
        assert_eq!(mask.row(0), &[true, false, true]);
        // every other row is all sentinel
        assert!(mask.rows()[1..].iter().flatten().all(|m| !m));
        assert!(!mask.is_max(99, 0));
    }

    #[test]
    fn test_mask_is_deterministic() {
        let recs = vec![clean_indicators(
            &Ticker::new("PETR4.SA").unwrap(),
            &RawIndicators::default().with("trailingPE", 4.2),
        )];
        let m = IndicatorMatrix::from_records(&recs);
        assert_eq!(highlight_matrix(&m), highlight_matrix(&m));
    }
}
