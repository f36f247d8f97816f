use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// RawCell – a single untyped cell of the exported sheet
// ---------------------------------------------------------------------------

/// One cell as delivered by the source, before any schema is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    /// Whole numbers are kept exact; IDs can exceed what an `f64` represents.
    Integer(i64),
    Number(f64),
}

impl RawCell {
    /// Build a text cell, trimming surrounding whitespace.
    /// Whitespace-only input becomes [`RawCell::Empty`].
    pub fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(trimmed.to_string())
        }
    }

    /// Build a numeric cell. NaN is treated the way spreadsheets export it: empty.
    pub fn from_number(v: f64) -> Self {
        if v.is_nan() {
            RawCell::Empty
        } else {
            RawCell::Number(v)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    /// The cleaned textual value of the cell, `None` when empty.
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Integer(i) => Some(i.to_string()),
            RawCell::Number(v) => Some(format_number(*v)),
        }
    }
}

impl Hash for RawCell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            RawCell::Empty => {}
            RawCell::Text(s) => s.hash(state),
            RawCell::Integer(i) => i.hash(state),
            RawCell::Number(v) => v.to_bits().hash(state),
        }
    }
}

/// Integral values print without a fractional part (`5.0` → `"5"`), so IDs and
/// line numbers that went through a float column read back as they were typed.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

// ---------------------------------------------------------------------------
// RawTable – rows of cells, no header interpretation
// ---------------------------------------------------------------------------

/// The sheet exactly as fetched: every physical row, including the decorative
/// title row and the header row. Rows may have different widths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        RawTable { rows }
    }

    /// Convenience constructor from string rows; each value goes through
    /// [`RawCell::from_text`].
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RawTable {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|s| RawCell::from_text(s.as_ref())).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `col`); cells past the end of a short row read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        static EMPTY: RawCell = RawCell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Content hash used as the cache key for normalized snapshots.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.rows.len().hash(&mut hasher);
        for row in &self.rows {
            row.hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_trims_and_empties() {
        assert_eq!(RawCell::from_text("  Ana "), RawCell::Text("Ana".into()));
        assert_eq!(RawCell::from_text("   "), RawCell::Empty);
        assert_eq!(RawCell::from_text(""), RawCell::Empty);
    }

    #[test]
    fn test_number_to_text() {
        assert_eq!(RawCell::Number(5.0).to_text().as_deref(), Some("5"));
        assert_eq!(RawCell::Number(12345.0).to_text().as_deref(), Some("12345"));
        assert_eq!(RawCell::Number(2.5).to_text().as_deref(), Some("2.5"));
        assert_eq!(RawCell::from_number(f64::NAN), RawCell::Empty);
        assert_eq!(
            RawCell::Integer(9_007_199_254_740_993).to_text().as_deref(),
            Some("9007199254740993")
        );
    }

    #[test]
    fn test_cell_past_row_end_is_empty() {
        let table = RawTable::from_text_rows(vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(table.cell(1, 0), &RawCell::Text("c".into()));
        assert!(table.cell(1, 1).is_empty());
        assert!(table.cell(5, 0).is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = RawTable::from_text_rows(vec![vec!["x", "1"]]);
        let b = RawTable::from_text_rows(vec![vec!["x", "1"]]);
        let c = RawTable::from_text_rows(vec![vec!["x", "2"]]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
