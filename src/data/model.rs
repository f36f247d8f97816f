use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use super::raw::format_number;

// ---------------------------------------------------------------------------
// Column – the fixed roster schema
// ---------------------------------------------------------------------------

/// Columns retained from the roster export. Anything else in the sheet is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Column {
    Building,
    #[serde(rename = "SPV")]
    Spv,
    Line,
    OperatorName,
    #[serde(rename = "OperatorID")]
    OperatorId,
    Style,
    ProcessPart,
    ProcessName,
    GradeProcess,
    GradeCountif,
    GradeQuality,
    FinalGrade,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Building,
        Column::Spv,
        Column::Line,
        Column::OperatorName,
        Column::OperatorId,
        Column::Style,
        Column::ProcessPart,
        Column::ProcessName,
        Column::GradeProcess,
        Column::GradeCountif,
        Column::GradeQuality,
        Column::FinalGrade,
    ];

    /// Header label as printed in the roster sheet.
    pub fn label(self) -> &'static str {
        match self {
            Column::Building => "Building",
            Column::Spv => "SPV",
            Column::Line => "Line",
            Column::OperatorName => "Name Opt",
            Column::OperatorId => "ID NO",
            Column::Style => "Style",
            Column::ProcessPart => "Process Part",
            Column::ProcessName => "Name Process (Bahasa)",
            Column::GradeProcess => "Grade Process",
            Column::GradeCountif => "Grade Countif",
            Column::GradeQuality => "Grade Quality",
            Column::FinalGrade => "Final Grade",
        }
    }

    /// Field name used in normalized output.
    pub fn name(self) -> &'static str {
        match self {
            Column::Building => "Building",
            Column::Spv => "SPV",
            Column::Line => "Line",
            Column::OperatorName => "OperatorName",
            Column::OperatorId => "OperatorID",
            Column::Style => "Style",
            Column::ProcessPart => "ProcessPart",
            Column::ProcessName => "ProcessName",
            Column::GradeProcess => "GradeProcess",
            Column::GradeCountif => "GradeCountif",
            Column::GradeQuality => "GradeQuality",
            Column::FinalGrade => "FinalGrade",
        }
    }

    /// Match a header cell (already trimmed) against the sheet label or the field name.
    pub fn from_header(header: &str) -> Option<Column> {
        Column::ALL
            .into_iter()
            .find(|c| c.label() == header || c.name() == header)
    }
}

// ---------------------------------------------------------------------------
// IdentityField – the columns reconstructed by fill-down
// ---------------------------------------------------------------------------

/// Grouping-identity fields whose values are dropped by merged cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Building,
    Spv,
    Line,
    OperatorName,
    OperatorId,
    FinalGrade,
}

impl IdentityField {
    pub const ALL: [IdentityField; 6] = [
        IdentityField::Building,
        IdentityField::Spv,
        IdentityField::Line,
        IdentityField::OperatorName,
        IdentityField::OperatorId,
        IdentityField::FinalGrade,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Grade – the closed final-grade set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::A, Grade::B, Grade::C, Grade::D];

    /// Exact letter match after trimming; anything else is not a known grade.
    pub fn parse(s: &str) -> Option<Grade> {
        match s.trim() {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LineNumber – numeric line identifier
// ---------------------------------------------------------------------------

/// A parsed production line. Fractional values are kept as-is.
/// Manual `Eq`/`Ord`/`Hash` so it can key ordered maps and sets.
#[derive(Debug, Clone, Copy)]
pub struct LineNumber(f64);

impl LineNumber {
    /// `None` for non-finite values.
    pub fn new(v: f64) -> Option<Self> {
        v.is_finite().then_some(LineNumber(v))
    }

    /// Numeric coercion of a line cell; anything unparseable is unknown.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<f64>().ok().and_then(LineNumber::new)
    }
}

impl PartialEq for LineNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for LineNumber {}

impl PartialOrd for LineNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LineNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for LineNumber {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_number(self.0))
    }
}

impl Serialize for LineNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

// ---------------------------------------------------------------------------
// Record – one operator/process row
// ---------------------------------------------------------------------------

/// A normalized roster row. Blank cells are `None`; `process_name` is never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "Building")]
    pub building: Option<String>,
    #[serde(rename = "SPV")]
    pub spv: Option<String>,
    #[serde(rename = "Line")]
    pub line: Option<String>,
    #[serde(rename = "OperatorName")]
    pub operator_name: Option<String>,
    #[serde(rename = "OperatorID")]
    pub operator_id: Option<String>,
    #[serde(rename = "Style")]
    pub style: Option<String>,
    #[serde(rename = "ProcessPart")]
    pub process_part: Option<String>,
    #[serde(rename = "ProcessName")]
    pub process_name: String,
    #[serde(rename = "GradeProcess")]
    pub grade_process: Option<String>,
    #[serde(rename = "GradeCountif")]
    pub grade_countif: Option<String>,
    #[serde(rename = "GradeQuality")]
    pub grade_quality: Option<String>,
    #[serde(rename = "FinalGrade")]
    pub final_grade: Option<String>,
}

impl Record {
    /// Writable slot of an identity field, used by fill-down.
    pub fn identity_mut(&mut self, field: IdentityField) -> &mut Option<String> {
        match field {
            IdentityField::Building => &mut self.building,
            IdentityField::Spv => &mut self.spv,
            IdentityField::Line => &mut self.line,
            IdentityField::OperatorName => &mut self.operator_name,
            IdentityField::OperatorId => &mut self.operator_id,
            IdentityField::FinalGrade => &mut self.final_grade,
        }
    }

    /// Numeric line; `None` when blank or unparseable ("unknown").
    pub fn line_number(&self) -> Option<LineNumber> {
        self.line.as_deref().and_then(LineNumber::parse)
    }

    /// Final grade when it is one of A–D.
    pub fn grade(&self) -> Option<Grade> {
        self.final_grade.as_deref().and_then(Grade::parse)
    }
}

// ---------------------------------------------------------------------------
// RecordSet – ordered records plus the schema columns that were found
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    /// Rows in source order.
    pub records: Vec<Record>,
    /// Schema columns present in the source header.
    pub columns: BTreeSet<Column>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>, columns: BTreeSet<Column>) -> Self {
        RecordSet { records, columns }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_from_header() {
        assert_eq!(Column::from_header("Name Opt"), Some(Column::OperatorName));
        assert_eq!(Column::from_header("OperatorName"), Some(Column::OperatorName));
        assert_eq!(Column::from_header("ID NO"), Some(Column::OperatorId));
        assert_eq!(Column::from_header("Name Process (Bahasa)"), Some(Column::ProcessName));
        assert_eq!(Column::from_header("Remarks"), None);
    }

    #[test]
    fn test_grade_parse() {
        assert_eq!(Grade::parse("A"), Some(Grade::A));
        assert_eq!(Grade::parse(" D "), Some(Grade::D));
        assert_eq!(Grade::parse("E"), None);
        assert_eq!(Grade::parse(""), None);
    }

    #[test]
    fn test_line_number_parse_and_order() {
        assert_eq!(LineNumber::parse("5"), LineNumber::new(5.0));
        assert_eq!(LineNumber::parse("5.0"), LineNumber::new(5.0));
        assert_eq!(LineNumber::parse("N/A"), None);
        assert_eq!(LineNumber::parse("inf"), None);

        let mut lines = vec![
            LineNumber::parse("10").unwrap(),
            LineNumber::parse("2").unwrap(),
            LineNumber::parse("2.5").unwrap(),
        ];
        lines.sort();
        let shown: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(shown, vec!["2", "2.5", "10"]);
    }

    #[test]
    fn test_record_accessors() {
        let rec = Record {
            line: Some("N/A".into()),
            final_grade: Some("B".into()),
            process_name: "Sewing".into(),
            ..Default::default()
        };
        assert_eq!(rec.line_number(), None);
        assert_eq!(rec.grade(), Some(Grade::B));
    }
}
