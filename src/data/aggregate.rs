//! Headcount aggregation over a filtered record set.
//!
//! An operator usually spans several process rows, so every count here is
//! taken over de-duplicated operators (first row per `OperatorID`).

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::model::{Grade, LineNumber, Record};

/// First record per operator ID, in order. Records without an ID share a
/// single blank identity and collapse to the first of them.
pub fn dedup_operators<'a, I>(records: I) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut seen: HashSet<Option<&'a str>> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.operator_id.as_deref()))
        .collect()
}

pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

// ---------------------------------------------------------------------------
// GradeCounts
// ---------------------------------------------------------------------------

/// Operators per final grade. All four letters are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    counts: BTreeMap<Grade, usize>,
    /// De-duplicated operators, including those without a known grade.
    total_operators: usize,
}

impl GradeCounts {
    pub fn from_operators(operators: &[&Record]) -> Self {
        let mut counts: BTreeMap<Grade, usize> = Grade::ALL.into_iter().map(|g| (g, 0)).collect();
        for grade in operators.iter().filter_map(|r| r.grade()) {
            *counts.entry(grade).or_default() += 1;
        }
        GradeCounts {
            counts,
            total_operators: operators.len(),
        }
    }

    pub fn get(&self, grade: Grade) -> usize {
        self.counts.get(&grade).copied().unwrap_or(0)
    }

    pub fn total_operators(&self) -> usize {
        self.total_operators
    }

    /// Operators whose grade is one of A–D.
    pub fn known_total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Operators with a blank or unrecognised grade.
    pub fn unknown(&self) -> usize {
        self.total_operators - self.known_total()
    }

    /// Share of each grade among operators with a known grade.
    pub fn percentage(&self, grade: Grade) -> f64 {
        pct(self.get(grade), self.known_total())
    }

    /// `(grade, count)` in A–D order.
    pub fn iter(&self) -> impl Iterator<Item = (Grade, usize)> + '_ {
        self.counts.iter().map(|(g, c)| (*g, *c))
    }

    /// Chart labels in A–D order, e.g. `Grade A: 4 operators (40.0%)`.
    pub fn labels(&self) -> Vec<String> {
        self.iter()
            .map(|(grade, count)| {
                format!(
                    "Grade {grade}: {count} operators ({:.1}%)",
                    self.percentage(grade)
                )
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// LineBreakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineGradeCount {
    pub line: LineNumber,
    pub grade: Grade,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineTotal {
    pub line: LineNumber,
    pub total: usize,
}

/// Operators per (line, grade), ascending by line then grade, with per-line
/// totals for stacked percentages. Unknown lines and grades outside A–D are
/// left out, so each line's total is the sum of its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineBreakdown {
    pub entries: Vec<LineGradeCount>,
    pub totals: Vec<LineTotal>,
}

impl LineBreakdown {
    pub fn from_operators(operators: &[&Record]) -> Self {
        let mut grouped: BTreeMap<(LineNumber, Grade), usize> = BTreeMap::new();
        for record in operators {
            if let (Some(line), Some(grade)) = (record.line_number(), record.grade()) {
                *grouped.entry((line, grade)).or_default() += 1;
            }
        }

        let mut totals: BTreeMap<LineNumber, usize> = BTreeMap::new();
        for ((line, _), count) in &grouped {
            *totals.entry(*line).or_default() += count;
        }

        LineBreakdown {
            entries: grouped
                .into_iter()
                .map(|((line, grade), count)| LineGradeCount { line, grade, count })
                .collect(),
            totals: totals
                .into_iter()
                .map(|(line, total)| LineTotal { line, total })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn line_total(&self, line: LineNumber) -> usize {
        self.totals
            .iter()
            .find(|t| t.line == line)
            .map_or(0, |t| t.total)
    }

    /// Share of `entry` within its own line.
    pub fn percentage(&self, entry: &LineGradeCount) -> f64 {
        pct(entry.count, self.line_total(entry.line))
    }

    pub fn entries_for(&self, line: LineNumber) -> impl Iterator<Item = &LineGradeCount> + '_ {
        self.entries.iter().filter(move |e| e.line == line)
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Everything the dashboard shows for one filtered set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub grade_counts: GradeCounts,
    pub line_breakdown: LineBreakdown,
    /// Distinct operators in the filtered set.
    pub total_operators: usize,
    /// Process rows in the filtered set, before de-duplication.
    pub process_rows: usize,
}

/// Aggregate a filtered set. Empty input gives zero counts and an empty breakdown.
pub fn aggregate<'a, I>(records: I) -> Aggregate
where
    I: IntoIterator<Item = &'a Record>,
{
    let rows: Vec<&Record> = records.into_iter().collect();
    let operators = dedup_operators(rows.iter().copied());
    Aggregate {
        grade_counts: GradeCounts::from_operators(&operators),
        line_breakdown: LineBreakdown::from_operators(&operators),
        total_operators: operators.len(),
        process_rows: rows.len(),
    }
}
