//! Serializable summaries of a dashboard view, plus detail-table export.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::aggregate::Aggregate;
use crate::data::filter::{FilterCriteria, Selection};
use crate::data::model::{Grade, LineNumber, Record};
use crate::state::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    NoData,
    NoMatch,
    Matched,
}

/// The criteria that produced a report, in display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaSummary {
    pub name: Option<String>,
    pub id: Option<String>,
    pub line: Option<LineNumber>,
    pub spv: Option<String>,
}

impl From<&FilterCriteria> for CriteriaSummary {
    fn from(c: &FilterCriteria) -> Self {
        let text = |s: &str| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };
        CriteriaSummary {
            name: text(&c.name_substring),
            id: text(&c.id_substring),
            line: match c.line {
                Selection::Any => None,
                Selection::Only(line) => Some(line),
            },
            spv: match &c.spv {
                Selection::Any => None,
                Selection::Only(spv) => Some(spv.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeSummary {
    pub grade: Grade,
    pub count: usize,
    pub percent: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineGradeSummary {
    pub grade: Grade,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSummary {
    pub line: LineNumber,
    pub total: usize,
    pub grades: Vec<LineGradeSummary>,
}

/// Everything needed to render the performance section for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub status: ReportStatus,
    pub criteria: CriteriaSummary,
    pub total_operators: usize,
    pub operators_without_grade: usize,
    pub process_rows: usize,
    pub grades: Vec<GradeSummary>,
    pub lines: Vec<LineSummary>,
}

impl Report {
    pub fn new(view: &View<'_>, criteria: &FilterCriteria) -> Self {
        let criteria = CriteriaSummary::from(criteria);
        match view {
            View::NoData => Report::empty(ReportStatus::NoData, criteria),
            View::NoMatch => Report::empty(ReportStatus::NoMatch, criteria),
            View::Matched { aggregate, .. } => Report::from_aggregate(aggregate, criteria),
        }
    }

    fn empty(status: ReportStatus, criteria: CriteriaSummary) -> Self {
        Report {
            status,
            criteria,
            total_operators: 0,
            operators_without_grade: 0,
            process_rows: 0,
            grades: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn from_aggregate(aggregate: &Aggregate, criteria: CriteriaSummary) -> Self {
        let counts = &aggregate.grade_counts;
        let grades = counts
            .iter()
            .zip(counts.labels())
            .map(|((grade, count), label)| GradeSummary {
                grade,
                count,
                percent: counts.percentage(grade),
                label,
            })
            .collect();

        let breakdown = &aggregate.line_breakdown;
        let lines = breakdown
            .totals
            .iter()
            .map(|t| LineSummary {
                line: t.line,
                total: t.total,
                grades: breakdown
                    .entries_for(t.line)
                    .map(|e| LineGradeSummary {
                        grade: e.grade,
                        count: e.count,
                        percent: breakdown.percentage(e),
                    })
                    .collect(),
            })
            .collect();

        Report {
            status: ReportStatus::Matched,
            criteria,
            total_operators: aggregate.total_operators,
            operators_without_grade: counts.unknown(),
            process_rows: aggregate.process_rows,
            grades,
            lines,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing report")
    }

    /// Plain-text summary for terminals.
    pub fn to_text(&self) -> String {
        match self.status {
            ReportStatus::NoData => return "No data available from the source.\n".to_string(),
            ReportStatus::NoMatch => return "No data found for the selected filters.\n".to_string(),
            ReportStatus::Matched => {}
        }

        let mut lines = vec![
            format!("Filtered operators: {}", self.total_operators),
            format!("Process rows:       {}", self.process_rows),
        ];
        if self.operators_without_grade > 0 {
            lines.push(format!("Without grade:      {}", self.operators_without_grade));
        }
        lines.push(String::new());
        lines.push("Grade distribution".to_string());
        lines.extend(self.grades.iter().map(|g| format!("  {}", g.label)));

        if !self.lines.is_empty() {
            lines.push(String::new());
            lines.push("Per line".to_string());
            for line in &self.lines {
                let parts: Vec<String> = line
                    .grades
                    .iter()
                    .map(|g| format!("{}={} ({:.1}%)", g.grade, g.count, g.percent))
                    .collect();
                lines.push(format!(
                    "  Line {:<6} total {:<4} {}",
                    line.line.to_string(),
                    line.total,
                    parts.join("  ")
                ));
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }
}

/// Write the matched process rows as CSV; blank cells become empty strings.
pub fn write_detail_csv<'a, W, I>(writer: W, records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
{
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record).context("writing detail row")?;
    }
    csv.flush().context("flushing detail CSV")?;
    Ok(())
}
