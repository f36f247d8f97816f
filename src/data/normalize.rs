use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use thiserror::Error;

use super::model::{Column, Record, RecordSet};
use super::raw::RawTable;

// ---------------------------------------------------------------------------
// Table layout – where the header and the data live in the raw sheet
// ---------------------------------------------------------------------------

/// Row 0 of the export is a decorative title row; the real header sits below it.
pub const HEADER_ROW_INDEX: usize = 1;

/// First data row: directly after the header.
pub const DATA_START_OFFSET: usize = 2;

/// Structural contract with the source sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub header_row: usize,
    pub data_start: usize,
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            header_row: HEADER_ROW_INDEX,
            data_start: DATA_START_OFFSET,
        }
    }
}

impl TableLayout {
    /// Reject layouts whose data would overlap the header.
    pub fn validate(&self) -> Result<(), MalformedTableError> {
        if self.data_start <= self.header_row {
            return Err(MalformedTableError::InvalidLayout {
                header_row: self.header_row,
                data_start: self.data_start,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTableError {
    #[error("header row {header_row} is out of range for a table with {row_count} rows")]
    HeaderOutOfRange { header_row: usize, row_count: usize },
    #[error("data start row {data_start} must come after header row {header_row}")]
    InvalidLayout { header_row: usize, data_start: usize },
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalize a raw export using the default [`TableLayout`].
pub fn normalize(raw: &RawTable) -> Result<RecordSet, MalformedTableError> {
    normalize_with(raw, TableLayout::default())
}

/// Turn the raw sheet into typed records.
///
/// * Header names are read from `layout.header_row`; data starts at `layout.data_start`.
/// * Only the schema columns in [`Column::ALL`] are kept; missing ones stay `None`.
/// * Rows with an empty `ProcessName` are dropped.
/// * Row order is preserved.
///
/// A header without a `ProcessName` column yields an empty set, since no row
/// could satisfy the required field.
pub fn normalize_with(
    raw: &RawTable,
    layout: TableLayout,
) -> Result<RecordSet, MalformedTableError> {
    layout.validate()?;
    if layout.header_row >= raw.len() {
        return Err(MalformedTableError::HeaderOutOfRange {
            header_row: layout.header_row,
            row_count: raw.len(),
        });
    }

    let positions = header_positions(raw, layout.header_row);
    let columns: BTreeSet<Column> = positions.keys().copied().collect();
    for missing in Column::ALL.iter().filter(|c| !columns.contains(c)) {
        debug!("Column '{}' not present in header", missing.label());
    }

    let Some(&process_idx) = positions.get(&Column::ProcessName) else {
        warn!(
            "Header row {} has no '{}' column; no usable records",
            layout.header_row,
            Column::ProcessName.label()
        );
        return Ok(RecordSet::new(Vec::new(), columns));
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in layout.data_start..raw.len() {
        let Some(process_name) = raw.cell(row, process_idx).to_text() else {
            dropped += 1;
            continue;
        };

        let text = |column: Column| -> Option<String> {
            positions
                .get(&column)
                .and_then(|&idx| raw.cell(row, idx).to_text())
        };

        records.push(Record {
            building: text(Column::Building),
            spv: text(Column::Spv),
            line: text(Column::Line),
            operator_name: text(Column::OperatorName),
            operator_id: text(Column::OperatorId),
            style: text(Column::Style),
            process_part: text(Column::ProcessPart),
            process_name,
            grade_process: text(Column::GradeProcess),
            grade_countif: text(Column::GradeCountif),
            grade_quality: text(Column::GradeQuality),
            final_grade: text(Column::FinalGrade),
        });
    }

    debug!(
        "Normalized {} records ({} rows dropped without a process name)",
        records.len(),
        dropped
    );

    Ok(RecordSet::new(records, columns))
}

/// Map each recognised schema column to its index in the header row.
/// The first header matching a column wins.
fn header_positions(raw: &RawTable, header_row: usize) -> BTreeMap<Column, usize> {
    let mut positions = BTreeMap::new();
    if let Some(header) = raw.rows.get(header_row) {
        for (idx, cell) in header.iter().enumerate() {
            let Some(name) = cell.to_text() else {
                continue;
            };
            if let Some(column) = Column::from_header(&name) {
                positions.entry(column).or_insert(idx);
            }
        }
    }
    positions
}
