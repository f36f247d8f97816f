use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::raw::{RawCell, RawTable};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a roster export from a file.  Dispatch by extension.
///
/// Every physical row of the source becomes a row of the [`RawTable`]; no
/// header interpretation happens here.
///
/// Supported formats:
/// * `.csv`     – plain sheet export, rows may have different widths
/// * `.json`    – `[["title"], ["SPV", "Line", ...], ["Budi", 5, ...], ...]`
/// * `.parquet` – field names form row 0, then every batch row
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    info!("Loaded {} raw rows from {}", table.len(), path.display());
    Ok(table)
}

/// Load a file, treating any failure as "no data".
///
/// The failure is logged and an empty table returned; callers see an empty
/// table as "source unavailable".
pub fn load_or_empty(path: &Path) -> RawTable {
    match load_file(path) {
        Ok(table) => table,
        Err(err) => {
            warn!("Could not load {}: {err:#}", path.display());
            RawTable::default()
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Read CSV rows verbatim. The first line is data like any other: the
/// decorative title row and the header row are both kept.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(RawCell::from_text).collect());
    }

    Ok(RawTable::new(rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout (rows of cells):
///
/// ```json
/// [
///   ["SKILL MATRIX OPERATOR"],
///   ["SPV", "Line", "Name Opt", "ID NO", "Name Process (Bahasa)", "Final Grade"],
///   ["Budi", 5, "Ana", "OP-001", "Sewing", "A"],
///   [null, null, null, null, "Cutting", null]
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut table = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let cells = row
            .as_array()
            .with_context(|| format!("Row {i} is not a JSON array"))?;
        table.push(cells.iter().map(json_to_cell).collect());
    }

    Ok(RawTable::new(table))
}

fn json_to_cell(val: &JsonValue) -> RawCell {
    match val {
        JsonValue::Null => RawCell::Empty,
        JsonValue::String(s) => RawCell::from_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawCell::Integer(i)
            } else if n.is_u64() {
                // Above i64::MAX: keep the digits exactly as written.
                RawCell::from_text(&n.to_string())
            } else {
                n.as_f64()
                    .map_or_else(|| RawCell::from_text(&n.to_string()), RawCell::from_number)
            }
        }
        JsonValue::Bool(b) => RawCell::Text(b.to_string()),
        other => RawCell::from_text(&other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// A Parquet export keeps the sheet's first line as its field names, so those
/// names come back as row 0 and the header row is the first record.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<RawCell>> = vec![schema
        .fields()
        .iter()
        .map(|f| RawCell::from_text(f.name()))
        .collect()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(batch.columns().iter().map(|col| cell_at(col, row)).collect());
        }
    }

    Ok(RawTable::new(rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn cell_at(col: &ArrayRef, row: usize) -> RawCell {
    if col.is_null(row) {
        return RawCell::Empty;
    }
    match col.data_type() {
        DataType::Utf8 => RawCell::from_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => RawCell::from_text(col.as_string::<i64>().value(row)),
        DataType::Int32 => RawCell::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => RawCell::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            RawCell::from_number(col.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => RawCell::from_number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => RawCell::Text(col.as_boolean().value(row).to_string()),
        _ => array_value_to_string(col, row)
            .map(|s| RawCell::from_text(&s))
            .unwrap_or(RawCell::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_keeps_every_row() {
        let data = "SKILL MATRIX,,\nSPV,Line,Name Process (Bahasa)\nBudi,5,Sewing\n,,Cutting\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.cell(0, 0), &RawCell::Text("SKILL MATRIX".into()));
        assert_eq!(table.cell(2, 1), &RawCell::Text("5".into()));
        assert!(table.cell(3, 0).is_empty());
    }

    #[test]
    fn test_read_csv_ragged_rows() {
        let data = "title\nSPV,Line\nBudi\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.rows[1].len(), 2);
        assert!(table.cell(2, 1).is_empty());
    }

    #[test]
    fn test_parse_json_rows() {
        let table =
            parse_json(r#"[["t"], ["Line", "ID NO"], [5, "OP-1"], [null, 1001.0]]"#).unwrap();
        assert_eq!(table.cell(2, 0), &RawCell::Integer(5));
        assert!(table.cell(3, 0).is_empty());
        assert_eq!(table.cell(3, 1).to_text().as_deref(), Some("1001"));
    }

    #[test]
    fn test_large_integer_ids_stay_distinct() {
        let table = parse_json(
            r#"[["t"], ["ID NO"], [9007199254740993], [9007199254740992], [18446744073709551615]]"#,
        )
        .unwrap();
        assert_eq!(table.cell(2, 0).to_text().as_deref(), Some("9007199254740993"));
        assert_eq!(table.cell(3, 0).to_text().as_deref(), Some("9007199254740992"));
        assert_eq!(table.cell(4, 0).to_text().as_deref(), Some("18446744073709551615"));
    }

    #[test]
    fn test_int64_parquet_cell_is_exact() {
        use arrow::array::Int64Array;
        use std::sync::Arc;

        let col: ArrayRef = Arc::new(Int64Array::from(vec![Some(9_007_199_254_740_993), None]));
        assert_eq!(cell_at(&col, 0), RawCell::Integer(9_007_199_254_740_993));
        assert!(cell_at(&col, 1).is_empty());
    }

    #[test]
    fn test_parse_json_rejects_objects() {
        assert!(parse_json(r#"{"rows": []}"#).is_err());
        assert!(parse_json(r#"[{"SPV": "Budi"}]"#).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_file(Path::new("roster.xlsx")).is_err());
    }

    #[test]
    fn test_load_or_empty_on_missing_file() {
        let table = load_or_empty(Path::new("/definitely/not/here/roster.csv"));
        assert!(table.is_empty());
    }
}
