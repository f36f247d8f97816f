use std::io::Write;
use std::sync::Arc;
use std::thread;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use skill_matrix::data::aggregate::aggregate;
use skill_matrix::data::filter::{distinct_lines, filter, FilterCriteria, Selection};
use skill_matrix::data::loader::{load_file, load_or_empty, parse_json};
use skill_matrix::data::model::{Column, Grade, LineNumber};
use skill_matrix::data::normalize::normalize;
use skill_matrix::data::resolve::resolve_identities;
use skill_matrix::report::{Report, ReportStatus};
use skill_matrix::state::{DashboardState, SnapshotCache, View};

const ROSTER_CSV: &str = "\
SKILL MATRIX OPERATOR,,,,,,,,,,,
SPV,Line,Name Opt,ID NO,Style,Process Part,Name Process (Bahasa),Grade Process,Grade Countif,Grade Quality,Final Grade,Remarks
Budi,1,Ana,OP-001,Polo,Front,Jahit bahu,A,A,B,A,
,,,,Polo,Back,Pasang kerah,A,B,A,,
,,,,Polo,Back,,,,,,spacer
,,Dewi,OP-002,Polo,Sleeve,Obras samping,B,B,B,B,
Sari,2,Rina,OP-003,Jacket,Collar,Tindas,C,C,C,C,
,N/A,Agus,OP-004,Jacket,Front,Jahit bahu,D,D,D,D,
,,,,Jacket,Front,Pasang lengan,D,C,D,,
";

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_csv_roster_end_to_end() {
    let file = write_temp(".csv", ROSTER_CSV);
    let raw = load_file(file.path()).expect("load CSV");
    assert_eq!(raw.len(), 9);

    let normalized = normalize(&raw).expect("normalize");
    assert_eq!(normalized.len(), 6, "spacer row without process is dropped");
    assert!(!normalized.has_column(Column::Building));

    let resolved = resolve_identities(&normalized);
    let ids: Vec<&str> = resolved
        .iter()
        .map(|r| r.operator_id.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(ids, vec!["OP-001", "OP-001", "OP-002", "OP-003", "OP-004", "OP-004"]);
    assert_eq!(resolved.records[2].spv.as_deref(), Some("Budi"));
    assert_eq!(resolved.records[2].line.as_deref(), Some("1"));

    let lines: Vec<String> = distinct_lines(&resolved).iter().map(|l| l.to_string()).collect();
    assert_eq!(lines, vec!["1", "2"]);

    let everything = aggregate(&resolved.records);
    assert_eq!(everything.total_operators, 4);
    assert_eq!(everything.process_rows, 6);
    assert_eq!(everything.grade_counts.get(Grade::A), 1);
    assert_eq!(everything.grade_counts.get(Grade::D), 1);
    // OP-004 sits on an unknown line: counted above, absent from the breakdown.
    let breakdown_total: usize = everything.line_breakdown.totals.iter().map(|t| t.total).sum();
    assert_eq!(breakdown_total, 3);

    let budi = FilterCriteria {
        spv: Selection::Only("Budi".into()),
        ..Default::default()
    };
    let filtered = filter(&resolved, &budi);
    assert_eq!(filtered.len(), 3);
    assert_eq!(aggregate(&filtered.records).total_operators, 2);
}

#[test]
fn test_json_roster_with_building() {
    let json = r#"[
        ["Skill Matrix"],
        ["Building", "SPV", "Line", "Name Opt", "ID NO", "Name Process (Bahasa)", "Final Grade"],
        ["B1", "Budi", 5.0, "Ana", 1001, "Sewing", "A"],
        [null, null, null, null, null, "Cutting", null],
        ["B2", "Sari", 7, "Dewi", 1002, "Sewing", "B"]
    ]"#;
    let file = write_temp(".json", json);
    let raw = load_file(file.path()).expect("load JSON");
    let resolved = resolve_identities(&normalize(&raw).expect("normalize"));

    assert!(resolved.has_column(Column::Building));
    assert_eq!(resolved.records[1].building.as_deref(), Some("B1"));
    assert_eq!(resolved.records[1].operator_id.as_deref(), Some("1001"));
    assert_eq!(resolved.records[0].line_number(), LineNumber::new(5.0));

    let by_id = FilterCriteria {
        id_substring: "1002".into(),
        ..Default::default()
    };
    assert_eq!(filter(&resolved, &by_id).len(), 1);
}

#[test]
fn test_large_numeric_ids_are_distinct_operators() {
    let raw = parse_json(
        r#"[
            ["t"],
            ["ID NO", "Name Process (Bahasa)", "Final Grade"],
            [9007199254740993, "Sewing", "A"],
            [9007199254740992, "Sewing", "B"]
        ]"#,
    )
    .expect("parse JSON");
    let resolved = resolve_identities(&normalize(&raw).expect("normalize"));

    let ids: Vec<Option<&str>> = resolved.iter().map(|r| r.operator_id.as_deref()).collect();
    assert_eq!(ids, vec![Some("9007199254740993"), Some("9007199254740992")]);

    let summary = aggregate(&resolved.records);
    assert_eq!(summary.total_operators, 2);
    assert_eq!(summary.grade_counts.get(Grade::A), 1);
    assert_eq!(summary.grade_counts.get(Grade::B), 1);
}

#[test]
fn test_dashboard_states_from_files() {
    let cache = SnapshotCache::default();
    let mut state = DashboardState::default();

    let missing = load_or_empty(std::path::Path::new("/no/such/roster.csv"));
    state.load(&cache, &missing).expect("empty table is not malformed");
    let report = Report::new(&state.view(), &state.criteria);
    assert_eq!(report.status, ReportStatus::NoData);

    let file = write_temp(".csv", ROSTER_CSV);
    let raw = load_or_empty(file.path());
    state.load(&cache, &raw).expect("load roster");

    state.set_name_query("nobody");
    assert_eq!(state.view(), View::NoMatch);

    state.set_name_query("AN");
    state.select_line(Selection::Only(LineNumber::new(1.0).expect("finite")));
    let report = Report::new(&state.view(), &state.criteria);
    assert_eq!(report.status, ReportStatus::Matched);
    assert_eq!(report.total_operators, 1);
    assert_eq!(report.process_rows, 2);
    assert_eq!(report.grades[0].label, "Grade A: 1 operators (100.0%)");
}

#[test]
fn test_snapshot_shared_across_threads() {
    let cache = Arc::new(SnapshotCache::default());
    let file = write_temp(".csv", ROSTER_CSV);
    let raw = Arc::new(load_file(file.path()).expect("load CSV"));
    let baseline = cache.get_or_build(&raw).expect("build");

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let raw = Arc::clone(&raw);
            thread::spawn(move || {
                let snapshot = cache.get_or_build(&raw).expect("cached");
                let criteria = FilterCriteria {
                    line: if i % 2 == 0 {
                        Selection::Any
                    } else {
                        Selection::Only(LineNumber::new(2.0).expect("finite"))
                    },
                    ..Default::default()
                };
                (Arc::clone(&snapshot), filter(&snapshot.resolved, &criteria).len())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (snapshot, matched) = handle.join().expect("thread");
        assert!(Arc::ptr_eq(&snapshot, &baseline));
        assert_eq!(matched, if i % 2 == 0 { 6 } else { 1 });
    }
}

#[test]
fn test_parquet_roster_field_names_are_title_row() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("SKILL MATRIX", DataType::Utf8, true),
        Field::new("Unnamed: 1", DataType::Utf8, true),
        Field::new("Unnamed: 2", DataType::Utf8, true),
        Field::new("Unnamed: 3", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![Some("SPV"), Some("Budi"), None])),
        Arc::new(StringArray::from(vec![Some("ID NO"), Some("OP-001"), None])),
        Arc::new(StringArray::from(vec![
            Some("Name Process (Bahasa)"),
            Some("Sewing"),
            Some("Cutting"),
        ])),
        Arc::new(Float64Array::from(vec![None, Some(3.0), None])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).expect("batch");

    let file = tempfile::Builder::new()
        .suffix(".parquet")
        .tempfile()
        .expect("temp file");
    let mut writer =
        ArrowWriter::try_new(file.reopen().expect("reopen"), schema, None).expect("writer");
    writer.write(&batch).expect("write batch");
    writer.close().expect("close");

    let raw = load_file(file.path()).expect("load parquet");
    assert_eq!(raw.len(), 4);

    let resolved = resolve_identities(&normalize(&raw).expect("normalize"));
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved.records[1].spv.as_deref(), Some("Budi"));
    assert_eq!(resolved.records[1].operator_id.as_deref(), Some("OP-001"));
}
