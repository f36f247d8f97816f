use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use skill_matrix::data::model::Column;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const SHEET_COLUMNS: [Column; 12] = Column::ALL;

/// One sheet row; `None` is a blank (or merged) cell.
type Row = Vec<Option<String>>;

fn roster(rng: &mut SimpleRng) -> Vec<Row> {
    let supervisors = [("B1", "Budi"), ("B1", "Sari"), ("B2", "Hendra")];
    let first_names = ["Ana", "Dewi", "Rina", "Agus", "Wati", "Yanto", "Sri", "Eko"];
    let styles = ["Polo", "Jacket", "T-Shirt"];
    let parts = ["Front", "Back", "Sleeve", "Collar"];
    let processes = ["Jahit bahu", "Pasang kerah", "Obras samping", "Pasang lengan", "Tindas"];
    let grades = ["A", "A", "B", "B", "B", "C", "C", "D"];

    let mut rows: Vec<Row> = Vec::new();
    let mut operator_no = 1;

    for (sup_idx, (building, spv)) in supervisors.iter().enumerate() {
        for line in 1..=2 {
            let line_no = sup_idx * 2 + line;
            for _ in 0..4 {
                let name = format!("{} {}", rng.pick(&first_names), operator_no);
                let id = format!("OP-{operator_no:03}");
                let final_grade = rng.pick(&grades);
                let n_processes = 1 + rng.below(3);
                operator_no += 1;

                for p in 0..n_processes {
                    // Identity columns are merged vertically: only the first row carries them.
                    let first = p == 0;
                    let merged = |v: String| first.then_some(v);
                    let line_cell = if line_no == 6 && first {
                        "N/A".to_string()
                    } else {
                        line_no.to_string()
                    };

                    rows.push(vec![
                        merged(building.to_string()),
                        merged(spv.to_string()),
                        merged(line_cell),
                        merged(name.clone()),
                        merged(id.clone()),
                        Some(rng.pick(&styles).to_string()),
                        Some(rng.pick(&parts).to_string()),
                        Some(rng.pick(&processes).to_string()),
                        Some(rng.pick(&grades).to_string()),
                        Some(rng.pick(&grades).to_string()),
                        Some(rng.pick(&grades).to_string()),
                        merged(final_grade.to_string()),
                    ]);
                }
            }
            // Spacer row between lines, as left in the sheet by hand.
            rows.push(vec![None; SHEET_COLUMNS.len()]);
        }
    }

    rows
}

fn header_row() -> Row {
    SHEET_COLUMNS.iter().map(|c| Some(c.label().to_string())).collect()
}

fn write_csv(path: &str, data: &[Row]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("creating CSV")?;

    let mut title = vec![String::new(); SHEET_COLUMNS.len()];
    title[0] = "SKILL MATRIX OPERATOR".to_string();
    writer.write_record(&title)?;
    for row in std::iter::once(&header_row()).chain(data) {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Field names play the part of the sheet's title row, as in a dataframe
/// export; the header labels are the first record.
fn write_parquet(path: &str, data: &[Row]) -> Result<()> {
    let fields: Vec<Field> = (0..SHEET_COLUMNS.len())
        .map(|i| {
            let name = if i == 0 {
                "SKILL MATRIX OPERATOR".to_string()
            } else {
                format!("Unnamed: {i}")
            };
            Field::new(name, DataType::Utf8, true)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let header = header_row();
    let all_rows: Vec<&Row> = std::iter::once(&header).chain(data).collect();
    let columns: Vec<ArrayRef> = (0..SHEET_COLUMNS.len())
        .map(|col| {
            let values: Vec<Option<&str>> = all_rows.iter().map(|r| r[col].as_deref()).collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let data = roster(&mut rng);

    write_csv("sample_roster.csv", &data)?;
    write_parquet("sample_roster.parquet", &data)?;

    println!(
        "Wrote {} sheet rows to sample_roster.csv and sample_roster.parquet",
        data.len() + 2
    );
    Ok(())
}
