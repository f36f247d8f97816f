use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use skill_matrix::data::filter::Selection;
use skill_matrix::data::loader::load_or_empty;
use skill_matrix::data::model::LineNumber;
use skill_matrix::data::normalize::{TableLayout, DATA_START_OFFSET, HEADER_ROW_INDEX};
use skill_matrix::report::{write_detail_csv, Report};
use skill_matrix::state::{DashboardState, SnapshotCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "skill-matrix")]
#[command(about = "Grade distribution report for an operator roster", long_about = None)]
struct Cli {
    /// Roster export (.csv, .json or .parquet)
    #[arg(value_name = "FILE")]
    source: PathBuf,

    /// Case-insensitive part of the operator name
    #[arg(long, default_value = "")]
    name: String,

    /// Case-insensitive part of the operator ID
    #[arg(long, default_value = "")]
    id: String,

    /// Exact line number
    #[arg(long, value_parser = parse_line)]
    line: Option<LineNumber>,

    /// Exact supervisor name
    #[arg(long)]
    spv: Option<String>,

    /// Row holding the column names
    #[arg(long, default_value_t = HEADER_ROW_INDEX)]
    header_row: usize,

    /// First data row
    #[arg(long, default_value_t = DATA_START_OFFSET)]
    data_start: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Also write the matched process rows to this CSV file
    #[arg(long, value_name = "PATH")]
    detail_csv: Option<PathBuf>,
}

fn parse_line(s: &str) -> Result<LineNumber, String> {
    LineNumber::parse(s).ok_or_else(|| format!("'{s}' is not a line number"))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let layout = TableLayout {
        header_row: cli.header_row,
        data_start: cli.data_start,
    };
    layout.validate()?;

    let raw = load_or_empty(&cli.source);
    let cache = SnapshotCache::new(layout);

    let mut state = DashboardState::default();
    if let Err(e) = state.load(&cache, &raw) {
        log::error!("Failed to normalize {}: {e}", cli.source.display());
        return Err(e).with_context(|| format!("normalizing {}", cli.source.display()));
    }

    if let Some(message) = &state.status_message {
        log::warn!("{}: {message}", cli.source.display());
    }
    if let Some(snapshot) = &state.snapshot {
        log::info!(
            "Loaded {} process rows with columns {:?}",
            snapshot.resolved.len(),
            snapshot.resolved.columns
        );
    }

    state.set_name_query(&cli.name);
    state.set_id_query(&cli.id);
    state.select_line(cli.line.map_or(Selection::Any, Selection::Only));
    state.select_spv(cli.spv.map_or(Selection::Any, Selection::Only));

    let view = state.view();
    let report = Report::new(&view, &state.criteria);

    match cli.format {
        Format::Text => print!("{}", report.to_text()),
        Format::Json => println!("{}", report.to_json()?),
    }

    if let Some(path) = &cli.detail_csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_detail_csv(BufWriter::new(file), state.visible_records())?;
        log::info!(
            "Wrote {} process rows to {}",
            state.visible_indices.len(),
            path.display()
        );
    }

    Ok(())
}
