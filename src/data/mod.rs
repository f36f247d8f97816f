//! Data layer: raw sheet, normalization, fill-down, filtering, aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  read file → RawTable (title row, header row, data rows)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ normalize  │  header at row 1, schema columns, drop rows without process
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ resolve   │  fill merged identity cells down
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  AND of name / ID / line / SPV predicates
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  distinct operators → grade counts, line breakdown
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod raw;
pub mod resolve;
