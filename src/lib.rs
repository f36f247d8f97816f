//! Operator skill-matrix engine: normalize a roster export with merged cells,
//! fill identities down, filter, and aggregate final grades.

pub mod data;
pub mod report;
pub mod state;
