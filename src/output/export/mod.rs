//! Result export
//!
//! Currently CSV only; see [`csv`] for the format details.

pub mod csv;

pub use csv::{export_time_series_csv, CsvConfig, CsvError, CsvMetadata};
