//! CSV export of simulation time series
//!
//! Writes the per-step amounts and the plasma-concentration profile to a
//! plain CSV file readable by Excel, pandas or R. One row per time point,
//! one column per reported quantity.
//!
//! # Quick example
//!
//! ```rust,ignore
//! use pulmo_rs::output::export::export_time_series_csv;
//!
//! let result = LungPbpkSolver::solve(&scenario, config)?;
//! export_time_series_csv(&result, "run.csv", None)?;
//! ```
//!
//! **Output** (`run.csv`):
//! ```csv
//! Time (min),Plasma (ug/mL),Central (ug),Peripheral (ug),Gut (ug),...
//! 0.000000,0.000000,0.000000,0.000000,0.000000,...
//! 1.000000,0.001219,0.012190,0.000502,0.000000,...
//! ```
//!
//! With `include_metadata` enabled the file starts with `#`-prefixed header
//! comments (generation timestamp, solver, step count).

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::solver::SimulationResult;

// =================================================================================================
// Errors
// =================================================================================================

/// Failure modes of the CSV export.
#[derive(Debug)]
pub enum CsvError {
    /// The result carries no time points
    EmptyResult,
    /// A value in the named column is NaN or infinite
    NonFiniteValue { column: &'static str, row: usize },
    /// Underlying I/O failure
    Io(std::io::Error),
}

impl fmt::Display for CsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvError::EmptyResult => write!(f, "simulation result contains no time points"),
            CsvError::NonFiniteValue { column, row } => {
                write!(f, "non-finite value in column '{}' at row {}", column, row)
            }
            CsvError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for CsvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CsvError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CsvError {
    fn from(e: std::io::Error) -> Self {
        CsvError::Io(e)
    }
}

// =================================================================================================
// Configuration
// =================================================================================================

/// Configuration for CSV export.
#[derive(Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,
    /// Number of decimal places (default: 6)
    pub precision: usize,
    /// Emit `#`-prefixed metadata header comments (default: false)
    pub include_metadata: bool,
    /// Metadata to include in the header
    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 6,
            include_metadata: false,
            metadata: None,
        }
    }
}

impl CsvConfig {
    /// Builder: set the delimiter.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder: set the precision.
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder: enable the metadata header.
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Metadata for the CSV header comments. Only `Some` fields are written.
#[derive(Clone, Default)]
pub struct CsvMetadata {
    /// Free-form run label
    pub run_name: Option<String>,
    /// Solver name
    pub solver_name: Option<String>,
    /// Total simulated time \[min\]
    pub total_time: Option<f64>,
    /// Number of time steps
    pub time_steps: Option<usize>,
    /// Additional key/value pairs
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Pull solver name, step count and total time from a result's metadata.
    pub fn from_result(result: &SimulationResult) -> Self {
        Self {
            run_name: None,
            solver_name: result.metadata.get("solver").cloned(),
            total_time: result
                .metadata
                .get("total time")
                .and_then(|v| v.parse().ok()),
            time_steps: result
                .metadata
                .get("time steps")
                .and_then(|v| v.parse().ok()),
            custom: Vec::new(),
        }
    }

    /// Add a custom key/value pair.
    pub fn add_custom(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.push((key.into(), value.into()));
    }
}

// =================================================================================================
// Export
// =================================================================================================

const COLUMNS: [&str; 14] = [
    "Time (min)",
    "Plasma (ug/mL)",
    "Central (ug)",
    "Peripheral (ug)",
    "Gut (ug)",
    "Cleared (ug)",
    "Airway fluid (ug)",
    "Airway tissue (ug)",
    "Airway undissolved (ug)",
    "Alveolar fluid (ug)",
    "Alveolar tissue (ug)",
    "Alveolar undissolved (ug)",
    "Mucociliary cleared (ug)",
    "Total (ug)",
];

/// Export the full time series of a run to a CSV file.
pub fn export_time_series_csv(
    result: &SimulationResult,
    path: impl AsRef<Path>,
    config: Option<&CsvConfig>,
) -> Result<(), CsvError> {
    let default_config = CsvConfig::default();
    let config = config.unwrap_or(&default_config);

    if result.is_empty() {
        return Err(CsvError::EmptyResult);
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    if config.include_metadata {
        write_metadata_header(&mut writer, config.metadata.as_ref())?;
    }

    let header: Vec<&str> = COLUMNS.to_vec();
    writeln!(writer, "{}", header.join(&config.delimiter.to_string()))?;

    for (row, record) in result.records.iter().enumerate() {
        let values = [
            record.time,
            record.plasma_concentration,
            record.central,
            record.peripheral,
            record.gut,
            record.cleared,
            record.airway_fluid,
            record.airway_tissue,
            record.airway_undissolved,
            record.alveolar_fluid,
            record.alveolar_tissue,
            record.alveolar_undissolved,
            record.mucociliary_cleared,
            record.total(),
        ];

        for (value, column) in values.iter().zip(COLUMNS.iter()) {
            if !value.is_finite() {
                return Err(CsvError::NonFiniteValue { column, row });
            }
        }

        let line: Vec<String> = values
            .iter()
            .map(|v| format!("{:.*}", config.precision, v))
            .collect();
        writeln!(writer, "{}", line.join(&config.delimiter.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the `#`-prefixed metadata block.
fn write_metadata_header(
    writer: &mut impl Write,
    metadata: Option<&CsvMetadata>,
) -> Result<(), CsvError> {
    writeln!(writer, "# Lung PBPK Simulation Data")?;
    writeln!(writer, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some(metadata) = metadata {
        if let Some(name) = &metadata.run_name {
            writeln!(writer, "# Run: {}", name)?;
        }
        if let Some(solver) = &metadata.solver_name {
            writeln!(writer, "# Solver: {}", solver)?;
        }
        if let Some(total_time) = metadata.total_time {
            writeln!(writer, "# Total Time: {} min", total_time)?;
        }
        if let Some(time_steps) = metadata.time_steps {
            writeln!(writer, "# Time Steps: {}", time_steps)?;
        }
        for (key, value) in &metadata.custom {
            writeln!(writer, "# {}: {}", key, value)?;
        }
    }
    writeln!(writer, "#")?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
