//! Result output: export and visualization
//!
//! - [`export`] — CSV export of the simulation time series.
//! - [`visualization`] — SVG plots (requires the `visualization` feature).

pub mod export;

#[cfg(feature = "visualization")]
pub mod visualization;
