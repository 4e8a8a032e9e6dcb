//! Plasma-concentration profile plot
//!
//! Renders the central-compartment concentration over time as an SVG line
//! plot — the primary visual check of a simulated inhalation PK profile.
//!
//! ```rust,ignore
//! use pulmo_rs::output::visualization::plot_plasma_profile;
//!
//! let result = LungPbpkSolver::solve(&scenario, config)?;
//! plot_plasma_profile(&result, "plasma.svg", None)?;
//! ```

use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use super::config::{PlotConfig, NO_TITLE};
use crate::solver::SimulationResult;

/// Plot the plasma-concentration time series to an SVG file.
///
/// # Errors
///
/// Fails when the result is empty or the backend cannot write the file.
pub fn plot_plasma_profile(
    result: &SimulationResult,
    path: impl AsRef<Path>,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    let default_config = PlotConfig::default();
    let config = config.unwrap_or(&default_config);

    if result.is_empty() {
        return Err("simulation result contains no time points".into());
    }

    let times = &result.time_points;
    let profile = result.plasma_profile();

    let t_max = *times.last().expect("non-empty checked above");
    let c_max = profile.iter().cloned().fold(0.0_f64, f64::max);
    // keep a visible axis even for an all-zero profile
    let y_max = if c_max > 0.0 { c_max * 1.05 } else { 1.0 };

    let root = SVGBackend::new(path.as_ref(), (config.width, config.height))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(65);
    if config.title != NO_TITLE {
        builder.caption(&config.title, ("sans-serif", 24));
    }
    let mut chart = builder.build_cartesian_2d(0.0..t_max.max(1e-9), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .draw()?;

    chart.draw_series(LineSeries::new(
        times.iter().cloned().zip(profile.into_iter()),
        &BLUE,
    ))?;

    root.present()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ComputationalGrid;
    use crate::solver::{PbpkRecord, PbpkState};
    use std::collections::HashMap;

    fn tiny_result() -> SimulationResult {
        let grid = ComputationalGrid::new(vec![0.0, 1.0], vec![1e-12, 2e-12]).unwrap();
        let mut state = PbpkState::zeros(&grid);
        let mut records = vec![PbpkRecord::from_state(0.0, &state, &grid, 10.0)];
        state.central = 5.0;
        records.push(PbpkRecord::from_state(1.0, &state, &grid, 10.0));

        SimulationResult {
            time_points: vec![0.0, 1.0],
            records,
            diagnostics: Vec::new(),
            final_state: state,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_plot_writes_svg() {
        let result = tiny_result();
        let path = std::env::temp_dir().join("pulmo_rs_plasma.svg");

        plot_plasma_profile(&result, &path, None).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_empty_result_rejected() {
        let mut result = tiny_result();
        result.time_points.clear();
        result.records.clear();

        let path = std::env::temp_dir().join("pulmo_rs_plasma_empty.svg");
        assert!(plot_plasma_profile(&result, &path, None).is_err());
    }
}
