//! Simulation state and results
//!
//! [`PbpkState`] is the full model state at one instant: the undissolved
//! particle densities, the dissolved and tissue amounts per region, and the
//! four systemic compartments. It is owned exclusively by the solver for
//! the duration of a run and mutated once per time step, nowhere else.
//!
//! [`PbpkRecord`] is the reported slice of a state — regional totals and
//! systemic amounts on the shared time grid — and [`SimulationResult`]
//! collects the records, the per-step diagnostics and run metadata.

use std::collections::HashMap;

use nalgebra::DVector;
use ndarray::Array2;

use crate::grid::ComputationalGrid;
use crate::solver::StepDiagnostics;

// =================================================================================================
// PBPK State
// =================================================================================================

/// Full model state at one time point.
///
/// The cumulative mucociliary-cleared amount is a *reporting* quantity:
/// cleared mass has left the simulated system and is tracked separately
/// from the `cleared` systemic sink, which holds drug eliminated from the
/// central compartment (and the non-bioavailable share of gut absorption).
#[derive(Debug, Clone)]
pub struct PbpkState {
    /// Undissolved airway density ρ(x, s) \[µg/(cm·cm³)\],
    /// shape `[axial cells × size bins]`
    pub airway_density: Array2<f64>,
    /// Undissolved alveolar density ρ(s) \[µg/cm³\], per size bin
    pub alveolar_density: DVector<f64>,
    /// Dissolved amount in airway lining fluid, per axial cell \[µg\]
    pub airway_fluid: DVector<f64>,
    /// Amount in airway tissue, per axial cell \[µg\]
    pub airway_tissue: DVector<f64>,
    /// Dissolved amount in alveolar lining fluid \[µg\]
    pub alveolar_fluid: f64,
    /// Amount in alveolar tissue \[µg\]
    pub alveolar_tissue: f64,
    /// Gut depot \[µg\]
    pub gut: f64,
    /// Peripheral compartment \[µg\]
    pub peripheral: f64,
    /// Eliminated drug (mass-balance sink) \[µg\]
    pub cleared: f64,
    /// Central compartment \[µg\]
    pub central: f64,
    /// Cumulative mucociliary-cleared amount \[µg\] (left the system)
    pub mucociliary_cleared: f64,
}

impl PbpkState {
    /// All-zero state for a grid.
    pub fn zeros(grid: &ComputationalGrid) -> Self {
        Self {
            airway_density: Array2::zeros((grid.axial_cells(), grid.size_bins())),
            alveolar_density: DVector::zeros(grid.size_bins()),
            airway_fluid: DVector::zeros(grid.axial_cells()),
            airway_tissue: DVector::zeros(grid.axial_cells()),
            alveolar_fluid: 0.0,
            alveolar_tissue: 0.0,
            gut: 0.0,
            peripheral: 0.0,
            cleared: 0.0,
            central: 0.0,
            mucociliary_cleared: 0.0,
        }
    }

    /// Undissolved airway mass: integral of ρ over the grid \[µg\].
    pub fn airway_undissolved(&self, grid: &ComputationalGrid) -> f64 {
        let dx = grid.axial_widths();
        let ds = grid.size_widths();
        let mut total = 0.0;
        for i in 0..grid.axial_cells() {
            for b in 0..grid.size_bins() {
                total += self.airway_density[[i, b]] * dx[i] * ds[b];
            }
        }
        total
    }

    /// Undissolved alveolar mass \[µg\].
    pub fn alveolar_undissolved(&self, grid: &ComputationalGrid) -> f64 {
        let ds = grid.size_widths();
        (0..grid.size_bins())
            .map(|b| self.alveolar_density[b] * ds[b])
            .sum()
    }

    /// Sum of every in-system amount plus the cumulative cleared mass \[µg\].
    ///
    /// Constant over a run (equal to the scenario's total input) when the
    /// discretization conserves mass.
    pub fn total_mass(&self, grid: &ComputationalGrid) -> f64 {
        self.airway_undissolved(grid)
            + self.alveolar_undissolved(grid)
            + self.airway_fluid.sum()
            + self.airway_tissue.sum()
            + self.alveolar_fluid
            + self.alveolar_tissue
            + self.gut
            + self.peripheral
            + self.cleared
            + self.central
            + self.mucociliary_cleared
    }

    /// True when any stored value is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.airway_density.iter().any(|v| !v.is_finite())
            || self.alveolar_density.iter().any(|v| !v.is_finite())
            || self.airway_fluid.iter().any(|v| !v.is_finite())
            || self.airway_tissue.iter().any(|v| !v.is_finite())
            || !self.alveolar_fluid.is_finite()
            || !self.alveolar_tissue.is_finite()
            || !self.gut.is_finite()
            || !self.peripheral.is_finite()
            || !self.cleared.is_finite()
            || !self.central.is_finite()
            || !self.mucociliary_cleared.is_finite()
    }
}

// =================================================================================================
// Per-step Record
// =================================================================================================

/// Reported amounts at one time point \[µg\], plus the derived plasma
/// concentration \[µg/mL\].
#[derive(Debug, Clone, Copy)]
pub struct PbpkRecord {
    /// Time \[min\]
    pub time: f64,
    /// Undissolved mass in the conducting airways
    pub airway_undissolved: f64,
    /// Undissolved mass in the alveolar region
    pub alveolar_undissolved: f64,
    /// Dissolved mass in airway lining fluid (all cells)
    pub airway_fluid: f64,
    /// Mass in airway tissue (all cells)
    pub airway_tissue: f64,
    /// Dissolved mass in alveolar lining fluid
    pub alveolar_fluid: f64,
    /// Mass in alveolar tissue
    pub alveolar_tissue: f64,
    /// Gut depot
    pub gut: f64,
    /// Peripheral compartment
    pub peripheral: f64,
    /// Eliminated drug
    pub cleared: f64,
    /// Central compartment
    pub central: f64,
    /// Cumulative mucociliary-cleared mass
    pub mucociliary_cleared: f64,
    /// Plasma concentration = central amount / V
    pub plasma_concentration: f64,
}

impl PbpkRecord {
    /// Snapshot a state onto the reporting quantities.
    pub fn from_state(
        time: f64,
        state: &PbpkState,
        grid: &ComputationalGrid,
        central_volume: f64,
    ) -> Self {
        Self {
            time,
            airway_undissolved: state.airway_undissolved(grid),
            alveolar_undissolved: state.alveolar_undissolved(grid),
            airway_fluid: state.airway_fluid.sum(),
            airway_tissue: state.airway_tissue.sum(),
            alveolar_fluid: state.alveolar_fluid,
            alveolar_tissue: state.alveolar_tissue,
            gut: state.gut,
            peripheral: state.peripheral,
            cleared: state.cleared,
            central: state.central,
            mucociliary_cleared: state.mucociliary_cleared,
            plasma_concentration: state.central / central_volume,
        }
    }

    /// Sum of all in-system amounts plus the cleared masses \[µg\].
    pub fn total(&self) -> f64 {
        self.airway_undissolved
            + self.alveolar_undissolved
            + self.airway_fluid
            + self.airway_tissue
            + self.alveolar_fluid
            + self.alveolar_tissue
            + self.gut
            + self.peripheral
            + self.cleared
            + self.central
            + self.mucociliary_cleared
    }
}

// =================================================================================================
// Simulation Result
// =================================================================================================

/// Complete output of one run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Shared time grid \[min\], length `time_steps + 1`
    pub time_points: Vec<f64>,
    /// One record per time point
    pub records: Vec<PbpkRecord>,
    /// One diagnostics entry per advanced step (length `time_steps`)
    pub diagnostics: Vec<StepDiagnostics>,
    /// Final model state
    pub final_state: PbpkState,
    /// Run metadata (solver name, step size, grid dimensions, …)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    /// Number of stored time points.
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    /// True when no time points were stored.
    pub fn is_empty(&self) -> bool {
        self.time_points.is_empty()
    }

    /// Plasma-concentration time series \[µg/mL\].
    pub fn plasma_profile(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.plasma_concentration).collect()
    }

    /// Add a metadata entry.
    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Steps whose diagnostics carry at least one warning.
    pub fn flagged_steps(&self) -> Vec<&StepDiagnostics> {
        self.diagnostics.iter().filter(|d| !d.is_clean()).collect()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ComputationalGrid {
        ComputationalGrid::new(vec![0.0, 1.0, 2.0], vec![1e-12, 2e-12, 4e-12]).unwrap()
    }

    #[test]
    fn test_zero_state_sums_to_zero() {
        let grid = grid();
        let state = PbpkState::zeros(&grid);
        assert_eq!(state.total_mass(&grid), 0.0);
        assert!(!state.has_non_finite());
    }

    #[test]
    fn test_density_integrals() {
        let grid = grid();
        let mut state = PbpkState::zeros(&grid);
        // cell (0, 0): width 1 cm × 1e-12 cm³ at density 3e12
        state.airway_density[[0, 0]] = 3.0e12;
        // alveolar bin 1: width 2e-12 cm³ at density 1e12
        state.alveolar_density[1] = 1.0e12;

        assert!((state.airway_undissolved(&grid) - 3.0).abs() < 1e-9);
        assert!((state.alveolar_undissolved(&grid) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_mass_counts_every_pool() {
        let grid = grid();
        let mut state = PbpkState::zeros(&grid);
        state.airway_fluid[0] = 1.0;
        state.airway_tissue[1] = 2.0;
        state.alveolar_fluid = 3.0;
        state.alveolar_tissue = 4.0;
        state.gut = 5.0;
        state.peripheral = 6.0;
        state.cleared = 7.0;
        state.central = 8.0;
        state.mucociliary_cleared = 9.0;

        assert!((state.total_mass(&grid) - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_detection() {
        let grid = grid();
        let mut state = PbpkState::zeros(&grid);
        assert!(!state.has_non_finite());

        state.central = f64::NAN;
        assert!(state.has_non_finite());

        state.central = 0.0;
        state.airway_density[[1, 1]] = f64::INFINITY;
        assert!(state.has_non_finite());
    }

    #[test]
    fn test_record_snapshot() {
        let grid = grid();
        let mut state = PbpkState::zeros(&grid);
        state.central = 12.0;
        state.gut = 3.0;

        let record = PbpkRecord::from_state(5.0, &state, &grid, 4.0);
        assert!((record.plasma_concentration - 3.0).abs() < 1e-12);
        assert!((record.total() - 15.0).abs() < 1e-12);
        assert!((record.time - 5.0).abs() < 1e-15);
    }
}
