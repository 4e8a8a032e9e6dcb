//! Implicit-system layout and block-matrix assembly
//!
//! The dissolved and tissue amounts are advanced implicitly: at every step
//! the solver solves `(I - Δt·M)·y_{n+1} = y_n + d`, where `y` stacks all
//! coupled amounts and `d` carries the explicit dissolution sources. `M` is
//! the constant rate matrix assembled here once per run.
//!
//! # Unknown layout
//!
//! [`UnknownMap`] assigns every amount a contiguous offset in `y`:
//!
//! ```text
//! [ fluid(0), tissue(0), fluid(1), tissue(1), …,        2 × axial cells
//!   alveolar fluid, alveolar tissue,                    + 2
//!   gut, peripheral, cleared, central ]                 + 4
//! ```
//!
//! # Couplings
//!
//! - Lining fluid ↔ tissue, per cell: permeability × surface area, with the
//!   tissue-side driving concentration scaled by the plasma:tissue
//!   partition coefficient `Kp`.
//! - Tissue → central: perfusion-limited transfer `Q·BP / (Kp·V_t)` with
//!   the blood:plasma ratio `BP` (venous-equilibration form).
//! - Systemic two-compartment relations `k10 = Cl/V`, `k12 = Q/V`,
//!   `k21 = Q/Vp`.
//! - Gut absorption `k01` split by bioavailability: `F·k01` into central,
//!   `(1-F)·k01` into the cleared sink.
//!
//! Every transfer appears once as an outflow and once as an inflow, so each
//! column of `M` sums to zero — total mass (including the cleared sink) is
//! conserved by the implicit step to solver precision.

use nalgebra::DMatrix;

use crate::physiology::AlveolarRegion;
use crate::substance::{RegionParameters, SubstanceParameters, SystemicPkParameters};

// =================================================================================================
// Unknown Map
// =================================================================================================

/// Maps model amounts to offsets in the implicit unknown vector.
#[derive(Debug, Clone, Copy)]
pub struct UnknownMap {
    axial_cells: usize,
}

impl UnknownMap {
    /// Layout for a grid with `axial_cells` airway cells.
    pub fn new(axial_cells: usize) -> Self {
        Self { axial_cells }
    }

    /// Number of airway cells in the layout.
    pub fn axial_cells(&self) -> usize {
        self.axial_cells
    }

    /// Total number of unknowns: `2·cells + 2 + 4`.
    pub fn len(&self) -> usize {
        2 * self.axial_cells + 6
    }

    /// Airway lining-fluid amount of cell `i`.
    pub fn airway_fluid(&self, cell: usize) -> usize {
        2 * cell
    }

    /// Airway tissue amount of cell `i`.
    pub fn airway_tissue(&self, cell: usize) -> usize {
        2 * cell + 1
    }

    /// Alveolar lining-fluid amount.
    pub fn alveolar_fluid(&self) -> usize {
        2 * self.axial_cells
    }

    /// Alveolar tissue amount.
    pub fn alveolar_tissue(&self) -> usize {
        2 * self.axial_cells + 1
    }

    /// Gut depot.
    pub fn gut(&self) -> usize {
        2 * self.axial_cells + 2
    }

    /// Peripheral compartment.
    pub fn peripheral(&self) -> usize {
        2 * self.axial_cells + 3
    }

    /// Cleared sink.
    pub fn cleared(&self) -> usize {
        2 * self.axial_cells + 4
    }

    /// Central compartment.
    pub fn central(&self) -> usize {
        2 * self.axial_cells + 5
    }
}

// =================================================================================================
// Rate-Matrix Assembly
// =================================================================================================

/// First-order exchange rates of one fluid/tissue pair \[1/min\].
///
/// Zero volumes disable the corresponding transfer instead of dividing by
/// zero (a cell without tissue simply has no tissue exchange).
fn exchange_rates(
    region: &RegionParameters,
    blood_plasma_ratio: f64,
    elf_volume: f64,
    tissue_volume: f64,
    blood_flow: f64,
) -> (f64, f64, f64) {
    let fluid_to_tissue = if elf_volume > 0.0 {
        region.permeability / elf_volume
    } else {
        0.0
    };
    let tissue_to_fluid = if tissue_volume > 0.0 {
        region.permeability / (region.partition_coefficient * tissue_volume)
    } else {
        0.0
    };
    let tissue_to_central = if tissue_volume > 0.0 {
        blood_flow * blood_plasma_ratio / (region.partition_coefficient * tissue_volume)
    } else {
        0.0
    };
    (fluid_to_tissue, tissue_to_fluid, tissue_to_central)
}

/// Assemble the constant rate matrix `M` of the coupled amount system.
///
/// `surface_areas` multiplies the permeability on both exchange directions;
/// the per-cell vectors must all have `map.axial_cells()` entries.
pub fn assemble_rate_matrix(
    map: &UnknownMap,
    elf_volumes: &[f64],
    tissue_volumes: &[f64],
    blood_flows: &[f64],
    surface_areas: &[f64],
    alveolar: &AlveolarRegion,
    substance: &SubstanceParameters,
    systemic: &SystemicPkParameters,
) -> DMatrix<f64> {
    let cells = map.axial_cells();
    assert_eq!(elf_volumes.len(), cells, "ELF volume vector length mismatch");
    assert_eq!(tissue_volumes.len(), cells, "Tissue volume vector length mismatch");
    assert_eq!(blood_flows.len(), cells, "Blood flow vector length mismatch");
    assert_eq!(surface_areas.len(), cells, "Surface area vector length mismatch");

    let mut m = DMatrix::zeros(map.len(), map.len());
    let bp = substance.blood_plasma_ratio;

    // ====== Airway cells: fluid <-> tissue, tissue -> central ======

    for i in 0..cells {
        let scaled = RegionParameters {
            permeability: substance.airway.permeability * surface_areas[i],
            ..substance.airway
        };
        let (a, b, q) = exchange_rates(
            &scaled,
            bp,
            elf_volumes[i],
            tissue_volumes[i],
            blood_flows[i],
        );

        let af = map.airway_fluid(i);
        let at = map.airway_tissue(i);

        m[(af, af)] -= a;
        m[(at, af)] += a;
        m[(af, at)] += b;
        m[(at, at)] -= b + q;
        m[(map.central(), at)] += q;
    }

    // ====== Alveolar pair ======

    {
        let scaled = RegionParameters {
            permeability: substance.alveolar.permeability * alveolar.surface_area,
            ..substance.alveolar
        };
        let (a, b, q) = exchange_rates(
            &scaled,
            bp,
            alveolar.elf_volume,
            alveolar.tissue_volume,
            alveolar.blood_flow,
        );

        let af = map.alveolar_fluid();
        let at = map.alveolar_tissue();

        m[(af, af)] -= a;
        m[(at, af)] += a;
        m[(af, at)] += b;
        m[(at, at)] -= b + q;
        m[(map.central(), at)] += q;
    }

    // ====== Systemic compartments ======

    let k10 = systemic.k10();
    let k12 = systemic.k12();
    let k21 = systemic.k21();
    let k01 = systemic.absorption_rate;
    let f = systemic.bioavailability;

    let gut = map.gut();
    let peripheral = map.peripheral();
    let cleared = map.cleared();
    let central = map.central();

    m[(central, central)] -= k10 + k12;
    m[(peripheral, central)] += k12;
    m[(cleared, central)] += k10;

    m[(central, peripheral)] += k21;
    m[(peripheral, peripheral)] -= k21;

    m[(gut, gut)] -= k01;
    m[(central, gut)] += f * k01;
    m[(cleared, gut)] += (1.0 - f) * k01;

    m
}

// =================================================================================================
// Tests
// =================================================================================================
