//! pulmo-rs: Lung Pharmacokinetic Simulation Framework
//!
//! Simulates the fate of an inhaled drug dose: deposition along the airway
//! tree, mucociliary transport of undissolved particles toward the throat,
//! saturable dissolution into the lining fluid, permeation into lung tissue
//! and uptake into a two-compartment systemic disposition model.
//!
//! # Architecture
//!
//! pulmo-rs is built on two core principles:
//!
//! 1. **Separation of physiology and numerics**
//!    - Physiology, substance and deposition inputs are typed, validated,
//!      immutable values shared by reference
//!    - The solver owns everything mutable: the computational grid and the
//!      evolving state of one run
//!
//! 2. **Conservation by construction**
//!    - All regridding goes through a conservative projector that preserves
//!      integrals over arbitrary sub-ranges
//!    - Transport, dissolution and compartment transfer are written in flux
//!      form, so total drug mass (including the cleared sinks) is an
//!      invariant of the whole run
//!
//! # Quick Start
//!
//! ```rust
//! use pulmo_rs::deposition::{DepositionData, DepositionTable};
//! use pulmo_rs::physiology::{LungGeometry, PhysiologyTable, ScalingFactors};
//! use pulmo_rs::solver::{LungPbpkSolver, Scenario, SolverConfiguration};
//! use pulmo_rs::substance::{RegionParameters, SubstanceParameters, SystemicPkParameters};
//!
//! fn main() -> Result<(), String> {
//!     // 1. Physiology: reference adult airway tree
//!     let geometry = LungGeometry::from_table(
//!         &PhysiologyTable::human_adult(),
//!         ScalingFactors::default(),
//!     )?;
//!
//!     // 2. Substance: moderately soluble, moderately permeable compound
//!     let region = RegionParameters {
//!         max_dissolution_rate: 1.0e-4, // ug/(cm·min)
//!         solubility: 1000.0,           // ug/mL
//!         permeability: 1.0e-3,         // cm/min
//!         partition_coefficient: 4.0,
//!     };
//!     let substance = SubstanceParameters {
//!         airway: region,
//!         alveolar: region,
//!         density: 1.2e6, // ug/mL
//!         molecular_weight: 430.5,
//!         fraction_unbound: 0.1,
//!         blood_plasma_ratio: 0.85,
//!     };
//!
//!     // 3. Systemic disposition (two compartments, no gut absorption)
//!     let systemic = SystemicPkParameters {
//!         clearance: 1.2,                  // mL/min
//!         central_volume: 10.0,            // mL
//!         intercompartment_clearance: 0.6, // mL/min
//!         peripheral_volume: 15.0,         // mL
//!         absorption_rate: 0.0,            // 1/min
//!         bioavailability: 1.0,
//!     };
//!
//!     // 4. Deposition: 100 ug dose, two particle sizes, airway + alveolar
//!     let table = DepositionTable::parse(
//!         "dose = 100.0\ndiameter = geometric\n2.0 5 0.6\n1.0 25 0.3\n",
//!     )?;
//!     let deposition =
//!         DepositionData::from_table(&table, substance.density, geometry.generations())?;
//!
//!     // 5. Simulate ten minutes in one-minute steps
//!     let scenario = Scenario::new(geometry, substance, systemic, deposition);
//!     let config = SolverConfiguration::time_evolution(10.0, 10).with_size_bins(8);
//!     let result = LungPbpkSolver::solve(&scenario, config)?;
//!
//!     assert_eq!(result.len(), 11);
//!     let last = result.records.last().expect("at least the initial record");
//!     println!("plasma concentration at 10 min: {:.4} ug/mL", last.plasma_concentration);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`physiology`]: physiological inputs and the derived airway geometry
//! - [`substance`]: drug substance and systemic PK parameters
//! - [`deposition`]: deposition table parsing and initial-density projection
//! - [`grid`]: the fixed (position × particle size) computational grid
//! - [`kinetics`]: dissolution and mucociliary-transport laws
//! - [`solver`]: the semi-implicit PBPK solver
//! - [`output`]: CSV export and (feature `visualization`) SVG plots
//!
//! # Units
//!
//! Lengths in cm, volumes in mL, time in min, drug amounts in µg,
//! concentrations in µg/mL.

// Core modules
pub mod deposition;
pub mod grid;
pub mod kinetics;
pub mod output;
pub mod physiology;
pub mod solver;
pub mod substance;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use pulmo_rs::prelude::*;
    //! ```
    pub use crate::deposition::{DepositionData, DepositionProjector, DepositionTable};
    pub use crate::grid::ComputationalGrid;
    pub use crate::kinetics::{DissolutionKinetics, MucociliaryTransport};
    pub use crate::physiology::{LungGeometry, PhysiologyTable, ScalingFactors};
    pub use crate::solver::{
        LungPbpkSolver, PbpkRecord, PbpkState, Scenario, SimulationResult,
        SolverConfiguration, SolverPhase, StepDiagnostics,
    };
    pub use crate::substance::{
        RegionParameters, SubstanceParameters, SystemicPkParameters,
    };
}
