//! Simulation scenario definition
//!
//! A scenario bundles everything that defines one subject × compound ×
//! administration case: the airway geometry, the substance, the systemic
//! disposition parameters and the deposition pattern, plus an optional
//! initial gut depot (for drug administered or swallowed before the run).
//!
//! The same scenario can be solved with different configurations, and —
//! since all members are read-only during a run — shared by reference
//! across concurrent runs.

use crate::deposition::DepositionData;
use crate::physiology::LungGeometry;
use crate::substance::{SubstanceParameters, SystemicPkParameters};

// =================================================================================================
// Scenario
// =================================================================================================

/// One complete simulation case (the WHAT, not the HOW).
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Airway geometry and alveolar region
    pub geometry: LungGeometry,

    /// Drug substance parameters
    pub substance: SubstanceParameters,

    /// Systemic two-compartment disposition
    pub systemic: SystemicPkParameters,

    /// Deposited dose
    pub deposition: DepositionData,

    /// Initial amount in the gut depot \[µg\]; absorbed at `k01` with
    /// bioavailability `F` when non-zero
    pub gut_dose: f64,
}

impl Scenario {
    /// Create a scenario without a gut depot.
    pub fn new(
        geometry: LungGeometry,
        substance: SubstanceParameters,
        systemic: SystemicPkParameters,
        deposition: DepositionData,
    ) -> Self {
        Self {
            geometry,
            substance,
            systemic,
            deposition,
            gut_dose: 0.0,
        }
    }

    /// Builder: seed the gut depot with an initial amount \[µg\].
    pub fn with_gut_dose(mut self, gut_dose: f64) -> Self {
        self.gut_dose = gut_dose;
        self
    }

    /// Validate the scenario members and their mutual consistency.
    ///
    /// These are the configuration errors of a run: they abort setup before
    /// any simulation state exists.
    pub fn validate(&self) -> Result<(), String> {
        self.substance.validate()?;
        self.systemic.validate()?;

        if self.gut_dose < 0.0 {
            return Err(format!("Gut dose cannot be negative, got {}", self.gut_dose));
        }

        let generations = self.geometry.generations();
        for deposit in &self.deposition.airway {
            if deposit.generation > generations {
                return Err(format!(
                    "Deposition references airway generation {} but the geometry has {}",
                    deposit.generation, generations
                ));
            }
        }

        Ok(())
    }

    /// Total drug entering the simulated system \[µg\]: deposited lung dose
    /// plus the gut depot. Mass balance is checked against this reference.
    pub fn total_input(&self) -> f64 {
        self.deposition.deposited_dose() + self.gut_dose
    }
}

// =================================================================================================
// Tests
// =================================================================================================
