//! Helper builders for integration tests

use pulmo_rs::deposition::{DepositionData, DepositionTable};
use pulmo_rs::physiology::{LungGeometry, PhysiologyTable, ScalingFactors};
use pulmo_rs::solver::Scenario;
use pulmo_rs::substance::{RegionParameters, SubstanceParameters, SystemicPkParameters};

/// Compute relative error: |actual - expected| / |expected|, falling back to
/// the absolute error when the expected value is (numerically) zero.
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Reference adult physiology.
pub fn reference_physiology() -> PhysiologyTable {
    PhysiologyTable::human_adult()
}

/// Moderately soluble, moderately permeable reference compound.
///
/// `kdiss` is the maximum dissolution rate in ug/(cm·min); pass `0.0` for an
/// insoluble tracer.
pub fn reference_substance(kdiss: f64) -> SubstanceParameters {
    let region = RegionParameters {
        max_dissolution_rate: kdiss,
        solubility: 1000.0,
        permeability: 5.0e-3,
        partition_coefficient: 4.0,
    };
    SubstanceParameters {
        airway: region,
        alveolar: region,
        density: 1.2e6,
        molecular_weight: 430.5,
        fraction_unbound: 0.1,
        blood_plasma_ratio: 0.85,
    }
}

/// Reference two-compartment disposition.
pub fn reference_systemic(absorption_rate: f64, bioavailability: f64) -> SystemicPkParameters {
    SystemicPkParameters {
        clearance: 1.2,
        central_volume: 10.0,
        intercompartment_clearance: 0.6,
        peripheral_volume: 15.0,
        absorption_rate,
        bioavailability,
    }
}

/// Build a scenario from a physiology table, a substance and a deposition
/// table text.
pub fn scenario_with_deposition(
    physiology: &PhysiologyTable,
    substance: SubstanceParameters,
    systemic: SystemicPkParameters,
    deposition_text: &str,
) -> Scenario {
    let geometry = LungGeometry::from_table(physiology, ScalingFactors::default())
        .expect("reference physiology must be valid");
    let table = DepositionTable::parse(deposition_text).expect("deposition table must parse");
    let deposition =
        DepositionData::from_table(&table, substance.density, geometry.generations())
            .expect("deposition data must derive");
    Scenario::new(geometry, substance, systemic, deposition)
}
