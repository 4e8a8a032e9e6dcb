//! Performance benchmarks for the PBPK solver
//!
//! Measures the cost of one full simulation run as a function of the two
//! grid axes the caller can refine:
//!
//! - **Size bins**: the per-step explicit density update scales with
//!   `axial cells × size bins`, the implicit solve only with the axial
//!   cells, so this isolates the population-balance cost.
//! - **Time steps**: the implicit factorization happens once per run, so
//!   cost per step should approach the back-substitution plus the density
//!   update.
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench solver_performance
//! cargo bench --bench solver_performance size_bins
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use std::hint::black_box;
use std::time::Duration;

use pulmo_rs::deposition::{DepositionData, DepositionTable};
use pulmo_rs::physiology::{LungGeometry, PhysiologyTable, ScalingFactors};
use pulmo_rs::solver::{LungPbpkSolver, Scenario, SolverConfiguration};
use pulmo_rs::substance::{RegionParameters, SubstanceParameters, SystemicPkParameters};

const DEPOSITION: &str = "\
dose = 100.0
diameter = geometric
2.0   3   0.20
1.5   5   0.25
1.0   8   0.15
1.0  25   0.20
";

fn reference_scenario() -> Scenario {
    let geometry = LungGeometry::from_table(
        &PhysiologyTable::human_adult(),
        ScalingFactors::default(),
    )
    .expect("reference physiology is valid");

    let region = RegionParameters {
        max_dissolution_rate: 1.0e-4,
        solubility: 1000.0,
        permeability: 5.0e-3,
        partition_coefficient: 4.0,
    };
    let substance = SubstanceParameters {
        airway: region,
        alveolar: region,
        density: 1.2e6,
        molecular_weight: 430.5,
        fraction_unbound: 0.1,
        blood_plasma_ratio: 0.85,
    };
    let systemic = SystemicPkParameters {
        clearance: 1.2,
        central_volume: 10.0,
        intercompartment_clearance: 0.6,
        peripheral_volume: 15.0,
        absorption_rate: 0.1,
        bioavailability: 0.75,
    };

    let table = DepositionTable::parse(DEPOSITION).expect("benchmark table parses");
    let deposition = DepositionData::from_table(&table, substance.density, 24)
        .expect("benchmark deposition derives");

    Scenario::new(geometry, substance, systemic, deposition)
}

/// Run cost vs. size-grid resolution at a fixed step count.
fn bench_size_bins(c: &mut Criterion) {
    let scenario = reference_scenario();

    let mut group = c.benchmark_group("size_bins");
    group.sampling_mode(SamplingMode::Flat);
    group.measurement_time(Duration::from_secs(8));

    for &bins in &[8usize, 16, 32] {
        let config = SolverConfiguration::time_evolution(30.0, 60)
            .with_size_bins(bins)
            .with_size_span(2.0);

        group.bench_with_input(BenchmarkId::from_parameter(bins), &config, |b, config| {
            b.iter(|| {
                let result = LungPbpkSolver::solve(black_box(&scenario), *config)
                    .expect("benchmark run succeeds");
                black_box(result.records.last().unwrap().plasma_concentration)
            })
        });
    }
    group.finish();
}

/// Run cost vs. step count at a fixed grid.
fn bench_time_steps(c: &mut Criterion) {
    let scenario = reference_scenario();

    let mut group = c.benchmark_group("time_steps");
    group.sampling_mode(SamplingMode::Flat);
    group.measurement_time(Duration::from_secs(8));

    for &steps in &[30usize, 120, 480] {
        let config = SolverConfiguration::time_evolution(30.0, steps)
            .with_size_bins(12)
            .with_size_span(2.0);

        group.bench_with_input(BenchmarkId::from_parameter(steps), &config, |b, config| {
            b.iter(|| {
                let result = LungPbpkSolver::solve(black_box(&scenario), *config)
                    .expect("benchmark run succeeds");
                black_box(result.final_state.central)
            })
        });
    }
    group.finish();
}

/// Preparation cost alone: grid construction, projection, factorization.
fn bench_prepare(c: &mut Criterion) {
    let scenario = reference_scenario();
    let config = SolverConfiguration::time_evolution(30.0, 60)
        .with_size_bins(16)
        .with_size_span(2.0);

    c.bench_function("prepare", |b| {
        b.iter(|| {
            let solver = LungPbpkSolver::prepare(black_box(&scenario), config)
                .expect("preparation succeeds");
            black_box(solver.grid().axial_cells())
        })
    });
}

criterion_group!(benches, bench_size_bins, bench_time_steps, bench_prepare);
criterion_main!(benches);
