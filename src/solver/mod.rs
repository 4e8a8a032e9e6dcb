//! The lung pharmacokinetic solver
//!
//! This module owns the coupled time integration of the population-balance
//! model. The architecture separates three concerns:
//!
//! 1. **Scenario** ([`Scenario`]) — WHAT to simulate
//!    - Airway geometry, substance, systemic PK, deposition
//!    - Validated once before any state exists
//!
//! 2. **Configuration** ([`SolverConfiguration`]) — HOW to simulate
//!    - Total time, number of time steps, size-grid resolution
//!
//! 3. **Solver** ([`LungPbpkSolver`]) — the numerical method
//!    - Owns the grid and the evolving [`PbpkState`] for one run
//!    - Advances a semi-implicit scheme: explicit upwind transport and
//!      dissolution of the particle density, implicit block solve for the
//!      fluid/tissue/systemic amounts
//!
//! The same scenario can be run with different configurations (grid
//! refinement, step-size studies) and, because the solver carries no global
//! mutable state, independent runs over shared read-only inputs can be
//! executed in parallel by the caller.
//!
//! # Workflow
//!
//! ```text
//! ┌────────────────────┐   ┌────────────────────┐
//! │ Scenario           │   │ SolverConfiguration│
//! │ (what to simulate) │   │ (how to simulate)  │
//! └─────────┬──────────┘   └─────────┬──────────┘
//!           └──────────┬─────────────┘
//!              ┌───────▼────────┐
//!              │ LungPbpkSolver │  Uninitialized → Prepared
//!              │   prepare()    │  (grid built, inputs projected,
//!              └───────┬────────┘   initial density populated)
//!              ┌───────▼────────┐
//!              │     run()      │  Running → Completed
//!              └───────┬────────┘
//!              ┌───────▼────────┐
//!              │SimulationResult│  time series + diagnostics + metadata
//!              └────────────────┘
//! ```
//!
//! # Error Handling
//!
//! Three failure classes, deliberately kept apart:
//!
//! - **Configuration errors** (malformed inputs, inconsistent lists,
//!   non-increasing breakpoints) abort `prepare()` with a descriptive
//!   message.
//! - **Numerical-quality warnings** (CFL violation, negative amounts) are
//!   collected per step in [`StepDiagnostics`] and never stop the loop or
//!   alter the state.
//! - **Fatal numerical failures** (singular implicit system, NaN/Inf in the
//!   state) abort the run — no valid next state can be produced.

// =================================================================================================
// Module Declarations
// =================================================================================================

mod assembly;
mod config;
mod diagnostics;
mod pbpk;
mod scenario;
mod state;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Deciding *when* to hand work off to Rayon is a numerical-execution concern
// and lives here rather than with the physics. The threshold is stored in an
// AtomicUsize so benchmarks and tests can change it at runtime without a
// mutex on every kernel call; Relaxed ordering is sufficient because the
// value is a performance hint, not a synchronisation point.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of axial cells above which per-cell kernels switch to
/// parallel iteration (only with the `parallel` feature).
const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold.
///
/// # Panics
///
/// Panics when `threshold == 0`.
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// Map a per-cell kernel over `0..n`, in parallel when `n` reaches the
/// threshold and the `parallel` feature is enabled.
pub(crate) fn map_cells<T, F>(n: usize, kernel: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if n >= parallel_threshold() {
            return (0..n).into_par_iter().map(kernel).collect();
        }
    }
    (0..n).map(kernel).collect()
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use assembly::UnknownMap;
pub use config::SolverConfiguration;
pub use diagnostics::StepDiagnostics;
pub use pbpk::{LungPbpkSolver, SolverPhase};
pub use scenario::Scenario;
pub use state::{PbpkRecord, PbpkState, SimulationResult};

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_value() {
        assert_eq!(DEFAULT_PARALLEL_THRESHOLD, 256);
    }

    #[test]
    fn test_get_and_set_threshold() {
        let previous = parallel_threshold();
        set_parallel_threshold(512);
        assert_eq!(parallel_threshold(), 512);
        set_parallel_threshold(previous);
    }

    #[test]
    #[should_panic(expected = "parallel threshold must be at least 1")]
    fn test_zero_threshold_panics() {
        set_parallel_threshold(0);
    }

    #[test]
    fn test_map_cells_matches_sequential() {
        let squares = map_cells(10, |i| i * i);
        assert_eq!(squares, (0..10).map(|i| i * i).collect::<Vec<_>>());
    }
}
