//! Per-step numerical-quality diagnostics
//!
//! The solver watches two numerical-quality indicators at every step and
//! reports them as data instead of printing or correcting:
//!
//! - **CFL number**: the largest explicit-update coefficient
//!   `Δt · (axial transport rate + size shrink rate)` over all grid cells.
//!   Values above one mean the explicit density update can overshoot.
//! - **Negativity**: any density or amount below zero after the step.
//!
//! Both are *observational*. The advanced state is never clamped or
//! corrected by the solver — if a run needs clamping, that is a
//! post-processing policy of the caller. This keeps "numerically suspect"
//! cleanly separated from "fatal" (singular system, NaN), which does abort
//! the run.

// =================================================================================================
// Step Diagnostics
// =================================================================================================

/// Numerical-quality report for one time step.
#[derive(Debug, Clone)]
pub struct StepDiagnostics {
    /// Step index (1-based; step `n` advances `t_{n-1} -> t_n`)
    pub step: usize,
    /// Time at the end of the step \[min\]
    pub time: f64,
    /// Largest explicit-update coefficient observed in this step
    pub max_cfl: f64,
    /// Number of grid cells whose coefficient exceeded one
    pub cfl_violations: usize,
    /// Descriptions of negative quantities found after the step
    pub negatives: Vec<String>,
}

impl StepDiagnostics {
    /// Create an empty report for a step.
    pub fn new(step: usize, time: f64) -> Self {
        Self {
            step,
            time,
            max_cfl: 0.0,
            cfl_violations: 0,
            negatives: Vec::new(),
        }
    }

    /// Record one explicit-update coefficient.
    pub fn record_cfl(&mut self, coefficient: f64) {
        if coefficient > self.max_cfl {
            self.max_cfl = coefficient;
        }
        if coefficient > 1.0 {
            self.cfl_violations += 1;
        }
    }

    /// Record a negative quantity.
    pub fn record_negative(&mut self, quantity: &str, value: f64) {
        self.negatives.push(format!("{} = {:e}", quantity, value));
    }

    /// True when the step raised no warnings.
    pub fn is_clean(&self) -> bool {
        self.cfl_violations == 0 && self.negatives.is_empty()
    }

    /// Human-readable warning lines for this step (empty when clean).
    pub fn warnings(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.cfl_violations > 0 {
            lines.push(format!(
                "step {} (t = {}): stability coefficient {:.3} exceeds 1 in {} cell(s); \
                 consider reducing the time step",
                self.step, self.time, self.max_cfl, self.cfl_violations
            ));
        }
        for negative in &self.negatives {
            lines.push(format!(
                "step {} (t = {}): negative quantity {}",
                self.step, self.time, negative
            ));
        }
        lines
    }
}

// =================================================================================================
// Tests
// =================================================================================================
