//! Solver configuration
//!
//! HOW to run a simulation: the time horizon, the number of (fixed) time
//! steps and the resolution of the particle-size grid. The WHAT lives in
//! [`crate::solver::Scenario`].

// =================================================================================================
// Solver Configuration
// =================================================================================================

/// Numerical parameters of one simulation run.
///
/// # Example
///
/// ```rust
/// use pulmo_rs::solver::SolverConfiguration;
///
/// // one hour in one-minute steps, default size grid
/// let config = SolverConfiguration::time_evolution(60.0, 60);
/// assert!(config.validate().is_ok());
/// assert!((config.dt() - 1.0).abs() < 1e-12);
///
/// // refined size grid for a dissolution-limited compound
/// let config = SolverConfiguration::time_evolution(60.0, 600)
///     .with_size_bins(32)
///     .with_size_span(16.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SolverConfiguration {
    /// Total simulated time \[min\]
    pub total_time: f64,

    /// Number of fixed time steps
    pub time_steps: usize,

    /// Number of particle-size bins
    pub size_bins: usize,

    /// Factor by which the size grid extends below the smallest deposited
    /// particle volume, covering the range particles shrink through before
    /// they count as fully dissolved
    pub size_span: f64,
}

impl SolverConfiguration {
    /// Create a time-evolution configuration with the default size grid
    /// (24 bins spanning a factor 8 below the smallest deposit).
    pub fn time_evolution(total_time: f64, time_steps: usize) -> Self {
        Self {
            total_time,
            time_steps,
            size_bins: 24,
            size_span: 8.0,
        }
    }

    /// Builder: set the number of size bins.
    pub fn with_size_bins(mut self, size_bins: usize) -> Self {
        self.size_bins = size_bins;
        self
    }

    /// Builder: set the shrink span of the size grid.
    pub fn with_size_span(mut self, size_span: f64) -> Self {
        self.size_span = size_span;
        self
    }

    /// Fixed step size Δt \[min\].
    pub fn dt(&self) -> f64 {
        self.total_time / self.time_steps as f64
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.total_time > 0.0) {
            return Err(format!("Total time must be positive, got {}", self.total_time));
        }
        if self.time_steps == 0 {
            return Err("Number of time steps must be greater than 0".to_string());
        }
        if self.size_bins == 0 {
            return Err("Number of size bins must be greater than 0".to_string());
        }
        if !(self.size_span >= 1.0) {
            return Err(format!(
                "Size span must be at least 1, got {}",
                self.size_span
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================
