//! Computational grid for the lung population-balance model
//!
//! The solver discretizes the undissolved-particle distribution over two
//! coordinates:
//!
//! - **Axial position** `x` \[cm\]: distance along the airway tree from the
//!   trachea exit (`x = 0`) toward the terminal bronchioles.
//! - **Particle size** `s` \[cm³\]: the volume of an individual particle.
//!   Dissolution moves particles toward smaller `s`.
//!
//! The grid is fixed for the lifetime of a simulation run. Axial breakpoints
//! are derived from the airway geometry (segment boundaries plus generation
//! midpoints, so every segment contributes two cells); size breakpoints are
//! chosen to cover the deposited particle sizes plus the range they shrink
//! through, usually geometrically spaced.
//!
//! # Invariants
//!
//! - Both breakpoint lists are strictly increasing (checked at construction,
//!   a configuration error otherwise).
//! - Every physiological quantity placed on the grid goes through
//!   [`project_onto`], so its integral over any sub-range is preserved.

mod projection;

pub use projection::{project_onto, strictly_increasing};

use crate::physiology::LungGeometry;

// =================================================================================================
// Computational Grid
// =================================================================================================

/// Fixed 2-D grid over axial position and particle size.
///
/// Cell centers are interval midpoints; cell widths are interval lengths.
/// Axial cell `i` spans `axial_bounds[i] .. axial_bounds[i + 1]`, size bin
/// `b` spans `size_bounds[b] .. size_bounds[b + 1]`.
#[derive(Debug, Clone)]
pub struct ComputationalGrid {
    axial_bounds: Vec<f64>,
    size_bounds: Vec<f64>,
    axial_centers: Vec<f64>,
    size_centers: Vec<f64>,
    axial_widths: Vec<f64>,
    size_widths: Vec<f64>,
}

impl ComputationalGrid {
    /// Create a grid from explicit breakpoint lists.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error when either list has fewer than two
    /// entries or is not strictly increasing.
    pub fn new(axial_bounds: Vec<f64>, size_bounds: Vec<f64>) -> Result<Self, String> {
        if axial_bounds.len() < 2 {
            return Err(format!(
                "Axial grid needs at least two breakpoints, got {}",
                axial_bounds.len()
            ));
        }
        if size_bounds.len() < 2 {
            return Err(format!(
                "Size grid needs at least two breakpoints, got {}",
                size_bounds.len()
            ));
        }
        if !strictly_increasing(&axial_bounds) {
            return Err("Axial breakpoints must be strictly increasing".to_string());
        }
        if !strictly_increasing(&size_bounds) {
            return Err("Size breakpoints must be strictly increasing".to_string());
        }
        if size_bounds[0] <= 0.0 {
            return Err(format!(
                "Particle sizes must be positive, smallest size breakpoint is {}",
                size_bounds[0]
            ));
        }

        let centers = |bounds: &[f64]| -> Vec<f64> {
            bounds.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
        };
        let widths = |bounds: &[f64]| -> Vec<f64> {
            bounds.windows(2).map(|w| w[1] - w[0]).collect()
        };

        Ok(Self {
            axial_centers: centers(&axial_bounds),
            size_centers: centers(&size_bounds),
            axial_widths: widths(&axial_bounds),
            size_widths: widths(&size_bounds),
            axial_bounds,
            size_bounds,
        })
    }

    /// Build the grid from an airway geometry and a size-breakpoint list.
    ///
    /// The axial breakpoints are the union of the segment boundaries and the
    /// segment midpoints, so every airway generation is resolved by two
    /// cells and the midpoint (where mucociliary velocity is anchored) is a
    /// cell interface.
    pub fn from_geometry(
        geometry: &LungGeometry,
        size_bounds: Vec<f64>,
    ) -> Result<Self, String> {
        let segments = geometry.segments();
        let mut axial = Vec::with_capacity(2 * segments.len() + 1);
        for segment in segments {
            axial.push(segment.x_start);
            axial.push(segment.x_mid);
        }
        if let Some(last) = segments.last() {
            axial.push(last.x_end);
        }
        Self::new(axial, size_bounds)
    }

    /// Geometrically spaced size breakpoints from `min` to `max`.
    ///
    /// # Panics
    ///
    /// Panics when `min <= 0`, `max <= min` or `bins == 0`.
    pub fn geometric_size_bounds(min: f64, max: f64, bins: usize) -> Vec<f64> {
        assert!(min > 0.0, "Smallest size must be positive, got {}", min);
        assert!(max > min, "Size range is empty: [{}, {}]", min, max);
        assert!(bins > 0, "Need at least one size bin");

        let ratio = (max / min).powf(1.0 / bins as f64);
        let mut bounds = Vec::with_capacity(bins + 1);
        for b in 0..bins {
            bounds.push(min * ratio.powi(b as i32));
        }
        // final breakpoint set exactly, avoiding powf rounding drift
        bounds.push(max);
        bounds
    }

    // ====== Accessors ======

    /// Number of axial cells.
    pub fn axial_cells(&self) -> usize {
        self.axial_widths.len()
    }

    /// Number of size bins.
    pub fn size_bins(&self) -> usize {
        self.size_widths.len()
    }

    /// Axial breakpoints `Xbnd` (length `axial_cells + 1`).
    pub fn axial_bounds(&self) -> &[f64] {
        &self.axial_bounds
    }

    /// Size breakpoints `Sbnd` (length `size_bins + 1`).
    pub fn size_bounds(&self) -> &[f64] {
        &self.size_bounds
    }

    /// Axial cell centers `Xctr`.
    pub fn axial_centers(&self) -> &[f64] {
        &self.axial_centers
    }

    /// Size bin centers `Sctr`.
    pub fn size_centers(&self) -> &[f64] {
        &self.size_centers
    }

    /// Axial cell widths.
    pub fn axial_widths(&self) -> &[f64] {
        &self.axial_widths
    }

    /// Size bin widths.
    pub fn size_widths(&self) -> &[f64] {
        &self.size_widths
    }
}

// =================================================================================================
// Tests
// =================================================================================================
