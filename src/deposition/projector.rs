//! Initial-density projection onto the computational grid
//!
//! Deposition data is discrete — an amount per (generation, particle size)
//! pair — while the solver works with a continuous mass density over
//! (axial position × particle size). The projection has to reproduce the
//! deposited mass over any grid sub-rectangle, otherwise the mass-balance
//! invariant is broken before the first time step.
//!
//! # Method
//!
//! 1. Each reported particle size becomes a short synthetic size interval
//!    `[v·(1-δ), v·(1+δ)]` (δ = [`SYNTHETIC_SIZE_HALF_WIDTH`]), turning the
//!    discrete size list into a piecewise-constant density. The intervals,
//!    together with the gaps between them, form a source partition of the
//!    size axis.
//! 2. Airway amounts are laid out on the (generation × size-interval)
//!    source rectangle, spread uniformly over each generation's axial
//!    extent.
//! 3. Two passes of the conservative projector ([`project_onto`]) transfer
//!    the cumulative mass surface onto the grid: first along the axial
//!    axis per size interval, then along the size axis per grid cell.
//!    Differencing the interpolated cumulative sums in both directions
//!    yields the per-cell mass, which is exact because every deposit is a
//!    product of two interval indicators.
//! 4. Cell masses are divided by the cell area to give the density;
//!    negative interpolation noise is clipped to zero.
//!
//! The alveolar region has no axial coordinate, so its deposits only go
//! through the size-axis pass.

use nalgebra::DVector;
use ndarray::Array2;

use crate::deposition::{DepositionData, SYNTHETIC_SIZE_HALF_WIDTH};
use crate::grid::{project_onto, ComputationalGrid};
use crate::physiology::LungGeometry;

// =================================================================================================
// Initial Density
// =================================================================================================

/// Undissolved-particle mass density at `t = 0`.
#[derive(Debug, Clone)]
pub struct InitialDensity {
    /// Airway density ρ(x, s) \[µg/(cm·cm³)\], shape `[axial cells × size bins]`
    pub airway: Array2<f64>,
    /// Alveolar density ρ(s) \[µg/cm³\], one entry per size bin
    pub alveolar: DVector<f64>,
}

impl InitialDensity {
    /// Total undissolved mass on the grid \[µg\].
    pub fn total_mass(&self, grid: &ComputationalGrid) -> f64 {
        let dx = grid.axial_widths();
        let ds = grid.size_widths();

        let mut total = 0.0;
        for i in 0..grid.axial_cells() {
            for b in 0..grid.size_bins() {
                total += self.airway[[i, b]] * dx[i] * ds[b];
            }
        }
        for b in 0..grid.size_bins() {
            total += self.alveolar[b] * ds[b];
        }
        total
    }
}

// =================================================================================================
// Deposition Projector
// =================================================================================================

/// Builds the initial 2-D density from deposition data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepositionProjector;

impl DepositionProjector {
    /// Project the deposited amounts onto the computational grid.
    ///
    /// # Errors
    ///
    /// Fails when an airway deposit references a generation outside the
    /// geometry, or when two reported particle sizes are so close that
    /// their synthetic size intervals overlap (the table should merge such
    /// rows).
    pub fn project(
        data: &DepositionData,
        geometry: &LungGeometry,
        grid: &ComputationalGrid,
    ) -> Result<InitialDensity, String> {
        let generations = geometry.generations();
        for deposit in &data.airway {
            if deposit.generation > generations {
                return Err(format!(
                    "Airway deposit at generation {} but the tree has only {} generations",
                    deposit.generation, generations
                ));
            }
        }

        // ====== Source partition of the size axis ======

        let volumes = data.particle_volumes();
        let (size_source, piece_of) = synthetic_size_partition(&volumes)?;

        let cells = grid.axial_cells();
        let bins = grid.size_bins();
        let pieces = size_source.len().saturating_sub(1);

        let mut airway = Array2::zeros((cells, bins));
        let mut alveolar = DVector::zeros(bins);

        if pieces > 0 {
            // ====== Airway: axial pass, then size pass ======

            if !data.airway.is_empty() {
                let generation_bounds: Vec<f64> = geometry
                    .segments()
                    .iter()
                    .map(|s| s.x_start)
                    .chain(std::iter::once(geometry.total_length()))
                    .collect();

                // amounts on the (generation × size-piece) source rectangle
                let mut source = vec![vec![0.0_f64; pieces]; generations];
                for deposit in &data.airway {
                    let piece = piece_of(deposit.particle_volume);
                    source[deposit.generation - 1][piece] += deposit.amount;
                }

                // axial pass: one conservative projection per size piece
                let mut intermediate = vec![vec![0.0_f64; pieces]; cells];
                for piece in 0..pieces {
                    let column: Vec<f64> =
                        (0..generations).map(|g| source[g][piece]).collect();
                    let projected =
                        project_onto(&generation_bounds, &column, grid.axial_bounds());
                    for (i, mass) in projected.into_iter().enumerate() {
                        intermediate[i][piece] = mass;
                    }
                }

                // size pass: one conservative projection per grid cell
                for i in 0..cells {
                    let projected =
                        project_onto(&size_source, &intermediate[i], grid.size_bounds());
                    for (b, mass) in projected.into_iter().enumerate() {
                        airway[[i, b]] = mass;
                    }
                }
            }

            // ====== Alveolar: size pass only ======

            if !data.alveolar.is_empty() {
                let mut source = vec![0.0_f64; pieces];
                for deposit in &data.alveolar {
                    source[piece_of(deposit.particle_volume)] += deposit.amount;
                }
                let projected = project_onto(&size_source, &source, grid.size_bounds());
                for (b, mass) in projected.into_iter().enumerate() {
                    alveolar[b] = mass;
                }
            }
        }

        // ====== Mass -> density, clipping interpolation noise ======

        let dx = grid.axial_widths();
        let ds = grid.size_widths();
        for i in 0..cells {
            for b in 0..bins {
                let density = airway[[i, b]] / (dx[i] * ds[b]);
                airway[[i, b]] = density.max(0.0);
            }
        }
        for b in 0..bins {
            alveolar[b] = (alveolar[b] / ds[b]).max(0.0);
        }

        Ok(InitialDensity { airway, alveolar })
    }
}

/// Build the source size partition from the distinct particle volumes.
///
/// Returns the breakpoints (deposit intervals plus the gaps between them)
/// and a lookup from particle volume to the index of its interval.
fn synthetic_size_partition(
    volumes: &[f64],
) -> Result<(Vec<f64>, impl Fn(f64) -> usize + '_), String> {
    let delta = SYNTHETIC_SIZE_HALF_WIDTH;
    let mut bounds = Vec::with_capacity(2 * volumes.len());
    let mut piece_index = Vec::with_capacity(volumes.len());

    for (k, &v) in volumes.iter().enumerate() {
        let lower = v * (1.0 - delta);
        let upper = v * (1.0 + delta);
        if let Some(&previous) = bounds.last() {
            if lower <= previous {
                return Err(format!(
                    "Particle sizes {:.3e} and {:.3e} are too close to carry disjoint \
                     size intervals; merge the deposition rows",
                    volumes[k - 1],
                    v
                ));
            }
        }
        piece_index.push(bounds.len());
        bounds.push(lower);
        bounds.push(upper);
    }

    let lookup = move |volume: f64| -> usize {
        // volumes come from the same deduplicated list, so an exact match
        // always exists
        let k = volumes
            .iter()
            .position(|&v| v == volume)
            .expect("particle volume not in the deposition size list");
        piece_index[k]
    };

    Ok((bounds, lookup))
}

// =================================================================================================
// Tests
// =================================================================================================
