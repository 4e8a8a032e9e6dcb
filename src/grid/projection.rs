//! Conservative projection between 1-D partitions
//!
//! Physiological quantities (lining-fluid volume, tissue volume, blood flow,
//! deposited dose) are supplied on one partition of the airway axis — usually
//! the anatomical segments — and have to be transferred onto the computational
//! grid. A plain pointwise interpolation would not preserve totals; this module
//! implements the exact redistribution of per-interval integrals instead.
//!
//! # Contract
//!
//! Given source breakpoints `x1` (length `n + 1`), per-interval integrals `v1`
//! (length `n`) and target breakpoints `x2` (length `m + 1`),
//! [`project_onto`] returns `v2` (length `m`) such that `v2[j]` equals the
//! integral over the j-th target interval of the piecewise-constant density
//! defined by `(x1, v1)`.
//!
//! # Method
//!
//! 1. Build the cumulative integral at the source breakpoints
//!    (prefix sum of `v1`, starting at zero).
//! 2. Evaluate the cumulative function at every target breakpoint by linear
//!    interpolation. Outside the source range the cumulative function is
//!    flat, so evaluation clamps to the boundary values — mass never appears
//!    from beyond the source domain.
//! 3. Difference consecutive evaluations.
//!
//! Linear interpolation of the cumulative integral is *exact* for a step
//! density, so the projection preserves the integral over any sub-range
//! common to both partitions, not just the full domain.

// =================================================================================================
// Projection
// =================================================================================================

/// Project per-interval integrals from one partition onto another.
///
/// # Arguments
///
/// * `source_bounds` - Source breakpoints, strictly increasing, length `n + 1`
/// * `source_integrals` - Integral of the projected quantity over each source
///   interval, length `n`
/// * `target_bounds` - Target breakpoints, strictly increasing, length `m + 1`
///
/// # Returns
///
/// Per-interval integrals on the target partition, length `m`.
///
/// # Panics
///
/// Panics when `source_bounds.len() != source_integrals.len() + 1` or when
/// either breakpoint list has fewer than two entries. Monotonicity of the
/// breakpoints is the caller's responsibility (checked once at grid
/// construction, see [`crate::grid::ComputationalGrid::new`]).
///
/// # Example
///
/// ```rust
/// use pulmo_rs::grid::project_onto;
///
/// // 10 units on [0, 2], split evenly between two intervals
/// let coarse = project_onto(&[0.0, 1.0, 2.0], &[4.0, 6.0], &[0.0, 2.0]);
/// assert!((coarse[0] - 10.0).abs() < 1e-12);
///
/// // refining preserves the sub-interval integrals
/// let fine = project_onto(&[0.0, 1.0, 2.0], &[4.0, 6.0], &[0.0, 0.5, 1.0, 1.5, 2.0]);
/// assert!((fine[0] - 2.0).abs() < 1e-12);
/// assert!((fine[3] - 3.0).abs() < 1e-12);
/// ```
pub fn project_onto(
    source_bounds: &[f64],
    source_integrals: &[f64],
    target_bounds: &[f64],
) -> Vec<f64> {
    assert!(
        source_bounds.len() >= 2,
        "Source partition needs at least two breakpoints, got {}",
        source_bounds.len()
    );
    assert!(
        target_bounds.len() >= 2,
        "Target partition needs at least two breakpoints, got {}",
        target_bounds.len()
    );
    assert_eq!(
        source_bounds.len(),
        source_integrals.len() + 1,
        "Breakpoint/value length mismatch: {} breakpoints vs {} intervals",
        source_bounds.len(),
        source_integrals.len()
    );

    // ====== Step 1: cumulative integral at source breakpoints ======

    let mut cumulative = Vec::with_capacity(source_bounds.len());
    let mut running = 0.0;
    cumulative.push(0.0);
    for &v in source_integrals {
        running += v;
        cumulative.push(running);
    }

    // ====== Step 2+3: evaluate at target breakpoints and difference ======

    let mut previous = interpolate_cumulative(source_bounds, &cumulative, target_bounds[0]);
    let mut projected = Vec::with_capacity(target_bounds.len() - 1);

    for &x in &target_bounds[1..] {
        let current = interpolate_cumulative(source_bounds, &cumulative, x);
        projected.push(current - previous);
        previous = current;
    }

    projected
}

/// Evaluate the piecewise-linear cumulative function at `x`.
///
/// Clamps to the boundary values outside the source range — the cumulative
/// integral of a compactly supported density is constant there.
fn interpolate_cumulative(bounds: &[f64], cumulative: &[f64], x: f64) -> f64 {
    let last = bounds.len() - 1;
    if x <= bounds[0] {
        return cumulative[0];
    }
    if x >= bounds[last] {
        return cumulative[last];
    }

    // binary search for the interval containing x
    let upper = match bounds.binary_search_by(|b| b.total_cmp(&x)) {
        Ok(exact) => return cumulative[exact],
        Err(insertion) => insertion,
    };
    let lower = upper - 1;

    let span = bounds[upper] - bounds[lower];
    let weight = (x - bounds[lower]) / span;
    cumulative[lower] + weight * (cumulative[upper] - cumulative[lower])
}

/// Check that a breakpoint list is strictly increasing.
pub fn strictly_increasing(bounds: &[f64]) -> bool {
    bounds.windows(2).all(|pair| pair[0] < pair[1])
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn total(values: &[f64]) -> f64 {
        values.iter().sum()
    }

    #[test]
    fn test_identity_projection() {
        let bounds = [0.0, 1.0, 2.5, 4.0];
        let values = [3.0, 1.5, 0.25];

        let projected = project_onto(&bounds, &values, &bounds);

        for (p, v) in projected.iter().zip(values.iter()) {
            assert!((p - v).abs() < 1e-14);
        }
    }

    #[test]
    fn test_total_is_preserved_on_refinement() {
        let source = [0.0, 2.0, 5.0, 10.0];
        let values = [4.0, 9.0, 2.0];
        let target: Vec<f64> = (0..=40).map(|i| i as f64 * 0.25).collect();

        let projected = project_onto(&source, &values, &target);

        assert!((total(&projected) - total(&values)).abs() < 1e-12);
    }

    #[test]
    fn test_total_is_preserved_on_coarsening() {
        let source: Vec<f64> = (0..=16).map(|i| i as f64).collect();
        let values: Vec<f64> = (0..16).map(|i| (i as f64).sin().abs() + 0.5).collect();
        let target = [0.0, 7.3, 16.0];

        let projected = project_onto(&source, &values, &target);

        assert!((total(&projected) - total(&values)).abs() < 1e-12);
    }

    #[test]
    fn test_shared_subrange_is_preserved() {
        // Breakpoint 5.0 is shared by both partitions, so the integral over
        // [0, 5] must agree exactly.
        let source = [0.0, 2.0, 5.0, 10.0];
        let values = [4.0, 9.0, 2.0];
        let target = [0.0, 1.0, 5.0, 6.0, 10.0];

        let projected = project_onto(&source, &values, &target);

        let left_source = values[0] + values[1];
        let left_target = projected[0] + projected[1];
        assert!((left_source - left_target).abs() < 1e-12);
    }

    #[test]
    fn test_target_wider_than_source() {
        // Mass must not be invented outside the source domain.
        let source = [1.0, 2.0];
        let values = [6.0];
        let target = [0.0, 1.5, 3.0];

        let projected = project_onto(&source, &values, &target);

        assert!((projected[0] - 3.0).abs() < 1e-12);
        assert!((projected[1] - 3.0).abs() < 1e-12);
        assert!((total(&projected) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_target_outside_source_is_zero() {
        let source = [0.0, 1.0];
        let values = [5.0];
        let target = [2.0, 3.0, 4.0];

        let projected = project_onto(&source, &values, &target);

        assert!(projected.iter().all(|v| v.abs() < 1e-14));
    }

    #[test]
    fn test_partial_overlap_takes_fraction() {
        // Target interval [0.5, 1.0] covers half of the only source interval.
        let source = [0.0, 1.0];
        let values = [8.0];
        let target = [0.5, 1.0];

        let projected = project_onto(&source, &values, &target);

        assert!((projected[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_strictly_increasing() {
        assert!(strictly_increasing(&[0.0, 1.0, 2.0]));
        assert!(!strictly_increasing(&[0.0, 1.0, 1.0]));
        assert!(!strictly_increasing(&[0.0, 2.0, 1.0]));
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn test_mismatched_lengths_panic() {
        project_onto(&[0.0, 1.0, 2.0], &[1.0], &[0.0, 1.0]);
    }
}
