//! Mucociliary transport velocity field
//!
//! Ciliated epithelium moves the mucus layer — and with it any undissolved
//! particles — from the deep airways toward the trachea exit at `x = 0`,
//! where cleared material leaves the simulated system.
//!
//! The transport speed is anchored at the midpoint of every airway
//! generation. Measurements only exist for the trachea, so the other
//! generations are derived from the empirical power law
//!
//! ```text
//! v(g) = v_trachea · (d_g / d_trachea)^2.808
//! ```
//!
//! which reproduces the steep slowdown of mucus transport in the narrow
//! distal airways. Between midpoints the speed is interpolated linearly;
//! beyond the first/last midpoint it is held constant, so `velocity(0.0)`
//! returns the tracheal speed used for the clearance flux out of the grid.

use crate::physiology::LungGeometry;

/// Exponent of the diameter power law for mucus velocity.
pub const DIAMETER_EXPONENT: f64 = 2.808;

// =================================================================================================
// Mucociliary Transport
// =================================================================================================

/// Piecewise-linear transport-speed field along the airway axis.
///
/// Speeds are magnitudes \[cm/min\]; the direction is always toward the
/// trachea exit (decreasing `x`).
#[derive(Debug, Clone)]
pub struct MucociliaryTransport {
    midpoints: Vec<f64>,
    speeds: Vec<f64>,
}

impl MucociliaryTransport {
    /// Derive the velocity field from the airway geometry.
    ///
    /// Uses the geometry's (scaled) tracheal mucus velocity as the power-law
    /// anchor. A zero tracheal velocity disables clearance entirely.
    pub fn from_geometry(geometry: &LungGeometry) -> Self {
        let tracheal = geometry.tracheal_mucus_velocity();
        let segments = geometry.segments();
        let reference_diameter = segments
            .first()
            .map_or(1.0, |trachea| trachea.diameter);

        let midpoints = segments.iter().map(|s| s.x_mid).collect();
        let speeds = segments
            .iter()
            .map(|s| tracheal * (s.diameter / reference_diameter).powf(DIAMETER_EXPONENT))
            .collect();

        Self { midpoints, speeds }
    }

    /// Transport speed at axial position `x` \[cm/min\], non-negative.
    ///
    /// Linear interpolation between generation midpoints, clamped to the
    /// nearest midpoint value outside their range.
    pub fn velocity(&self, x: f64) -> f64 {
        let n = self.midpoints.len();
        if n == 0 {
            return 0.0;
        }
        if x <= self.midpoints[0] {
            return self.speeds[0];
        }
        if x >= self.midpoints[n - 1] {
            return self.speeds[n - 1];
        }

        let upper = match self.midpoints.binary_search_by(|m| m.total_cmp(&x)) {
            Ok(exact) => return self.speeds[exact],
            Err(insertion) => insertion,
        };
        let lower = upper - 1;

        let w = (x - self.midpoints[lower]) / (self.midpoints[upper] - self.midpoints[lower]);
        let speed = self.speeds[lower] + w * (self.speeds[upper] - self.speeds[lower]);
        speed.max(0.0)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physiology::{PhysiologyTable, ScalingFactors};

    fn human() -> LungGeometry {
        LungGeometry::from_table(&PhysiologyTable::human_adult(), ScalingFactors::default())
            .unwrap()
    }

    #[test]
    fn test_tracheal_speed_at_exit() {
        let geometry = human();
        let transport = MucociliaryTransport::from_geometry(&geometry);

        // x = 0 lies before the first midpoint, so the tracheal speed applies
        let at_exit = transport.velocity(0.0);
        assert!((at_exit - geometry.tracheal_mucus_velocity()).abs() < 1e-12);
    }

    #[test]
    fn test_power_law_at_midpoints() {
        let geometry = human();
        let transport = MucociliaryTransport::from_geometry(&geometry);

        let trachea = &geometry.segments()[0];
        let distal = &geometry.segments()[10];
        let expected = geometry.tracheal_mucus_velocity()
            * (distal.diameter / trachea.diameter).powf(DIAMETER_EXPONENT);

        assert!((transport.velocity(distal.x_mid) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_speed_decreases_down_the_tree() {
        let geometry = human();
        let transport = MucociliaryTransport::from_geometry(&geometry);

        let mut previous = f64::INFINITY;
        for segment in geometry.segments() {
            let speed = transport.velocity(segment.x_mid);
            assert!(speed >= 0.0);
            assert!(speed < previous);
            previous = speed;
        }
    }

    #[test]
    fn test_clamped_beyond_last_midpoint() {
        let geometry = human();
        let transport = MucociliaryTransport::from_geometry(&geometry);

        let last = geometry.segments().last().unwrap();
        let at_mid = transport.velocity(last.x_mid);
        let beyond = transport.velocity(geometry.total_length() + 5.0);
        assert!((at_mid - beyond).abs() < 1e-15);
    }

    #[test]
    fn test_interpolation_between_midpoints() {
        let geometry = human();
        let transport = MucociliaryTransport::from_geometry(&geometry);

        let a = &geometry.segments()[2];
        let b = &geometry.segments()[3];
        let x = 0.5 * (a.x_mid + b.x_mid);

        let va = transport.velocity(a.x_mid);
        let vb = transport.velocity(b.x_mid);
        let expected = 0.5 * (va + vb);

        assert!((transport.velocity(x) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_tracheal_velocity_disables_clearance() {
        let mut table = PhysiologyTable::human_adult();
        table.tracheal_mucus_velocity = 0.0;
        let geometry = LungGeometry::from_table(&table, ScalingFactors::default()).unwrap();
        let transport = MucociliaryTransport::from_geometry(&geometry);

        assert_eq!(transport.velocity(0.0), 0.0);
        assert_eq!(transport.velocity(geometry.total_length() / 2.0), 0.0);
    }
}
