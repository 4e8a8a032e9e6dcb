//! Saturable dissolution kinetics
//!
//! Particles shrink according to a Noyes–Whitney law: the volume loss rate of
//! a particle of volume `s` surrounded by lining fluid at dissolved
//! concentration `C` is
//!
//! ```text
//! ds/dt = -K · (Cs - C) · s^(1/3)
//! ```
//!
//! with the rate coefficient derived from the region's maximum dissolution
//! rate, solubility and the particle material density:
//!
//! ```text
//! K = 4π · D / (ρ · (4π/3)^(1/3)),     D = k_diss / Cs
//! ```
//!
//! The `s^(1/3)` factor is the particle radius up to a constant — the loss
//! rate scales with the diffusion-layer surface term of a sphere. As the
//! local concentration approaches the solubility limit `Cs` the rate goes to
//! zero (saturation); above `Cs` it becomes negative. The rate is returned
//! unclamped; callers clip to non-negative where the physics requires it
//! (re-precipitation is not modeled).

use crate::substance::RegionParameters;

// =================================================================================================
// Dissolution Kinetics
// =================================================================================================

/// Evaluates the saturable dissolution rate for one region.
///
/// Airway and alveolar regions use separate instances of the same law,
/// parameterized by their respective [`RegionParameters`].
#[derive(Debug, Clone, Copy)]
pub struct DissolutionKinetics {
    coefficient: f64,
    solubility: f64,
}

impl DissolutionKinetics {
    /// Build the kinetic law from region parameters and material density
    /// \[µg/mL\].
    ///
    /// A zero maximum dissolution rate or zero solubility yields a law that
    /// always returns zero (insoluble compound).
    pub fn new(region: &RegionParameters, density: f64) -> Self {
        assert!(density > 0.0, "Particle density must be positive, got {}", density);

        let coefficient = if region.solubility > 0.0 {
            let diffusion = region.max_dissolution_rate / region.solubility;
            let shape = (4.0 * std::f64::consts::PI / 3.0).powf(1.0 / 3.0);
            4.0 * std::f64::consts::PI * diffusion / (density * shape)
        } else {
            0.0
        };

        Self {
            coefficient,
            solubility: region.solubility,
        }
    }

    /// Volume loss rate \[cm³/min\] of a particle of volume `size` \[cm³\]
    /// in fluid at dissolved concentration `concentration` \[µg/mL\].
    ///
    /// Negative when the fluid is supersaturated; not clamped here.
    pub fn rate(&self, size: f64, concentration: f64) -> f64 {
        self.coefficient * (self.solubility - concentration) * size.cbrt()
    }

    /// Solubility limit `Cs` \[µg/mL\].
    pub fn solubility(&self) -> f64 {
        self.solubility
    }
}

// =================================================================================================
// Tests
// =================================================================================================
