//! Drug substance and systemic pharmacokinetic parameters
//!
//! [`SubstanceParameters`] describes the inhaled compound: region-specific
//! dissolution, permeability and partitioning ([`RegionParameters`] for the
//! conducting airways and the alveolar region separately) plus shared
//! physico-chemical properties. [`SystemicPkParameters`] describes the
//! two-compartment disposition model with optional first-order gut
//! absorption.
//!
//! Both are immutable per simulation run and shared by reference.
//!
//! # Units
//!
//! Amounts in µg, volumes in mL, concentrations in µg/mL, time in min.
//! The particle material density is therefore in µg/mL (≈ 1.2e6 for a
//! typical organic solid).

// =================================================================================================
// Region Parameters
// =================================================================================================

/// Substance parameters that differ between the airway and alveolar region.
#[derive(Debug, Clone, Copy)]
pub struct RegionParameters {
    /// Maximum dissolution rate `k_diss` \[µg/(cm·min)\]; the effective
    /// diffusion coefficient is `k_diss / solubility`
    pub max_dissolution_rate: f64,
    /// Solubility in lining fluid \[µg/mL\]
    pub solubility: f64,
    /// Epithelial permeability \[cm/min\]
    pub permeability: f64,
    /// Plasma:tissue partition coefficient (dimensionless)
    pub partition_coefficient: f64,
}

impl RegionParameters {
    fn validate(&self, region: &str) -> Result<(), String> {
        if self.max_dissolution_rate < 0.0 {
            return Err(format!(
                "{} maximum dissolution rate cannot be negative, got {}",
                region, self.max_dissolution_rate
            ));
        }
        if self.solubility < 0.0 {
            return Err(format!(
                "{} solubility cannot be negative, got {}",
                region, self.solubility
            ));
        }
        if self.permeability < 0.0 {
            return Err(format!(
                "{} permeability cannot be negative, got {}",
                region, self.permeability
            ));
        }
        if !(self.partition_coefficient > 0.0) {
            return Err(format!(
                "{} partition coefficient must be positive, got {}",
                region, self.partition_coefficient
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Substance Parameters
// =================================================================================================

/// Physico-chemical description of the inhaled compound.
#[derive(Debug, Clone)]
pub struct SubstanceParameters {
    /// Parameters in the conducting airways
    pub airway: RegionParameters,
    /// Parameters in the alveolar region
    pub alveolar: RegionParameters,
    /// Particle material density \[µg/mL\]
    pub density: f64,
    /// Molecular weight \[g/mol\] (carried for downstream consumers)
    pub molecular_weight: f64,
    /// Fraction unbound in plasma (carried for downstream consumers)
    pub fraction_unbound: f64,
    /// Blood:plasma concentration ratio
    pub blood_plasma_ratio: f64,
}

impl SubstanceParameters {
    /// Validate all parameters.
    pub fn validate(&self) -> Result<(), String> {
        self.airway.validate("Airway")?;
        self.alveolar.validate("Alveolar")?;

        if !(self.density > 0.0) {
            return Err(format!("Particle density must be positive, got {}", self.density));
        }
        if !(self.molecular_weight > 0.0) {
            return Err(format!(
                "Molecular weight must be positive, got {}",
                self.molecular_weight
            ));
        }
        if !(0.0..=1.0).contains(&self.fraction_unbound) {
            return Err(format!(
                "Fraction unbound must lie in [0, 1], got {}",
                self.fraction_unbound
            ));
        }
        if !(self.blood_plasma_ratio > 0.0) {
            return Err(format!(
                "Blood:plasma ratio must be positive, got {}",
                self.blood_plasma_ratio
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Systemic PK Parameters
// =================================================================================================

/// Two-compartment systemic disposition with optional gut absorption.
///
/// The micro rate constants are derived, not stored:
/// `k10 = Cl/V`, `k12 = Q/V`, `k21 = Q/Vp`.
#[derive(Debug, Clone, Copy)]
pub struct SystemicPkParameters {
    /// Plasma clearance `Cl` \[mL/min\]
    pub clearance: f64,
    /// Central volume of distribution `V` \[mL\]
    pub central_volume: f64,
    /// Inter-compartment clearance `Q` \[mL/min\]
    pub intercompartment_clearance: f64,
    /// Peripheral volume `Vp` \[mL\]
    pub peripheral_volume: f64,
    /// First-order gut absorption rate `k01` \[1/min\]; only relevant when a
    /// gut depot is seeded
    pub absorption_rate: f64,
    /// Oral bioavailability `F` applied on gut absorption
    pub bioavailability: f64,
}

impl SystemicPkParameters {
    /// Elimination rate constant `k10 = Cl / V` \[1/min\].
    pub fn k10(&self) -> f64 {
        self.clearance / self.central_volume
    }

    /// Central→peripheral rate constant `k12 = Q / V` \[1/min\].
    pub fn k12(&self) -> f64 {
        self.intercompartment_clearance / self.central_volume
    }

    /// Peripheral→central rate constant `k21 = Q / Vp` \[1/min\].
    pub fn k21(&self) -> f64 {
        self.intercompartment_clearance / self.peripheral_volume
    }

    /// Validate all parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.central_volume > 0.0) {
            return Err(format!(
                "Central volume must be positive, got {}",
                self.central_volume
            ));
        }
        if !(self.peripheral_volume > 0.0) {
            return Err(format!(
                "Peripheral volume must be positive, got {}",
                self.peripheral_volume
            ));
        }
        if self.clearance < 0.0 {
            return Err(format!("Clearance cannot be negative, got {}", self.clearance));
        }
        if self.intercompartment_clearance < 0.0 {
            return Err(format!(
                "Inter-compartment clearance cannot be negative, got {}",
                self.intercompartment_clearance
            ));
        }
        if self.absorption_rate < 0.0 {
            return Err(format!(
                "Absorption rate cannot be negative, got {}",
                self.absorption_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.bioavailability) {
            return Err(format!(
                "Bioavailability must lie in [0, 1], got {}",
                self.bioavailability
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================
