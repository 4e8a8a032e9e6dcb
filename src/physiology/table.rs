//! Physiological input table
//!
//! Raw physiology as supplied by the literature or a study protocol:
//! whole-body scalars (cardiac output, lung tissue weight), regional
//! fractions, lining-fluid data and the airway dimension lists. The derived
//! geometry lives in [`crate::physiology::geometry`]; this module only
//! stores and validates the inputs.
//!
//! Airway dimensions are given as *anchors*: the trachea, a short list of
//! measured proximal generations, and the terminal bronchiole. Generations
//! between the last measured bronchus and the terminal bronchiole are filled
//! in by log-linear interpolation when the geometry is built, which matches
//! the roughly geometric tapering of the bronchial tree.
//!
//! # Units
//!
//! Lengths in cm, volumes in mL, areas in cm², flows in mL/min, masses in g,
//! velocities in cm/min. Drug amounts elsewhere in the crate are in µg.

// =================================================================================================
// Physiology Table
// =================================================================================================

/// Physiological inputs for one subject.
///
/// Immutable per simulation run; shared by reference across runs.
#[derive(Debug, Clone)]
pub struct PhysiologyTable {
    /// Cardiac output \[mL/min\]
    pub cardiac_output: f64,

    /// Total lung tissue weight \[g\]
    pub lung_tissue_weight: f64,

    /// Tissue mass density \[g/mL\]
    pub tissue_density: f64,

    /// Fraction of lung tissue belonging to the alveolar region
    pub alveolar_tissue_fraction: f64,

    /// Fraction of cardiac output perfusing the bronchial (airway) tissue
    pub bronchial_blood_fraction: f64,

    /// Fraction of cardiac output perfusing the alveolar region
    pub alveolar_blood_fraction: f64,

    /// Total epithelial lining fluid volume of the conducting airways \[mL\]
    pub bronchial_elf_volume: f64,

    /// Epithelial lining fluid volume of the alveolar region \[mL\]
    pub alveolar_elf_volume: f64,

    /// Alveolar surface area \[cm²\]
    pub alveolar_surface_area: f64,

    /// Lining fluid height at the trachea \[cm\]
    pub elf_height_trachea: f64,

    /// Lining fluid height at the terminal bronchiole \[cm\]
    pub elf_height_terminal: f64,

    /// Mucus transport velocity at the trachea \[cm/min\]
    pub tracheal_mucus_velocity: f64,

    /// Number of conducting-airway generations (trachea = generation 1)
    pub generations: usize,

    /// Trachea length \[cm\]
    pub trachea_length: f64,

    /// Trachea diameter \[cm\]
    pub trachea_diameter: f64,

    /// Measured bronchus lengths for generations 2, 3, … \[cm\]
    pub bronchus_lengths: Vec<f64>,

    /// Measured bronchus diameters for generations 2, 3, … \[cm\]
    pub bronchus_diameters: Vec<f64>,

    /// Terminal bronchiole length \[cm\]
    pub terminal_length: f64,

    /// Terminal bronchiole diameter \[cm\]
    pub terminal_diameter: f64,
}

impl PhysiologyTable {
    /// Reference adult human table.
    ///
    /// Airway anchors follow the classical symmetric cast measurements
    /// (trachea and the first three bronchial generations); the remaining
    /// generations taper log-linearly down to the terminal bronchiole.
    pub fn human_adult() -> Self {
        Self {
            cardiac_output: 5600.0,
            lung_tissue_weight: 500.0,
            tissue_density: 1.0,
            alveolar_tissue_fraction: 0.8,
            bronchial_blood_fraction: 0.01,
            alveolar_blood_fraction: 1.0,
            bronchial_elf_volume: 4.0,
            alveolar_elf_volume: 17.0,
            alveolar_surface_area: 1.4e6,
            elf_height_trachea: 1.0e-3,
            elf_height_terminal: 1.8e-4,
            tracheal_mucus_velocity: 0.55,
            generations: 24,
            trachea_length: 12.0,
            trachea_diameter: 1.8,
            bronchus_lengths: vec![4.76, 1.90, 0.76],
            bronchus_diameters: vec![1.22, 0.83, 0.56],
            terminal_length: 0.10,
            terminal_diameter: 0.05,
        }
    }

    /// Validate internal consistency.
    ///
    /// Detects the configuration errors that would otherwise surface deep in
    /// grid construction: mismatched anchor lists, a bronchus list longer
    /// than the tree, non-positive dimensions, fractions outside \[0, 1\].
    pub fn validate(&self) -> Result<(), String> {
        if self.bronchus_lengths.len() != self.bronchus_diameters.len() {
            return Err(format!(
                "Bronchus length/diameter lists differ in length: {} vs {}",
                self.bronchus_lengths.len(),
                self.bronchus_diameters.len()
            ));
        }
        if self.generations == 0 {
            return Err("Airway tree needs at least one generation".to_string());
        }
        if self.generations > 48 {
            return Err(format!(
                "Airway tree with {} generations is beyond any physiological lung",
                self.generations
            ));
        }
        if self.generations >= 2 && self.bronchus_lengths.len() > self.generations - 2 {
            return Err(format!(
                "Bronchus anchor list covers {} generations but only {} fit between \
                 trachea and terminal bronchiole",
                self.bronchus_lengths.len(),
                self.generations - 2
            ));
        }

        let positive_scalars = [
            ("cardiac output", self.cardiac_output),
            ("lung tissue weight", self.lung_tissue_weight),
            ("tissue density", self.tissue_density),
            ("bronchial ELF volume", self.bronchial_elf_volume),
            ("alveolar ELF volume", self.alveolar_elf_volume),
            ("alveolar surface area", self.alveolar_surface_area),
            ("tracheal ELF height", self.elf_height_trachea),
            ("terminal ELF height", self.elf_height_terminal),
            ("trachea length", self.trachea_length),
            ("trachea diameter", self.trachea_diameter),
            ("terminal length", self.terminal_length),
            ("terminal diameter", self.terminal_diameter),
        ];
        for (name, value) in positive_scalars {
            if !(value > 0.0) {
                return Err(format!("Physiology value '{}' must be positive, got {}", name, value));
            }
        }

        if self.tracheal_mucus_velocity < 0.0 {
            return Err(format!(
                "Tracheal mucus velocity cannot be negative, got {}",
                self.tracheal_mucus_velocity
            ));
        }

        let fractions = [
            ("alveolar tissue fraction", self.alveolar_tissue_fraction),
            ("bronchial blood fraction", self.bronchial_blood_fraction),
            ("alveolar blood fraction", self.alveolar_blood_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("'{}' must lie in [0, 1], got {}", name, value));
            }
        }

        for (i, (&l, &d)) in self
            .bronchus_lengths
            .iter()
            .zip(self.bronchus_diameters.iter())
            .enumerate()
        {
            if !(l > 0.0) || !(d > 0.0) {
                return Err(format!(
                    "Bronchus anchor for generation {} has non-positive dimensions ({}, {})",
                    i + 2,
                    l,
                    d
                ));
            }
        }

        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_adult_is_valid() {
        assert!(PhysiologyTable::human_adult().validate().is_ok());
    }

    #[test]
    fn test_mismatched_anchor_lists_rejected() {
        let mut table = PhysiologyTable::human_adult();
        table.bronchus_lengths.push(0.5);

        let result = table.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("differ in length"));
    }

    #[test]
    fn test_too_many_anchors_rejected() {
        let mut table = PhysiologyTable::human_adult();
        table.generations = 4;

        let result = table.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("anchor list"));
    }

    #[test]
    fn test_negative_scalar_rejected() {
        let mut table = PhysiologyTable::human_adult();
        table.bronchial_elf_volume = -1.0;

        assert!(table.validate().is_err());
    }

    #[test]
    fn test_fraction_out_of_range_rejected() {
        let mut table = PhysiologyTable::human_adult();
        table.alveolar_tissue_fraction = 1.4;

        let result = table.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("[0, 1]"));
    }
}
