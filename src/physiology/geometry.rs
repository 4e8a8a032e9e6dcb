//! Derived airway geometry
//!
//! Turns a [`PhysiologyTable`] into the segmented airway tree the solver
//! works with: one [`AirwaySegment`] per generation carrying axial position,
//! cross-sectional data, lining-fluid volume, tissue volume and regional
//! blood flow, plus the lumped [`AlveolarRegion`].
//!
//! # Derivations
//!
//! - Branch count doubles per generation: generation `g` has `2^(g-1)`
//!   parallel branches.
//! - Cross-sectional area = π·(d/2)²·branches, segment volume = area·length.
//! - Lining-fluid volume per segment = π·d·h·branches·length, with the ELF
//!   height `h` interpolated linearly in generation index between the
//!   measured trachea and terminal-bronchiole values. The raw volumes are
//!   then rescaled uniformly so their sum equals the supplied total
//!   bronchial ELF volume (conservation at import time).
//! - Tissue volume is allocated to each segment proportionally to its share
//!   of total lining-fluid volume. This allocation is a modeling convention
//!   carried over from the underlying physiological model; changing it
//!   changes simulated outputs.
//! - Bronchial blood flow is allocated proportionally to tissue volume.
//!
//! Generations between the last measured bronchus anchor and the terminal
//! bronchiole get their length and diameter by log-linear interpolation in
//! generation index.
//!
//! All reads go through multiplicative [`ScalingFactors`], applied at read
//! time only — the stored base values are never mutated, so the same
//! geometry can be shared across sensitivity-analysis runs.

use std::f64::consts::PI;

use crate::physiology::PhysiologyTable;

// =================================================================================================
// Scaling Factors
// =================================================================================================

/// Multiplicative adjustment factors for sensitivity and identifiability
/// analysis.
///
/// Applied when geometry quantities are read, never to the stored values.
/// A factor of 1.0 (the default) leaves the quantity untouched.
#[derive(Debug, Clone, Copy)]
pub struct ScalingFactors {
    /// Scales every lining-fluid volume (airway and alveolar)
    pub elf_volume: f64,
    /// Scales every tissue volume
    pub tissue_volume: f64,
    /// Scales every regional blood flow
    pub blood_flow: f64,
    /// Scales every exchange surface area
    pub surface_area: f64,
    /// Scales the mucociliary transport velocity
    pub mucociliary_velocity: f64,
}

impl Default for ScalingFactors {
    fn default() -> Self {
        Self {
            elf_volume: 1.0,
            tissue_volume: 1.0,
            blood_flow: 1.0,
            surface_area: 1.0,
            mucociliary_velocity: 1.0,
        }
    }
}

impl ScalingFactors {
    /// Validate that no factor is negative.
    pub fn validate(&self) -> Result<(), String> {
        let factors = [
            ("elf_volume", self.elf_volume),
            ("tissue_volume", self.tissue_volume),
            ("blood_flow", self.blood_flow),
            ("surface_area", self.surface_area),
            ("mucociliary_velocity", self.mucociliary_velocity),
        ];
        for (name, value) in factors {
            if value < 0.0 {
                return Err(format!("Scaling factor '{}' cannot be negative, got {}", name, value));
            }
        }
        Ok(())
    }
}

// =================================================================================================
// Airway Segment
// =================================================================================================

/// Structural classification of an airway generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Generation 1
    Trachea,
    /// Conducting generation `g` (2 ≤ g < last)
    Bronchus(usize),
    /// Last conducting generation
    TerminalBronchiole,
}

/// One generation of the conducting airway tree.
///
/// Stores *base* (unscaled) physiological quantities; scaled reads go
/// through the [`LungGeometry`] accessors.
#[derive(Debug, Clone)]
pub struct AirwaySegment {
    /// Generation index, 1-based (trachea = 1)
    pub generation: usize,
    /// Structural classification
    pub kind: SegmentKind,
    /// Length of one branch \[cm\]
    pub length: f64,
    /// Diameter of one branch \[cm\]
    pub diameter: f64,
    /// Number of parallel branches, `2^(generation - 1)`
    pub branch_count: u64,
    /// Axial position of the proximal end \[cm\]
    pub x_start: f64,
    /// Axial midpoint \[cm\]
    pub x_mid: f64,
    /// Axial position of the distal end \[cm\]
    pub x_end: f64,
    /// Lining-fluid volume, all branches \[mL\] (base value)
    pub elf_volume: f64,
    /// Tissue volume \[mL\] (base value)
    pub tissue_volume: f64,
    /// Regional blood flow \[mL/min\] (base value)
    pub blood_flow: f64,
    /// Epithelial surface area, all branches \[cm²\] (base value)
    pub surface_area: f64,
}

impl AirwaySegment {
    /// Total cross-sectional airway area of this generation \[cm²\].
    pub fn cross_section_area(&self) -> f64 {
        PI * (self.diameter / 2.0).powi(2) * self.branch_count as f64
    }

    /// Total airway lumen volume of this generation \[mL\].
    pub fn volume(&self) -> f64 {
        self.cross_section_area() * self.length
    }
}

// =================================================================================================
// Alveolar Region
// =================================================================================================

/// Lumped alveolar region (no axial resolution).
#[derive(Debug, Clone, Copy)]
pub struct AlveolarRegion {
    /// Lining-fluid volume \[mL\]
    pub elf_volume: f64,
    /// Tissue volume \[mL\]
    pub tissue_volume: f64,
    /// Exchange surface area \[cm²\]
    pub surface_area: f64,
    /// Regional blood flow \[mL/min\]
    pub blood_flow: f64,
}

// =================================================================================================
// Lung Geometry
// =================================================================================================

/// Segmented airway tree plus the lumped alveolar region.
///
/// Built once from a [`PhysiologyTable`]; immutable afterwards and safe to
/// share by reference across simulation runs. Segments are ordered by
/// increasing axial position, with `x = 0` at the trachea exit.
#[derive(Debug, Clone)]
pub struct LungGeometry {
    segments: Vec<AirwaySegment>,
    alveolar: AlveolarRegion,
    tracheal_mucus_velocity: f64,
    scaling: ScalingFactors,
}

impl LungGeometry {
    /// Derive the geometry from a physiology table.
    ///
    /// # Errors
    ///
    /// Propagates validation failures of the table or the scaling factors
    /// (configuration errors, detected before any simulation state exists).
    pub fn from_table(
        table: &PhysiologyTable,
        scaling: ScalingFactors,
    ) -> Result<Self, String> {
        table.validate()?;
        scaling.validate()?;

        let n = table.generations;

        // ====== Per-generation lengths and diameters ======

        let mut lengths = vec![0.0_f64; n];
        let mut diameters = vec![0.0_f64; n];
        lengths[0] = table.trachea_length;
        diameters[0] = table.trachea_diameter;

        let anchors = table.bronchus_lengths.len();
        for (k, (&l, &d)) in table
            .bronchus_lengths
            .iter()
            .zip(table.bronchus_diameters.iter())
            .enumerate()
        {
            lengths[k + 1] = l;
            diameters[k + 1] = d;
        }

        if n >= 2 {
            lengths[n - 1] = table.terminal_length;
            diameters[n - 1] = table.terminal_diameter;

            // log-linear taper from the last anchor down to the terminal
            // bronchiole
            let first = anchors; // 0-based index of last filled proximal generation
            let span = (n - 1 - first) as f64;
            if span > 1.0 {
                let (l0, d0) = (lengths[first].ln(), diameters[first].ln());
                let (l1, d1) = (table.terminal_length.ln(), table.terminal_diameter.ln());
                for g in (first + 1)..(n - 1) {
                    let w = (g - first) as f64 / span;
                    lengths[g] = (l0 + w * (l1 - l0)).exp();
                    diameters[g] = (d0 + w * (d1 - d0)).exp();
                }
            }
        }

        // ====== Axial layout and raw lining-fluid volumes ======

        let mut segments = Vec::with_capacity(n);
        let mut x = 0.0;
        let mut elf_raw_total = 0.0;

        for g in 0..n {
            let generation = g + 1;
            let kind = if generation == 1 {
                SegmentKind::Trachea
            } else if generation == n {
                SegmentKind::TerminalBronchiole
            } else {
                SegmentKind::Bronchus(generation)
            };

            let branch_count = 1u64 << (generation - 1);
            let length = lengths[g];
            let diameter = diameters[g];

            let elf_height = if n > 1 {
                let w = g as f64 / (n - 1) as f64;
                table.elf_height_trachea
                    + w * (table.elf_height_terminal - table.elf_height_trachea)
            } else {
                table.elf_height_trachea
            };

            let surface_area = PI * diameter * branch_count as f64 * length;
            let elf_volume = surface_area * elf_height;
            elf_raw_total += elf_volume;

            segments.push(AirwaySegment {
                generation,
                kind,
                length,
                diameter,
                branch_count,
                x_start: x,
                x_mid: x + 0.5 * length,
                x_end: x + length,
                elf_volume,
                tissue_volume: 0.0,
                blood_flow: 0.0,
                surface_area,
            });
            x += length;
        }

        if elf_raw_total <= 0.0 {
            return Err("Derived airway lining-fluid volume is zero".to_string());
        }

        // ====== Conservation at import time ======
        //
        // Rescale the height-derived ELF volumes so they sum to the supplied
        // bronchial total, then allocate tissue proportionally to each
        // segment's ELF share and blood flow proportionally to tissue.

        let elf_scale = table.bronchial_elf_volume / elf_raw_total;
        let bronchial_tissue =
            table.lung_tissue_weight * (1.0 - table.alveolar_tissue_fraction)
                / table.tissue_density;
        let bronchial_flow = table.cardiac_output * table.bronchial_blood_fraction;

        for segment in &mut segments {
            segment.elf_volume *= elf_scale;
            let share = segment.elf_volume / table.bronchial_elf_volume;
            segment.tissue_volume = bronchial_tissue * share;
            segment.blood_flow = bronchial_flow * share;
        }

        let alveolar = AlveolarRegion {
            elf_volume: table.alveolar_elf_volume,
            tissue_volume: table.lung_tissue_weight * table.alveolar_tissue_fraction
                / table.tissue_density,
            surface_area: table.alveolar_surface_area,
            blood_flow: table.cardiac_output * table.alveolar_blood_fraction,
        };

        Ok(Self {
            segments,
            alveolar,
            tracheal_mucus_velocity: table.tracheal_mucus_velocity,
            scaling,
        })
    }

    // ====== Structure (unscaled) ======

    /// The airway segments in axial order (base values).
    pub fn segments(&self) -> &[AirwaySegment] {
        &self.segments
    }

    /// Number of conducting generations.
    pub fn generations(&self) -> usize {
        self.segments.len()
    }

    /// Total axial length of the airway tree \[cm\].
    pub fn total_length(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.x_end)
    }

    /// The scaling factors in effect for this geometry.
    pub fn scaling(&self) -> &ScalingFactors {
        &self.scaling
    }

    // ====== Scaled reads ======

    /// Per-segment lining-fluid volumes with scaling applied \[mL\].
    pub fn elf_volumes(&self) -> Vec<f64> {
        self.segments
            .iter()
            .map(|s| s.elf_volume * self.scaling.elf_volume)
            .collect()
    }

    /// Per-segment tissue volumes with scaling applied \[mL\].
    pub fn tissue_volumes(&self) -> Vec<f64> {
        self.segments
            .iter()
            .map(|s| s.tissue_volume * self.scaling.tissue_volume)
            .collect()
    }

    /// Per-segment blood flows with scaling applied \[mL/min\].
    pub fn blood_flows(&self) -> Vec<f64> {
        self.segments
            .iter()
            .map(|s| s.blood_flow * self.scaling.blood_flow)
            .collect()
    }

    /// Per-segment epithelial surface areas with scaling applied \[cm²\].
    pub fn surface_areas(&self) -> Vec<f64> {
        self.segments
            .iter()
            .map(|s| s.surface_area * self.scaling.surface_area)
            .collect()
    }

    /// Alveolar region with scaling applied.
    pub fn alveolar(&self) -> AlveolarRegion {
        AlveolarRegion {
            elf_volume: self.alveolar.elf_volume * self.scaling.elf_volume,
            tissue_volume: self.alveolar.tissue_volume * self.scaling.tissue_volume,
            surface_area: self.alveolar.surface_area * self.scaling.surface_area,
            blood_flow: self.alveolar.blood_flow * self.scaling.blood_flow,
        }
    }

    /// Tracheal mucus velocity with scaling applied \[cm/min\].
    pub fn tracheal_mucus_velocity(&self) -> f64 {
        self.tracheal_mucus_velocity * self.scaling.mucociliary_velocity
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn human() -> LungGeometry {
        LungGeometry::from_table(&PhysiologyTable::human_adult(), ScalingFactors::default())
            .unwrap()
    }

    #[test]
    fn test_segment_ordering_and_positions() {
        let geometry = human();
        let segments = geometry.segments();

        assert_eq!(segments.len(), 24);
        assert_eq!(segments[0].kind, SegmentKind::Trachea);
        assert_eq!(segments[23].kind, SegmentKind::TerminalBronchiole);
        assert!((segments[0].x_start - 0.0).abs() < 1e-12);

        for pair in segments.windows(2) {
            assert!((pair[0].x_end - pair[1].x_start).abs() < 1e-12);
            assert!(pair[0].x_mid < pair[1].x_mid);
        }
    }

    #[test]
    fn test_derived_cross_section_and_volume() {
        let geometry = human();
        let trachea = &geometry.segments()[0];

        let expected_area = std::f64::consts::PI * (trachea.diameter / 2.0).powi(2);
        assert!((trachea.cross_section_area() - expected_area).abs() < 1e-12);
        assert!((trachea.volume() - expected_area * trachea.length).abs() < 1e-12);

        // total cross-section explodes distally despite narrowing branches
        let distal = &geometry.segments()[20];
        assert!(distal.cross_section_area() > trachea.cross_section_area());
    }

    #[test]
    fn test_branch_count_doubles() {
        let geometry = human();
        for segment in geometry.segments() {
            assert_eq!(segment.branch_count, 1u64 << (segment.generation - 1));
        }
    }

    #[test]
    fn test_diameters_taper_monotonically() {
        let geometry = human();
        for pair in geometry.segments().windows(2) {
            assert!(pair[1].diameter < pair[0].diameter);
        }
    }

    #[test]
    fn test_elf_volume_conserved_at_import() {
        let table = PhysiologyTable::human_adult();
        let geometry =
            LungGeometry::from_table(&table, ScalingFactors::default()).unwrap();

        let total: f64 = geometry.elf_volumes().iter().sum();
        assert!((total - table.bronchial_elf_volume).abs() < 1e-10);
    }

    #[test]
    fn test_tissue_volume_conserved_at_import() {
        let table = PhysiologyTable::human_adult();
        let geometry =
            LungGeometry::from_table(&table, ScalingFactors::default()).unwrap();

        let expected = table.lung_tissue_weight * (1.0 - table.alveolar_tissue_fraction)
            / table.tissue_density;
        let total: f64 = geometry.tissue_volumes().iter().sum();
        assert!((total - expected).abs() < 1e-9);

        let alveolar = geometry.alveolar();
        let expected_alv =
            table.lung_tissue_weight * table.alveolar_tissue_fraction / table.tissue_density;
        assert!((alveolar.tissue_volume - expected_alv).abs() < 1e-9);
    }

    #[test]
    fn test_blood_flow_split() {
        let table = PhysiologyTable::human_adult();
        let geometry =
            LungGeometry::from_table(&table, ScalingFactors::default()).unwrap();

        let bronchial: f64 = geometry.blood_flows().iter().sum();
        assert!(
            (bronchial - table.cardiac_output * table.bronchial_blood_fraction).abs() < 1e-9
        );
        assert!(
            (geometry.alveolar().blood_flow
                - table.cardiac_output * table.alveolar_blood_fraction)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_scaling_applied_at_read_only() {
        let table = PhysiologyTable::human_adult();
        let scaling = ScalingFactors {
            elf_volume: 2.0,
            ..ScalingFactors::default()
        };
        let scaled = LungGeometry::from_table(&table, scaling).unwrap();
        let base = LungGeometry::from_table(&table, ScalingFactors::default()).unwrap();

        // stored base values identical, read values doubled
        assert!(
            (scaled.segments()[0].elf_volume - base.segments()[0].elf_volume).abs() < 1e-12
        );
        assert!(
            (scaled.elf_volumes()[0] - 2.0 * base.elf_volumes()[0]).abs() < 1e-12
        );
        assert!(
            (scaled.alveolar().elf_volume - 2.0 * base.alveolar().elf_volume).abs() < 1e-9
        );
    }

    #[test]
    fn test_single_segment_tree() {
        let mut table = PhysiologyTable::human_adult();
        table.generations = 1;
        table.bronchus_lengths.clear();
        table.bronchus_diameters.clear();

        let geometry =
            LungGeometry::from_table(&table, ScalingFactors::default()).unwrap();

        assert_eq!(geometry.generations(), 1);
        assert_eq!(geometry.segments()[0].kind, SegmentKind::Trachea);
        assert!((geometry.total_length() - table.trachea_length).abs() < 1e-12);
        let total: f64 = geometry.elf_volumes().iter().sum();
        assert!((total - table.bronchial_elf_volume).abs() < 1e-10);
    }

    #[test]
    fn test_negative_scaling_rejected() {
        let scaling = ScalingFactors {
            blood_flow: -0.5,
            ..ScalingFactors::default()
        };
        let result = LungGeometry::from_table(&PhysiologyTable::human_adult(), scaling);
        assert!(result.is_err());
    }
}
