//! Deposition table parsing and derived deposition data
//!
//! A deposition table describes where the inhaled dose lands: a header block
//! (total dose, particle-diameter convention) followed by one row per
//! (diameter, generation) pair with the deposited dose fraction. Everything
//! at a generation beyond the conducting tree counts as alveolar; whatever
//! fraction of the dose is not listed was lost in the throat.
//!
//! # Text format
//!
//! ```text
//! # comment lines start with '#'
//! dose = 100.0
//! diameter = aerodynamic
//! 1.0   5   0.30
//! 2.5   5   0.25
//! 1.0  25   0.20
//! ```
//!
//! Data rows are whitespace-separated: diameter \[µm\], generation
//! (1-based), deposited fraction of the total dose.
//!
//! Aerodynamic diameters are converted to geometric ones with the usual
//! `d_geo = d_ae · sqrt(ρ_water / ρ)` relation before particle volumes are
//! derived.

use crate::deposition::SYNTHETIC_SIZE_HALF_WIDTH;

/// Density of water in the crate's mass units \[µg/mL\], the reference for
/// the aerodynamic-diameter convention.
pub const WATER_DENSITY: f64 = 1.0e6;

// =================================================================================================
// Deposition Table (parsed input)
// =================================================================================================

/// Particle-diameter convention of a deposition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiameterConvention {
    /// Diameters are aerodynamic (density-equivalent)
    Aerodynamic,
    /// Diameters are geometric (physical)
    Geometric,
}

/// One parsed table row.
#[derive(Debug, Clone, Copy)]
pub struct DepositionRow {
    /// Particle diameter \[µm\], in the table's convention
    pub diameter: f64,
    /// Airway generation (1-based); beyond the conducting tree = alveolar
    pub generation: usize,
    /// Fraction of the total dose deposited here
    pub fraction: f64,
}

/// Raw deposition table as parsed from text.
#[derive(Debug, Clone)]
pub struct DepositionTable {
    /// Total inhaled dose \[µg\]
    pub total_dose: f64,
    /// Diameter convention of the rows
    pub convention: DiameterConvention,
    /// Deposition rows
    pub rows: Vec<DepositionRow>,
}

impl DepositionTable {
    /// Parse a deposition table from its text representation.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error for unknown header keys, malformed rows,
    /// negative values or fractions summing above one.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut total_dose: Option<f64> = None;
        let mut convention: Option<DiameterConvention> = None;
        let mut rows = Vec::new();

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "dose" => {
                        let dose: f64 = value.trim().parse().map_err(|_| {
                            format!("Line {}: cannot parse dose '{}'", number + 1, value.trim())
                        })?;
                        total_dose = Some(dose);
                    }
                    "diameter" => {
                        convention = Some(match value.trim() {
                            "aerodynamic" => DiameterConvention::Aerodynamic,
                            "geometric" => DiameterConvention::Geometric,
                            other => {
                                return Err(format!(
                                    "Line {}: unknown diameter convention '{}'",
                                    number + 1,
                                    other
                                ))
                            }
                        });
                    }
                    other => {
                        return Err(format!("Line {}: unknown header key '{}'", number + 1, other))
                    }
                }
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(format!(
                    "Line {}: expected 'diameter generation fraction', got '{}'",
                    number + 1,
                    line
                ));
            }
            let diameter: f64 = fields[0]
                .parse()
                .map_err(|_| format!("Line {}: bad diameter '{}'", number + 1, fields[0]))?;
            let generation: usize = fields[1]
                .parse()
                .map_err(|_| format!("Line {}: bad generation '{}'", number + 1, fields[1]))?;
            let fraction: f64 = fields[2]
                .parse()
                .map_err(|_| format!("Line {}: bad fraction '{}'", number + 1, fields[2]))?;

            rows.push(DepositionRow {
                diameter,
                generation,
                fraction,
            });
        }

        let table = Self {
            total_dose: total_dose.ok_or("Deposition table is missing the 'dose' header")?,
            convention: convention
                .ok_or("Deposition table is missing the 'diameter' header")?,
            rows,
        };
        table.validate()?;
        Ok(table)
    }

    /// Validate ranges and the fraction sum.
    pub fn validate(&self) -> Result<(), String> {
        if self.total_dose < 0.0 {
            return Err(format!("Total dose cannot be negative, got {}", self.total_dose));
        }
        let mut fraction_sum = 0.0;
        for row in &self.rows {
            if !(row.diameter > 0.0) {
                return Err(format!("Particle diameter must be positive, got {}", row.diameter));
            }
            if row.generation == 0 {
                return Err("Airway generations are 1-based; got generation 0".to_string());
            }
            if !(0.0..=1.0).contains(&row.fraction) {
                return Err(format!(
                    "Deposited fraction must lie in [0, 1], got {}",
                    row.fraction
                ));
            }
            fraction_sum += row.fraction;
        }
        if fraction_sum > 1.0 + 1e-9 {
            return Err(format!(
                "Deposited fractions sum to {}, which exceeds the inhaled dose",
                fraction_sum
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Deposition Data (derived, immutable)
// =================================================================================================

/// One deposited mass packet in the conducting airways.
#[derive(Debug, Clone, Copy)]
pub struct AirwayDeposit {
    /// Generation the mass landed in (1-based)
    pub generation: usize,
    /// Geometric particle volume \[cm³\]
    pub particle_volume: f64,
    /// Deposited amount \[µg\]
    pub amount: f64,
}

/// One deposited mass packet in the alveolar region.
#[derive(Debug, Clone, Copy)]
pub struct AlveolarDeposit {
    /// Geometric particle volume \[cm³\]
    pub particle_volume: f64,
    /// Deposited amount \[µg\]
    pub amount: f64,
}

/// Deposition converted to amounts and particle volumes.
///
/// Parsed once, immutable afterwards. The generation index separating airway
/// from alveolar rows comes from the geometry's conducting-generation count.
#[derive(Debug, Clone)]
pub struct DepositionData {
    /// Total inhaled dose \[µg\]
    pub total_dose: f64,
    /// Dose lost in the throat (never reaches the lung) \[µg\]
    pub throat_loss: f64,
    /// Deposits in the conducting airways
    pub airway: Vec<AirwayDeposit>,
    /// Deposits in the alveolar region
    pub alveolar: Vec<AlveolarDeposit>,
}

impl DepositionData {
    /// Derive amounts and particle volumes from a parsed table.
    ///
    /// * `particle_density` — material density \[µg/mL\], used for the
    ///   aerodynamic→geometric conversion
    /// * `airway_generations` — conducting-generation count of the geometry;
    ///   rows beyond it are alveolar
    pub fn from_table(
        table: &DepositionTable,
        particle_density: f64,
        airway_generations: usize,
    ) -> Result<Self, String> {
        table.validate()?;
        if !(particle_density > 0.0) {
            return Err(format!(
                "Particle density must be positive, got {}",
                particle_density
            ));
        }

        let mut airway: Vec<AirwayDeposit> = Vec::new();
        let mut alveolar: Vec<AlveolarDeposit> = Vec::new();
        let mut deposited = 0.0;

        for row in &table.rows {
            let geometric_um = match table.convention {
                DiameterConvention::Geometric => row.diameter,
                DiameterConvention::Aerodynamic => {
                    row.diameter * (WATER_DENSITY / particle_density).sqrt()
                }
            };
            let diameter_cm = geometric_um * 1.0e-4;
            let volume = std::f64::consts::PI / 6.0 * diameter_cm.powi(3);
            let amount = table.total_dose * row.fraction;
            deposited += amount;

            if row.generation <= airway_generations {
                // merge duplicate (generation, size) rows
                if let Some(existing) = airway.iter_mut().find(|d| {
                    d.generation == row.generation && d.particle_volume == volume
                }) {
                    existing.amount += amount;
                } else {
                    airway.push(AirwayDeposit {
                        generation: row.generation,
                        particle_volume: volume,
                        amount,
                    });
                }
            } else if let Some(existing) =
                alveolar.iter_mut().find(|d| d.particle_volume == volume)
            {
                existing.amount += amount;
            } else {
                alveolar.push(AlveolarDeposit {
                    particle_volume: volume,
                    amount,
                });
            }
        }

        Ok(Self {
            total_dose: table.total_dose,
            throat_loss: table.total_dose - deposited,
            airway,
            alveolar,
        })
    }

    /// Dose that actually reached the lung \[µg\].
    pub fn deposited_dose(&self) -> f64 {
        self.total_dose - self.throat_loss
    }

    /// All distinct particle volumes, sorted ascending.
    pub fn particle_volumes(&self) -> Vec<f64> {
        let mut volumes: Vec<f64> = self
            .airway
            .iter()
            .map(|d| d.particle_volume)
            .chain(self.alveolar.iter().map(|d| d.particle_volume))
            .collect();
        volumes.sort_by(|a, b| a.total_cmp(b));
        volumes.dedup();
        volumes
    }

    /// Size breakpoints covering the deposited particle sizes plus the range
    /// they shrink through.
    ///
    /// Geometrically spaced over `[v_min·(1-δ)/shrink_span, v_max·(1+δ)]`,
    /// where δ is the synthetic size half-width used by the deposition
    /// projection. Falls back to a nominal micron-scale range when nothing
    /// was deposited, so a zero-dose run still has a well-formed grid.
    pub fn size_bounds(&self, bins: usize, shrink_span: f64) -> Vec<f64> {
        let volumes = self.particle_volumes();
        let (min_v, max_v) = match (volumes.first(), volumes.last()) {
            (Some(&min_v), Some(&max_v)) => (min_v, max_v),
            _ => (1.0e-13, 1.0e-11),
        };

        let lower = min_v * (1.0 - SYNTHETIC_SIZE_HALF_WIDTH) / shrink_span.max(1.0);
        let upper = max_v * (1.0 + SYNTHETIC_SIZE_HALF_WIDTH);
        crate::grid::ComputationalGrid::geometric_size_bounds(lower, upper, bins)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
# fine aerosol, two sizes
dose = 100.0
diameter = geometric
1.0   5   0.30
2.5   5   0.25
1.0  25   0.20
";

    #[test]
    fn test_parse_and_split() {
        let table = DepositionTable::parse(TABLE).unwrap();
        assert!((table.total_dose - 100.0).abs() < 1e-12);
        assert_eq!(table.convention, DiameterConvention::Geometric);
        assert_eq!(table.rows.len(), 3);

        let data = DepositionData::from_table(&table, 1.2e6, 24).unwrap();
        assert_eq!(data.airway.len(), 2);
        assert_eq!(data.alveolar.len(), 1);
        assert!((data.throat_loss - 25.0).abs() < 1e-9);
        assert!((data.deposited_dose() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_particle_volume_from_diameter() {
        let table = DepositionTable::parse(TABLE).unwrap();
        let data = DepositionData::from_table(&table, 1.2e6, 24).unwrap();

        // 1 µm geometric diameter -> π/6 · (1e-4 cm)³
        let expected = std::f64::consts::PI / 6.0 * 1.0e-12;
        let smallest = data.particle_volumes()[0];
        assert!((smallest - expected).abs() < expected * 1e-12);
    }

    #[test]
    fn test_aerodynamic_conversion_shrinks_dense_particles() {
        let text = "dose = 10.0\ndiameter = aerodynamic\n2.0  3  0.5\n";
        let table = DepositionTable::parse(text).unwrap();

        let dense = DepositionData::from_table(&table, 2.0e6, 24).unwrap();
        let unit = DepositionData::from_table(&table, 1.0e6, 24).unwrap();

        // denser material -> smaller geometric size at equal aerodynamic size
        assert!(dense.airway[0].particle_volume < unit.airway[0].particle_volume);
    }

    #[test]
    fn test_missing_header_rejected() {
        let result = DepositionTable::parse("diameter = geometric\n1.0 3 0.5\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("dose"));
    }

    #[test]
    fn test_malformed_row_rejected() {
        let result = DepositionTable::parse("dose = 1.0\ndiameter = geometric\n1.0 3\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("expected"));
    }

    #[test]
    fn test_overcommitted_fractions_rejected() {
        let text = "dose = 1.0\ndiameter = geometric\n1.0 3 0.7\n2.0 4 0.6\n";
        let result = DepositionTable::parse(text);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("exceeds"));
    }

    #[test]
    fn test_duplicate_rows_merge() {
        let text = "dose = 10.0\ndiameter = geometric\n1.0 3 0.2\n1.0 3 0.3\n";
        let table = DepositionTable::parse(text).unwrap();
        let data = DepositionData::from_table(&table, 1.2e6, 24).unwrap();

        assert_eq!(data.airway.len(), 1);
        assert!((data.airway[0].amount - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dose_size_bounds_fallback() {
        let table = DepositionTable::parse("dose = 0.0\ndiameter = geometric\n").unwrap();
        let data = DepositionData::from_table(&table, 1.2e6, 24).unwrap();

        let bounds = data.size_bounds(8, 8.0);
        assert_eq!(bounds.len(), 9);
        assert!(crate::grid::strictly_increasing(&bounds));
    }

    #[test]
    fn test_size_bounds_cover_deposits() {
        let table = DepositionTable::parse(TABLE).unwrap();
        let data = DepositionData::from_table(&table, 1.2e6, 24).unwrap();
        let bounds = data.size_bounds(16, 8.0);

        let volumes = data.particle_volumes();
        let delta = SYNTHETIC_SIZE_HALF_WIDTH;
        assert!(bounds[0] <= volumes[0] * (1.0 - delta));
        assert!(*bounds.last().unwrap() >= volumes[volumes.len() - 1] * (1.0 + delta));
    }
}
