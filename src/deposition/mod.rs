//! Deposited-dose handling
//!
//! - [`table`] — parses the deposition table (header block plus
//!   diameter/generation/fraction rows) and derives immutable
//!   [`DepositionData`]: amounts, particle volumes, throat loss.
//! - [`projector`] — turns the discrete deposits into the initial 2-D mass
//!   density on the computational grid, conserving the deposited mass over
//!   every grid sub-rectangle.

pub mod projector;
pub mod table;

pub use projector::{DepositionProjector, InitialDensity};
pub use table::{
    AirwayDeposit, AlveolarDeposit, DepositionData, DepositionRow, DepositionTable,
    DiameterConvention, WATER_DENSITY,
};

/// Relative half-width of the synthetic size interval that spreads one
/// reported particle size into a continuous density.
pub const SYNTHETIC_SIZE_HALF_WIDTH: f64 = 0.02;
