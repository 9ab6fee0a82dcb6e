//! Accretion errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccreteError {
  /// The central star cannot host a disc (non-finite or non-positive mass,
  /// non-finite or negative luminosity).
  #[error("invalid central star: mass {mass_msol} Msol, luminosity {luminosity_lsol} Lsol")]
  InvalidStar { mass_msol: f64, luminosity_lsol: f64 },

  /// The stable orbit range leaves no room to place planetesimals.
  #[error("degenerate disc: no stable orbits between {lower} and {higher} au")]
  DegenerateDisc { lower: f64, higher: f64 },
}
