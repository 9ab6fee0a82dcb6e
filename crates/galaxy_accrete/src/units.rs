//! Unit conversion constants.
//!
//! Names read as `<target>_PER_<source>`: multiply a value expressed in the
//! source unit to get the target unit.
//!
//! ```text
//! distance:  Tm (galaxy scale, orbits), au (accretion), km (radii)
//! mass:      Yg (summaries, bodies), Msol (accretion, IMF)
//! time:      Myr (ages), s (orbital positions)
//! ```

/// Terameters per light year.
pub const TM_PER_LY: f64 = 9.461e3;
/// Light years per terameter.
pub const LY_PER_TM: f64 = 1.0 / TM_PER_LY;
/// Terameters per astronomical unit.
pub const TM_PER_AU: f64 = 0.149598;
/// Kilometers per astronomical unit.
pub const KM_PER_AU: f64 = 1.496e8;
/// Meters per terameter.
pub const M_PER_TM: f64 = 1e12;

/// Kilometers per solar radius.
pub const KM_PER_RSOL: f64 = 6.957e5;
/// Kilometers per earth radius.
pub const KM_PER_REARTH: f64 = 6.371e3;
/// Centimeters per kilometer (Kothari radii come out in cm).
pub const CM_PER_KM: f64 = 1e5;

/// Yottagrams per solar mass.
pub const YG_PER_MSOL: f64 = 1.989e9;
/// Solar masses per yottagram.
pub const MSOL_PER_YG: f64 = 1.0 / YG_PER_MSOL;
/// Yottagrams per earth mass.
pub const YG_PER_MEARTH: f64 = 5.97219e3;
/// Yottagrams per jupiter mass.
pub const YG_PER_MJUPITER: f64 = 1.899e6;
/// Kilograms per yottagram.
pub const KG_PER_YG: f64 = 1e21;

/// Watts per solar luminosity.
pub const W_PER_LSOL: f64 = 3.827e26;

/// Main sequence lifetime of the sun.
pub const SOL_LIFETIME_MYR: f64 = 1e4;

/// Stefan-Boltzmann constant, W m^-2 K^-4.
pub const STEFAN_BOLTZMANN: f64 = 5.670374419e-8;
/// Newtonian gravitational constant, m^3 kg^-1 s^-2.
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;
/// Schwarzschild radius of one solar mass, in km.
pub const SCHWARZSCHILD_KM_PER_MSOL: f64 = 2.953;
