//! Analytic stellar model.
//!
//! Main sequence properties come from piecewise mass-luminosity fits and a
//! `m^0.8` radius law; temperature follows from Stefan-Boltzmann. Past the end
//! of the main sequence a star moves onto a short giant branch and then into
//! a remnant picked by its initial mass.
//!
//! ```text
//!   age / lifetime:  0 ........ 1 ........ 1.4 ..........>
//!                    main seq.  | giant    | remnant
//!                                           < 10 Msol  white dwarf
//!                                           < 25 Msol  neutron star
//!                                           otherwise  black hole
//! ```
//!
//! Everything is a pure function of `(mass, age, metallicity)` so a summary
//! can be expanded later into exactly the same star.

use std::f64::consts::PI;
use std::fmt;

use crate::units::{
  KM_PER_RSOL, MSOL_PER_YG, SCHWARZSCHILD_KM_PER_MSOL, SOL_LIFETIME_MYR, STEFAN_BOLTZMANN,
  W_PER_LSOL,
};

/// Initial mass above which a star ends as a neutron star.
pub const NEUTRON_STAR_MIN_INITIAL_MASS_MSOL: f64 = 10.0;
/// Initial mass above which a star ends as a black hole.
pub const BLACK_HOLE_MIN_INITIAL_MASS_MSOL: f64 = 25.0;
/// Giant branch length relative to the main sequence lifetime.
pub const GIANT_BRANCH_FACTOR: f64 = 1.4;
/// Photosphere temperature cap.
pub const MAX_TEMPERATURE_K: f64 = 50_000.0;

const M_PER_RSOL: f64 = KM_PER_RSOL * 1e3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StarType {
  MainSequence,
  Giant,
  WhiteDwarf,
  NeutronStar,
  BlackHole,
}

/// Harvard spectral class by photosphere temperature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpectralClass {
  O,
  B,
  A,
  F,
  G,
  K,
  M,
  L,
}

impl SpectralClass {
  /// Lower temperature bound of each class, hottest first.
  const THRESHOLDS: [(f64, SpectralClass); 7] = [
    (30_000.0, SpectralClass::O),
    (10_000.0, SpectralClass::B),
    (7_500.0, SpectralClass::A),
    (6_000.0, SpectralClass::F),
    (5_200.0, SpectralClass::G),
    (3_700.0, SpectralClass::K),
    (2_400.0, SpectralClass::M),
  ];

  pub fn from_temperature(temperature_k: f64) -> Self {
    Self::THRESHOLDS
      .iter()
      .find(|(min, _)| temperature_k >= *min)
      .map(|(_, class)| *class)
      .unwrap_or(SpectralClass::L)
  }
}

impl fmt::Display for SpectralClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let c = match self {
      SpectralClass::O => "O",
      SpectralClass::B => "B",
      SpectralClass::A => "A",
      SpectralClass::F => "F",
      SpectralClass::G => "G",
      SpectralClass::K => "K",
      SpectralClass::M => "M",
      SpectralClass::L => "L",
    };
    f.write_str(c)
  }
}

/// Bulk properties of a single star.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StellarProperties {
  pub star_type: StarType,
  pub mass_yg: f64,
  pub age_myr: f64,
  pub metallicity: f64,
  pub main_sequence_lifetime_myr: f64,
  pub luminosity_lsol: f64,
  pub radius_rsol: f64,
  pub temperature_k: f64,
}

impl StellarProperties {
  /// Evolve a star of the given initial mass to `age_myr`.
  pub fn from_initial(mass_yg: f64, age_myr: f64, metallicity: f64) -> Self {
    let mass_msol = mass_yg * MSOL_PER_YG;
    let luminosity_lsol = main_sequence_luminosity(mass_msol);
    let radius_rsol = main_sequence_radius(mass_msol);

    let mut props = Self {
      star_type: StarType::MainSequence,
      mass_yg,
      age_myr,
      metallicity,
      main_sequence_lifetime_myr: main_sequence_lifetime(mass_msol),
      luminosity_lsol,
      radius_rsol,
      temperature_k: temperature(radius_rsol, luminosity_lsol),
    };

    let lifetime = props.main_sequence_lifetime_myr;
    if age_myr <= lifetime {
      return props;
    }

    if age_myr <= lifetime * GIANT_BRANCH_FACTOR {
      props.apply_giant_branch();
    } else if mass_msol < NEUTRON_STAR_MIN_INITIAL_MASS_MSOL {
      props.apply_white_dwarf();
    } else if mass_msol < BLACK_HOLE_MIN_INITIAL_MASS_MSOL {
      props.apply_neutron_star();
    } else {
      props.apply_black_hole();
    }
    props
  }

  #[inline]
  pub fn mass_msol(&self) -> f64 {
    self.mass_yg * MSOL_PER_YG
  }

  #[inline]
  pub fn radius_km(&self) -> f64 {
    self.radius_rsol * KM_PER_RSOL
  }

  #[inline]
  pub fn spectral_class(&self) -> SpectralClass {
    SpectralClass::from_temperature(self.temperature_k)
  }

  /// Fraction of the way through the giant branch, 0 at its start.
  fn giant_progress(&self) -> f64 {
    let lifetime = self.main_sequence_lifetime_myr;
    let span = lifetime * (GIANT_BRANCH_FACTOR - 1.0);
    ((self.age_myr - lifetime) / span).clamp(0.0, 1.0)
  }

  fn apply_giant_branch(&mut self) {
    let t = self.giant_progress();
    self.star_type = StarType::Giant;
    self.radius_rsol *= lerp(t, 3.0, 40.0);
    self.luminosity_lsol *= lerp(t, 3.0, 6.0);
    self.temperature_k = temperature(self.radius_rsol, self.luminosity_lsol);
  }

  fn cooling_curve(&self) -> f64 {
    let cooling_time = self.age_myr - self.main_sequence_lifetime_myr * GIANT_BRANCH_FACTOR;
    let fast = (-0.007 * cooling_time).exp();
    let slow = (-0.0002 * cooling_time).exp();
    (fast + 0.5 * slow) / 1.5
  }

  fn apply_white_dwarf(&mut self) {
    self.star_type = StarType::WhiteDwarf;
    self.temperature_k *= 1.5 * self.cooling_curve();
    self.radius_rsol *= 4e-3;
    self.luminosity_lsol = black_body_luminosity(self.radius_rsol, self.temperature_k);
  }

  fn apply_neutron_star(&mut self) {
    self.star_type = StarType::NeutronStar;
    self.temperature_k *= 20.0 * self.cooling_curve();
    self.radius_rsol *= 1e-5;
    self.luminosity_lsol = black_body_luminosity(self.radius_rsol, self.temperature_k);
  }

  fn apply_black_hole(&mut self) {
    self.star_type = StarType::BlackHole;
    self.luminosity_lsol = 0.0;
    self.temperature_k = 0.0;
    self.radius_rsol = self.mass_msol() * SCHWARZSCHILD_KM_PER_MSOL / KM_PER_RSOL;
  }
}

/// Piecewise main sequence mass-luminosity relation.
pub fn main_sequence_luminosity(mass_msol: f64) -> f64 {
  if mass_msol < 0.43 {
    0.23 * mass_msol.powf(2.3)
  } else if mass_msol < 2.0 {
    mass_msol.powi(4)
  } else if mass_msol < 55.0 {
    1.4 * mass_msol.powf(3.5)
  } else {
    32_000.0 * mass_msol
  }
}

#[inline]
pub fn main_sequence_radius(mass_msol: f64) -> f64 {
  mass_msol.powf(0.8)
}

pub fn main_sequence_lifetime(mass_msol: f64) -> f64 {
  SOL_LIFETIME_MYR * mass_msol / main_sequence_luminosity(mass_msol)
}

/// Photosphere temperature from radius and luminosity, capped.
pub fn temperature(radius_rsol: f64, luminosity_lsol: f64) -> f64 {
  let r = radius_rsol * M_PER_RSOL;
  let l = luminosity_lsol * W_PER_LSOL;
  let t = (l / (4.0 * PI * r * r * STEFAN_BOLTZMANN)).powf(0.25);
  t.min(MAX_TEMPERATURE_K)
}

fn black_body_luminosity(radius_rsol: f64, temperature_k: f64) -> f64 {
  let r = radius_rsol * M_PER_RSOL;
  let exitance = STEFAN_BOLTZMANN * temperature_k.powi(4);
  exitance * 4.0 * PI * r * r / W_PER_LSOL
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
  a + (b - a) * t
}

#[cfg(test)]
#[path = "stellar_test.rs"]
mod stellar_test;
