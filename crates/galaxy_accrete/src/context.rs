//! Shared state for one disc simulation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::AccreteError;
use crate::interval::Interval;
use crate::params::AccreteParams;
use crate::stellar::StellarProperties;
use crate::units::KM_PER_AU;

/// Star, parameters and random stream for a single accretion run.
pub struct AccreteContext {
  pub params: AccreteParams,
  pub stellar_mass_msol: f64,
  pub stellar_luminosity_lsol: f64,
  pub system_age_myr: f64,
  pub metallicity: f64,
  /// Radii (au) where a planetesimal can hold an orbit around the star.
  pub stable_orbits: Interval,
  pub rng: ChaCha8Rng,
}

impl AccreteContext {
  /// Build a context around `star`. The stable orbit range starts at twice
  /// the stellar radius and is unbounded outwards.
  pub fn new(
    params: AccreteParams,
    star: &StellarProperties,
    seed: u64,
  ) -> Result<Self, AccreteError> {
    let mass_msol = star.mass_msol();
    let luminosity_lsol = star.luminosity_lsol;
    if !(mass_msol.is_finite() && mass_msol > 0.0)
      || !(luminosity_lsol.is_finite() && luminosity_lsol >= 0.0)
    {
      return Err(AccreteError::InvalidStar {
        mass_msol,
        luminosity_lsol,
      });
    }

    let inner = 2.0 * star.radius_km() / KM_PER_AU;
    Ok(Self {
      params,
      stellar_mass_msol: mass_msol,
      stellar_luminosity_lsol: luminosity_lsol,
      system_age_myr: star.age_myr,
      metallicity: star.metallicity,
      stable_orbits: Interval::new(inner, f64::INFINITY),
      rng: ChaCha8Rng::seed_from_u64(seed),
    })
  }

  /// Uniform draw in `[0, 1)`.
  #[inline]
  pub fn uniform(&mut self) -> f64 {
    self.rng.random::<f64>()
  }

  /// Eccentricity drawn as `1 - (1 - U)^coefficient`.
  pub fn random_eccentricity(&mut self) -> f64 {
    let u = self.uniform();
    1.0 - (1.0 - u).powf(self.params.eccentricity_coefficient)
  }

  /// Dust density (Msol / au^3) at `radius_au`.
  pub fn dust_density(&self, radius_au: f64) -> f64 {
    let p = &self.params;
    p.dust_density_coefficient
      * self.stellar_mass_msol.sqrt()
      * (-p.dust_density_alpha * radius_au.powf(1.0 / p.dust_density_n)).exp()
  }

  /// 1 inside `4 sqrt(L)`, 2 inside `15 sqrt(L)`, 3 beyond.
  pub fn orbital_zone(&self, distance_au: f64) -> u8 {
    let root_l = self.stellar_luminosity_lsol.sqrt();
    if distance_au < 4.0 * root_l {
      1
    } else if distance_au < 15.0 * root_l {
      2
    } else {
      3
    }
  }
}
