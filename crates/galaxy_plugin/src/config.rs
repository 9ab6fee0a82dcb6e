//! GalaxyConfig - parameters for sector generation and system expansion.

use galaxy_accrete::{AccreteParams, Interval};

use crate::density::{Region, RegionWeights};

/// Age range of the stars formed in one region of the galaxy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarFormationHistory {
  /// Myr.
  pub age_myr: Interval,
}

impl StarFormationHistory {
  pub const fn new(min_age_myr: f64, max_age_myr: f64) -> Self {
    Self {
      age_myr: Interval::new(min_age_myr, max_age_myr),
    }
  }
}

/// Configuration for one galaxy.
#[derive(Clone, Debug)]
pub struct GalaxyConfig {
  /// Root of every sector and system seed.
  pub seed: u64,

  /// Stellar density per unit region mask, Msol / Tm^3.
  pub stellar_density_weights: RegionWeights,

  /// Indexed by [`Region::index`].
  pub region_histories: [StarFormationHistory; 4],

  /// Age of the galaxy; also drives the metallicity gradient (younger stars
  /// are richer).
  pub galaxy_age_myr: f64,

  /// Metallicity of the oldest (lower) and youngest (higher) stars.
  pub metallicity_range: Interval,

  /// Cap on placement attempts per sector and layer.
  pub max_stars_per_sector: usize,

  /// Rejection-sampling retries per placement attempt.
  pub placement_retries: usize,

  /// Samples used to estimate a sector's average density.
  pub density_sample_count: usize,

  /// Msol. Masses outside are clamped.
  pub star_mass_range: Interval,

  /// IMF power-law slope.
  pub imf_alpha: f64,

  /// Points in the tabulated IMF inverse CDF.
  pub imf_table_resolution: usize,

  /// Parameters of the accretion simulation run on expansion.
  pub accrete: AccreteParams,
}

impl GalaxyConfig {
  #[inline]
  pub fn history(&self, region: Region) -> &StarFormationHistory {
    &self.region_histories[region.index()]
  }

  /// Same config with a different seed.
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }
}

impl Default for GalaxyConfig {
  fn default() -> Self {
    Self {
      seed: 0,
      // Solar neighbourhood is ~0.1 Msol/pc^3 ~ 3.4e-15 Msol/Tm^3.
      stellar_density_weights: RegionWeights::new(1.0e-12, 6.0e-15, 3.4e-15, 1.0e-17),
      region_histories: [
        StarFormationHistory::new(8_000.0, 13_000.0),
        StarFormationHistory::new(10.0, 1_000.0),
        StarFormationHistory::new(100.0, 10_000.0),
        StarFormationHistory::new(10_000.0, 13_000.0),
      ],
      galaxy_age_myr: 13_000.0,
      metallicity_range: Interval::new(0.001, 0.03),
      max_stars_per_sector: 2048,
      placement_retries: 16,
      density_sample_count: 32,
      star_mass_range: Interval::new(0.1, 100.0),
      imf_alpha: -2.35,
      imf_table_resolution: 4096,
      accrete: AccreteParams::default(),
    }
  }
}
