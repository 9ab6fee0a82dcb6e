//! Tunable constants for the accretion simulation.

/// Accretion parameters.
///
/// Defaults are the classic Dole/Fogg values. Masses are in solar masses and
/// distances in au.
#[derive(Clone, Debug, PartialEq)]
pub struct AccreteParams {
  /// Critical mass coefficient for gas sweeping.
  pub b: f64,
  /// Gas to dust mass ratio (K).
  pub dust_to_gas_ratio: f64,
  /// Eccentricity of the dust cloud particles.
  pub cloud_eccentricity: f64,
  /// Dust density falloff coefficient.
  pub dust_density_alpha: f64,
  /// Dust density falloff root.
  pub dust_density_n: f64,
  /// Dust density at the star, scaled by sqrt(stellar mass).
  pub dust_density_coefficient: f64,
  /// Exponent of the random eccentricity distribution.
  pub eccentricity_coefficient: f64,
  /// Seed mass of every new planetesimal.
  pub initial_planetesimal_mass: f64,

  /// Upper bound on planetesimal injections per disc.
  pub max_collapse_iterations: u32,
  /// Upper bound on sweep passes while a planetesimal accretes dust.
  pub max_accrete_iterations: u32,
  /// Upper bound on backward re-coalescing passes after an injection.
  pub max_coalesce_retries: u32,

  // Kothari radius constants (cgs)
  pub beta_20: f64,
  pub a1_20: f64,
  pub a2_20: f64,
  pub solar_mass_grams: f64,
}

impl Default for AccreteParams {
  fn default() -> Self {
    Self {
      b: 1.2e-5,
      dust_to_gas_ratio: 50.0,
      cloud_eccentricity: 0.2,
      dust_density_alpha: 5.0,
      dust_density_n: 3.0,
      dust_density_coefficient: 2.0e-3,
      eccentricity_coefficient: 0.077,
      initial_planetesimal_mass: 1e-15,
      max_collapse_iterations: 10_000,
      max_accrete_iterations: 100,
      max_coalesce_retries: 10,
      beta_20: 5.71e12,
      a1_20: 6.485e12,
      a2_20: 4.0032e-8,
      solar_mass_grams: 1.989e33,
    }
  }
}
