//! Base star population.
//!
//! Fills a sector with stars from one slice of the IMF. Every octree level
//! owns a mass band, so the brightest stars live in the biggest sectors and
//! a viewer sees them from far away, while red dwarfs only appear in the
//! smallest sectors close to the camera.
//!
//! ```text
//! level:   0        1      2        3        4        5      6       7
//! Msol:  0.1-0.7  0.7-1  1-1.4  1.4-2.1  2.1-3.5  3.5-8  8-16  16-100
//! ```
//!
//! Placement is rejection sampling against the interpolated region masks:
//! the sector's average density is the proposal envelope, and a uniform
//! candidate is kept when `average * u < local`. Regions whose local
//! density exceeds the average are accepted every time, so stars migrate
//! slightly out of the densest parts of a sector.
//!
//! An attempt gets `placement_retries` candidates. When all of them are
//! rejected the attempt places nothing, so sparse sectors (mostly empty
//! space around a thin dense patch) end up with fewer stars than the IMF
//! count predicts.

use galaxy_accrete::units::{MSOL_PER_YG, YG_PER_MSOL};
use galaxy_accrete::{AccreteContext, CelestialNode, Interval, ProtoplanetaryDisc, StellarProperties};
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{trace, warn};

use crate::config::GalaxyConfig;
use crate::density::{Region, RegionWeights};
use crate::elements::{ElementHolder, PackedSectorElements};
use crate::error::GalaxyError;
use crate::imf::{ImfPowerLaw, ImfSampler};
use crate::layer::{GalaxyGenerationLayer, LayerContext};
use crate::mask_field::InterpolatedMaskField;
use crate::sector_pos::{GalaxySectorId, LEVEL_COUNT};
use crate::seed::{layer_seed, splitmix64, unit_f64};
use crate::system::StarSystem;

pub const BASE_LAYER_ID: u32 = 0;

/// Msol, indexed by level.
const LEVEL_MASS_BANDS: [(f64, f64); LEVEL_COUNT] = [
  (0.1, 0.7),
  (0.7, 1.0),
  (1.0, 1.4),
  (1.4, 2.1),
  (2.1, 3.5),
  (3.5, 8.0),
  (8.0, 16.0),
  (16.0, 100.0),
];

/// Spread applied on top of the IMF draw, so stars don't pile up on the
/// tabulated points.
const MASS_JITTER: Interval = Interval::new(0.85, 1.15);

const METALLICITY_JITTER: f64 = 0.05;

/// Stellar mass band (Msol) placed at `level`. Levels past the root get an
/// empty band.
pub fn mass_range_for_level(level: u8) -> Interval {
  LEVEL_MASS_BANDS
    .get(level as usize)
    .map(|&(lower, higher)| Interval::new(lower, higher))
    .unwrap_or(Interval::ZERO)
}

/// Metallicity of a system. Not stored in the summary: it is rebuilt from
/// the system seed and age, and younger stars formed from richer gas.
pub fn system_metallicity(config: &GalaxyConfig, system_seed: u64, age_myr: f64) -> f64 {
  let enrichment = if config.galaxy_age_myr > 0.0 {
    (1.0 - age_myr / config.galaxy_age_myr).clamp(0.0, 1.0)
  } else {
    0.0
  };
  let jitter = 1.0 + METALLICITY_JITTER * (2.0 * unit_f64(splitmix64(system_seed)) - 1.0);
  config.metallicity_range.lerp(enrichment) * jitter
}

/// Values that go through the `f32` store are rounded before use, so that
/// expanding a summary sees exactly the inputs generation used.
#[inline]
fn quantize(value: f64) -> f64 {
  (value as f32) as f64
}

pub struct BaseGalaxyGenerationLayer {
  imf: ImfPowerLaw,
  sampler: ImfSampler,
}

impl BaseGalaxyGenerationLayer {
  pub fn new(config: &GalaxyConfig) -> Self {
    let imf = ImfPowerLaw::new(config.imf_alpha);
    let sampler = ImfSampler::new(&imf, config.star_mass_range, config.imf_table_resolution);
    Self { imf, sampler }
  }

  /// Expected star count in `band` for a sector holding `sector_mass_msol`
  /// of stars across the whole IMF.
  pub fn expected_star_count(&self, config: &GalaxyConfig, sector_mass_msol: f64, band: Interval) -> f64 {
    if band.is_empty() || sector_mass_msol <= 0.0 {
      return 0.0;
    }
    let band_mass = sector_mass_msol * self.imf.mass_fraction(band, config.star_mass_range);
    self.imf.total_number_of_stars(band_mass, band).max(0.0)
  }

  /// Mean of `density_sample_count` raw field samples over the sector.
  fn average_density(&self, ctx: &LayerContext<'_>, rng: &mut ChaCha8Rng) -> f64 {
    let bounds = ctx.bounds();
    let weights = &ctx.config.stellar_density_weights;
    let count = ctx.config.density_sample_count.max(1);
    let mut sum = 0.0;
    for _ in 0..count {
      let t = DVec3::new(rng.random(), rng.random(), rng.random());
      let density = ctx.density.sample(bounds.lerp(t)).dot(weights);
      // Negative masks count as empty; NaN is kept so the caller sees it.
      sum += if density < 0.0 { 0.0 } else { density };
    }
    sum / count as f64
  }

  /// Rejection-sample a position. `None` when every retry was rejected.
  fn place(
    &self,
    ctx: &LayerContext<'_>,
    mask_field: &InterpolatedMaskField,
    average: f64,
    rng: &mut ChaCha8Rng,
  ) -> Option<(DVec3, RegionWeights)> {
    let bounds = ctx.bounds();
    let weights = &ctx.config.stellar_density_weights;
    for _ in 0..ctx.config.placement_retries.max(1) {
      let pos = bounds.lerp(DVec3::new(rng.random(), rng.random(), rng.random()));
      let local = mask_field.evaluate(pos).scaled(weights);
      if average * rng.random::<f64>() < local.total() {
        return Some((pos, local));
      }
    }
    None
  }
}

impl GalaxyGenerationLayer for BaseGalaxyGenerationLayer {
  #[inline]
  fn layer_id(&self) -> u32 {
    BASE_LAYER_ID
  }

  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "galaxy::base_layer::generate", fields(pos = %ctx.pos))
  )]
  fn generate_into(&self, ctx: &LayerContext<'_>, out: &mut PackedSectorElements) {
    let config = ctx.config;
    let mut rng = ChaCha8Rng::seed_from_u64(layer_seed(ctx.seed, self.layer_id()));

    let average = self.average_density(ctx, &mut rng);
    if !average.is_finite() {
      warn!("Density field is not finite in sector {}, placing no stars", ctx.pos);
      return;
    }

    let band = mass_range_for_level(ctx.pos.level).intersection(&config.star_mass_range);
    let sector_mass = average * ctx.bounds().volume();
    let expected = self.expected_star_count(config, sector_mass, band);
    let attempts = (expected.floor() as usize).min(config.max_stars_per_sector);
    if attempts == 0 {
      trace!(sector = %ctx.pos, average, "Sector is empty");
      return;
    }

    let mask_field = InterpolatedMaskField::for_level(ctx.density, ctx.bounds(), ctx.pos.level);
    out.reserve(attempts);

    let mut placed = 0usize;
    for _ in 0..attempts {
      let system_seed: u64 = rng.random();
      let Some((system_pos, local)) = self.place(ctx, &mask_field, average, &mut rng) else {
        continue;
      };

      let region = Region::pick(&local, rng.random());
      let age_myr = quantize(config.history(region).age_myr.lerp(rng.random()));
      let mass_msol = (self.sampler.sample_in(band, rng.random()) * MASS_JITTER.lerp(rng.random()))
        .clamp(config.star_mass_range.lower, config.star_mass_range.higher);
      let mass_yg = quantize(mass_msol * YG_PER_MSOL);

      let metallicity = system_metallicity(config, system_seed, age_myr);
      let star = StellarProperties::from_initial(mass_yg, age_myr, metallicity);

      out.push(&ElementHolder {
        system_pos,
        seed: system_seed,
        generation_layer: self.layer_id(),
        age_myr,
        mass_yg,
        luminosity_lsol: star.luminosity_lsol,
        temperature_k: star.temperature_k,
      });
      placed += 1;
    }

    trace!(
      sector = %ctx.pos,
      average,
      attempts,
      placed,
      "Generated base layer"
    );
  }

  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "galaxy::base_layer::expand", fields(id = %id))
  )]
  fn generate_full_system(
    &self,
    config: &GalaxyConfig,
    id: GalaxySectorId,
    summary: &ElementHolder,
  ) -> Result<StarSystem, GalaxyError> {
    if !summary.is_finite() {
      return Err(GalaxyError::NonFiniteSummary(id));
    }

    let metallicity = system_metallicity(config, summary.seed, summary.age_myr);
    let star = StellarProperties::from_initial(summary.mass_yg, summary.age_myr, metallicity);

    let mut rng = ChaCha8Rng::seed_from_u64(summary.seed);
    let ctx = AccreteContext::new(config.accrete.clone(), &star, rng.random())?;
    let mut disc = ProtoplanetaryDisc::new(ctx)?;
    let nuclei = disc.collapse_disc();

    let mut root = CelestialNode::from_star(star);
    disc.convert_into(&mut root);
    root.update_positions(0.0);

    trace!(
      system = %id,
      mass_msol = summary.mass_yg * MSOL_PER_YG,
      nuclei,
      bodies = root.body_count(),
      "Expanded system"
    );

    Ok(StarSystem::new(id, summary.system_pos, metallicity, root))
  }
}

#[cfg(test)]
#[path = "base_layer_test.rs"]
mod base_layer_test;
