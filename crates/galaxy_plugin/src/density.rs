//! Galaxy density fields.
//!
//! The galaxy's shape comes from outside as a field of [`RegionWeights`]:
//! one mask per structural region (core, arms, disc, halo). Stellar density
//! at a point is the dot product of those masks with per-region densities
//! from the galaxy config.

use glam::DVec3;

/// Per-region masks (or densities, depending on context).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RegionWeights {
  pub core: f64,
  pub arms: f64,
  pub disc: f64,
  pub halo: f64,
}

impl RegionWeights {
  pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

  #[inline]
  pub const fn new(core: f64, arms: f64, disc: f64, halo: f64) -> Self {
    Self {
      core,
      arms,
      disc,
      halo,
    }
  }

  #[inline]
  pub const fn splat(value: f64) -> Self {
    Self::new(value, value, value, value)
  }

  #[inline]
  pub fn total(&self) -> f64 {
    self.core + self.arms + self.disc + self.halo
  }

  #[inline]
  pub fn dot(&self, other: &RegionWeights) -> f64 {
    self.core * other.core + self.arms * other.arms + self.disc * other.disc + self.halo * other.halo
  }

  /// Component-wise product.
  #[inline]
  pub fn scaled(&self, other: &RegionWeights) -> RegionWeights {
    Self::new(
      self.core * other.core,
      self.arms * other.arms,
      self.disc * other.disc,
      self.halo * other.halo,
    )
  }

  #[inline]
  pub fn lerp(&self, other: &RegionWeights, t: f64) -> RegionWeights {
    Self::new(
      self.core + t * (other.core - self.core),
      self.arms + t * (other.arms - self.arms),
      self.disc + t * (other.disc - self.disc),
      self.halo + t * (other.halo - self.halo),
    )
  }

  #[inline]
  pub fn is_finite(&self) -> bool {
    self.core.is_finite() && self.arms.is_finite() && self.disc.is_finite() && self.halo.is_finite()
  }
}

/// Structural region of the galaxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
  Core = 0,
  Arms = 1,
  Disc = 2,
  Halo = 3,
}

impl Region {
  pub const ALL: [Region; 4] = [Region::Core, Region::Arms, Region::Disc, Region::Halo];

  /// Pick a region with probability proportional to its weight, using the
  /// uniform draw `t` in `[0, 1)`. Falls back to the disc when every weight
  /// is zero.
  pub fn pick(weights: &RegionWeights, t: f64) -> Region {
    let mut momentum = t * weights.total();
    for (region, weight) in [
      (Region::Core, weights.core),
      (Region::Arms, weights.arms),
      (Region::Disc, weights.disc),
      (Region::Halo, weights.halo),
    ] {
      if weight > momentum {
        return region;
      }
      momentum -= weight;
    }
    Region::Disc
  }

  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }
}

/// Source of region masks, sampled from worker threads.
pub trait DensityField: Send + Sync {
  /// Masks at `pos` (Tm).
  fn sample(&self, pos: DVec3) -> RegionWeights;
}

/// The same masks everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantDensityField(pub RegionWeights);

impl ConstantDensityField {
  /// Every region mask set to `value`.
  pub fn uniform(value: f64) -> Self {
    Self(RegionWeights::splat(value))
  }
}

impl DensityField for ConstantDensityField {
  #[inline]
  fn sample(&self, _pos: DVec3) -> RegionWeights {
    self.0
  }
}

/// Adapter for closures.
pub struct FnDensityField<F>(pub F);

impl<F> DensityField for FnDensityField<F>
where
  F: Fn(DVec3) -> RegionWeights + Send + Sync,
{
  #[inline]
  fn sample(&self, pos: DVec3) -> RegionWeights {
    (self.0)(pos)
  }
}
