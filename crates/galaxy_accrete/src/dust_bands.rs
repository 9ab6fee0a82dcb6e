//! Radial bookkeeping of the material left in a protoplanetary disc.
//!
//! The disc is a sorted, contiguous list of bands. Each band remembers whether
//! it still holds dust and/or gas; sweeping a region out never deletes a band,
//! it only clears its flags, so the list keeps covering the original extent.
//!
//! ```text
//!  initial:   [=============== gas+dust ===============]
//!  remove:              [~~~~~~~] (dust only)
//!  result:    [gas+dust][  gas  ][======= gas+dust =====]
//! ```

use std::f64::consts::PI;

use crate::context::AccreteContext;
use crate::interval::Interval;
use crate::planetesimal::{reduced_mass, Planetesimal};

/// One radial band of the disc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DustBand {
  pub interval: Interval,
  pub has_gas: bool,
  pub has_dust: bool,
}

impl DustBand {
  #[inline]
  pub fn new(interval: Interval, has_gas: bool, has_dust: bool) -> Self {
    Self {
      interval,
      has_gas,
      has_dust,
    }
  }

  #[inline]
  fn same_material(&self, other: &DustBand) -> bool {
    self.has_gas == other.has_gas && self.has_dust == other.has_dust
  }

  /// Touching and made of the same material.
  #[inline]
  pub fn can_merge_with_next(&self, next: &DustBand) -> bool {
    self.interval.higher == next.interval.lower && self.same_material(next)
  }
}

/// Ordered, non-overlapping list of [`DustBand`]s.
#[derive(Clone, Debug, PartialEq)]
pub struct DustBands {
  bands: Vec<DustBand>,
}

impl DustBands {
  /// A single band full of gas and dust.
  pub fn new(initial: Interval) -> Self {
    Self {
      bands: vec![DustBand::new(initial, true, true)],
    }
  }

  #[inline]
  pub fn bands(&self) -> &[DustBand] {
    &self.bands
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.bands.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.bands.is_empty()
  }

  /// True if any dusty band overlaps `interval`.
  pub fn has_dust(&self, interval: &Interval) -> bool {
    self
      .bands
      .iter()
      .any(|band| band.has_dust && band.interval.intersects(interval))
  }

  /// Strip dust (and gas when `remove_gas`) from `interval`.
  ///
  /// Overlapped bands are split so the untouched parts keep their material.
  /// A band that contains `interval` splits three ways.
  pub fn remove_material(&mut self, interval: Interval, remove_gas: bool) {
    let prev = std::mem::take(&mut self.bands);
    self.bands.reserve(prev.len() + 2);

    for band in prev {
      if !band.interval.intersects(&interval) {
        self.bands.push(band);
        continue;
      }

      let inner = Interval::new(band.interval.lower, interval.lower);
      let affected = band.interval.intersection(&interval);
      let outer = Interval::new(interval.higher, band.interval.higher);

      self.push_nonempty(DustBand::new(inner, band.has_gas, band.has_dust));
      self.push_nonempty(DustBand::new(affected, band.has_gas && !remove_gas, false));
      self.push_nonempty(DustBand::new(outer, band.has_gas, band.has_dust));
    }
  }

  fn push_nonempty(&mut self, band: DustBand) {
    if !band.interval.is_empty() {
      self.bands.push(band);
    }
  }

  /// Merge runs of touching bands with identical material.
  pub fn defragment(&mut self) {
    let prev = std::mem::take(&mut self.bands);
    let mut iter = prev.into_iter();
    let Some(mut current) = iter.next() else {
      return;
    };

    for next in iter {
      if current.can_merge_with_next(&next) {
        current.interval.higher = next.interval.higher;
      } else {
        self.bands.push(current);
        current = next;
      }
    }
    self.bands.push(current);
  }

  /// Mass (Msol) the body picks up from every dusty band under its swept
  /// limits, then clears that region. Gas goes too once the body is past its
  /// critical mass, which also marks it as a gas giant.
  pub fn sweep(&mut self, ctx: &AccreteContext, body: &mut Planetesimal) -> f64 {
    let swept = body.swept_dust_limits(ctx.params.cloud_eccentricity);
    let swept_size = swept.size();
    if !(swept_size > 0.0) {
      return 0.0;
    }

    let semi_major = body.orbit.semi_major;
    let eccentricity = body.orbit.eccentricity;
    let sweeps_gas = body.can_sweep_gas(ctx);
    let critical_mass = body.critical_mass(ctx);
    let dust_density = ctx.dust_density(semi_major);
    let k = ctx.params.dust_to_gas_ratio;

    let mut accumulated = 0.0;
    for band in self.bands.iter() {
      if !band.has_dust || !swept.intersects(&band.interval) {
        continue;
      }

      let outer_width = (swept.higher - band.interval.higher).max(0.0);
      let inner_width = (band.interval.lower - swept.lower).max(0.0);
      let intersected_width = swept_size - outer_width - inner_width;

      let area = 4.0 * PI * semi_major * semi_major;
      let shape = 1.0 - eccentricity * (outer_width - inner_width) / swept_size;
      let volume = area * shape * intersected_width * reduced_mass(body.mass);

      let density = if band.has_gas && sweeps_gas {
        k * dust_density / (1.0 + (critical_mass / body.mass).sqrt() * (k - 1.0))
      } else {
        dust_density
      };

      accumulated += density * volume;
    }

    body.swept_gas |= sweeps_gas;
    self.remove_material(swept, sweeps_gas);
    accumulated
  }
}

#[cfg(test)]
#[path = "dust_bands_test.rs"]
mod dust_bands_test;
