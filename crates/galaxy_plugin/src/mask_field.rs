//! Trilinearly interpolated region masks over one sector.
//!
//! Placement samples the masks hundreds of times per sector, and the
//! analytic galaxy field can be arbitrarily expensive. The sector builds a
//! small `(n + 1)^3` grid of samples once and interpolates inside it.
//!
//! ```text
//!  n = 2        o-----o-----o
//!               |     |     |
//!               o-----o-----o      o = sampled corner
//!               |  x  |     |      x = interpolated
//!               o-----o-----o
//! ```

use glam::DVec3;

use crate::bounds::DAabb3;
use crate::density::{DensityField, RegionWeights};

/// Grid resolution per sector level. Coarse levels span more of the galaxy
/// and need a finer grid to follow its structure.
pub fn subdivisions_for_level(level: u8) -> usize {
  match level {
    5 | 6 => 2,
    7 => 3,
    _ => 1,
  }
}

pub struct InterpolatedMaskField {
  bounds: DAabb3,
  subdivisions: usize,
  /// `(subdivisions + 1)^3` corner samples, x-major.
  grid: Vec<RegionWeights>,
}

impl InterpolatedMaskField {
  /// Sample `field` on a grid with `subdivisions` cells per axis.
  pub fn new(field: &dyn DensityField, bounds: DAabb3, subdivisions: usize) -> Self {
    let subdivisions = subdivisions.max(1);
    let points = subdivisions + 1;
    let mut grid = Vec::with_capacity(points * points * points);
    for x in 0..points {
      for y in 0..points {
        for z in 0..points {
          let t = DVec3::new(x as f64, y as f64, z as f64) / subdivisions as f64;
          grid.push(field.sample(bounds.lerp(t)));
        }
      }
    }
    Self {
      bounds,
      subdivisions,
      grid,
    }
  }

  /// Grid sized for a sector at `level`.
  pub fn for_level(field: &dyn DensityField, bounds: DAabb3, level: u8) -> Self {
    Self::new(field, bounds, subdivisions_for_level(level))
  }

  #[inline]
  pub fn subdivisions(&self) -> usize {
    self.subdivisions
  }

  #[inline]
  fn corner(&self, x: usize, y: usize, z: usize) -> &RegionWeights {
    let points = self.subdivisions + 1;
    &self.grid[(x * points + y) * points + z]
  }

  /// Interpolated masks at `pos`. Points outside the bounds get zero weights.
  pub fn evaluate(&self, pos: DVec3) -> RegionWeights {
    let t = self.bounds.inverse_lerp(pos);
    let inside = t.cmpge(DVec3::ZERO).all() && t.cmple(DVec3::ONE).all();
    if !inside {
      return RegionWeights::ZERO;
    }

    let scaled = t * self.subdivisions as f64;
    let max_cell = (self.subdivisions - 1) as f64;
    let cell = scaled.floor().min(DVec3::splat(max_cell));
    let f = scaled - cell;
    let (ix, iy, iz) = (cell.x as usize, cell.y as usize, cell.z as usize);

    let x00 = self.corner(ix, iy, iz).lerp(self.corner(ix + 1, iy, iz), f.x);
    let x10 = self.corner(ix, iy + 1, iz).lerp(self.corner(ix + 1, iy + 1, iz), f.x);
    let x01 = self.corner(ix, iy, iz + 1).lerp(self.corner(ix + 1, iy, iz + 1), f.x);
    let x11 = self.corner(ix, iy + 1, iz + 1).lerp(self.corner(ix + 1, iy + 1, iz + 1), f.x);

    let y0 = x00.lerp(&x10, f.y);
    let y1 = x01.lerp(&x11, f.y);
    y0.lerp(&y1, f.z)
  }
}

impl DensityField for InterpolatedMaskField {
  #[inline]
  fn sample(&self, pos: DVec3) -> RegionWeights {
    self.evaluate(pos)
  }
}
