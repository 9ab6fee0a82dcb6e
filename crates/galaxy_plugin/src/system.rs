//! Fully expanded star system.

use galaxy_accrete::CelestialNode;
use glam::DVec3;

use crate::sector_pos::GalaxySectorId;

#[derive(Clone, Debug)]
pub struct StarSystem {
  pub id: GalaxySectorId,
  /// Galactic position of the system, Tm.
  pub pos: DVec3,
  pub metallicity: f64,
  /// Primary star with everything orbiting it. Positions are relative to
  /// `pos`.
  pub root: CelestialNode,
}

impl StarSystem {
  pub fn new(id: GalaxySectorId, pos: DVec3, metallicity: f64, root: CelestialNode) -> Self {
    Self {
      id,
      pos,
      metallicity,
      root,
    }
  }

  #[inline]
  pub fn body_count(&self) -> usize {
    self.root.body_count()
  }

  /// Advance every body to its analytic position at `time_s`, keeping the
  /// previous position for interpolation.
  pub fn update_positions(&mut self, time_s: f64) {
    self.root.last_position = self.root.position;
    self.root.update_positions(time_s);
  }
}
