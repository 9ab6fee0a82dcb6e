//! Hierarchical body tree produced by the accretion simulation.
//!
//! A [`CelestialNode`] owns its orbiting children outright; there are no
//! back references. Positions are in Tm relative to the system root and are
//! refreshed from the analytic orbits by [`CelestialNode::update_positions`].

use glam::DVec3;

use crate::interval::Interval;
use crate::orbit::Orbit;
use crate::stellar::StellarProperties;

#[derive(Clone, Debug, PartialEq)]
pub enum BodyKind {
  Star(StellarProperties),
  BrownDwarf,
  GasGiant,
  RockyWorld,
}

impl BodyKind {
  #[inline]
  pub fn is_star(&self) -> bool {
    matches!(self, BodyKind::Star(_))
  }
}

/// Debris ring in the body's equatorial plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CelestialRing {
  /// Tm from the body's center.
  pub interval_tm: Interval,
  pub mass_yg: f64,
  pub eccentricity: f64,
}

/// A child body together with its orbit around the parent.
#[derive(Clone, Debug)]
pub struct OrbitingBody {
  pub orbit: Orbit,
  pub node: CelestialNode,
}

#[derive(Clone, Debug)]
pub struct CelestialNode {
  pub kind: BodyKind,
  pub mass_yg: f64,
  pub radius_km: f64,
  pub rings: Vec<CelestialRing>,
  pub children: Vec<OrbitingBody>,
  /// Tm, relative to the system root.
  pub position: DVec3,
  /// Position before the most recent update, for interpolation.
  pub last_position: DVec3,
}

impl CelestialNode {
  pub fn new(kind: BodyKind, mass_yg: f64, radius_km: f64) -> Self {
    Self {
      kind,
      mass_yg,
      radius_km,
      rings: Vec::new(),
      children: Vec::new(),
      position: DVec3::ZERO,
      last_position: DVec3::ZERO,
    }
  }

  pub fn from_star(star: StellarProperties) -> Self {
    let radius_km = star.radius_km();
    Self::new(BodyKind::Star(star), star.mass_yg, radius_km)
  }

  /// This node plus every descendant.
  pub fn body_count(&self) -> usize {
    1 + self
      .children
      .iter()
      .map(|child| child.node.body_count())
      .sum::<usize>()
  }

  /// Depth-first walk, parents before children. Depth 0 is `self`.
  pub fn visit(&self, f: &mut impl FnMut(&CelestialNode, usize)) {
    self.visit_at(0, f);
  }

  fn visit_at(&self, depth: usize, f: &mut impl FnMut(&CelestialNode, usize)) {
    f(self, depth);
    for child in &self.children {
      child.node.visit_at(depth + 1, f);
    }
  }

  /// Total mass of the subtree including rings.
  pub fn total_mass_yg(&self) -> f64 {
    let rings: f64 = self.rings.iter().map(|r| r.mass_yg).sum();
    let children: f64 = self.children.iter().map(|c| c.node.total_mass_yg()).sum();
    self.mass_yg + rings + children
  }

  /// Move every descendant to its analytic position at `time_s`. This node's
  /// own position is left alone; callers position the root.
  pub fn update_positions(&mut self, time_s: f64) {
    let origin = self.position;
    let parent_mass = self.mass_yg;
    for child in &mut self.children {
      let node = &mut child.node;
      node.last_position = node.position;
      node.position = origin + child.orbit.offset_at(time_s, parent_mass);
      node.update_positions(time_s);
    }
  }
}
