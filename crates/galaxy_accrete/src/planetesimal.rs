//! Planetesimals and the arena that owns them.
//!
//! Bodies refer to each other (moon-of, moons) by [`PlanetesimalId`], an index
//! into [`PlanetesimalArena`]. Ids are never reused within one simulation, so
//! a stale id still points at the body it was created for.

use smallvec::SmallVec;
use tracing::error;

use crate::context::AccreteContext;
use crate::interval::Interval;
use crate::orbit::OrbitalShape;
use crate::params::AccreteParams;
use crate::units::{CM_PER_KM, KM_PER_AU};

/// Longest parent chain walked when looking for the orbited star.
const MAX_PARENT_DEPTH: usize = 10;

/// Handle to a body in a [`PlanetesimalArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanetesimalId(u32);

impl PlanetesimalId {
  #[inline]
  pub fn from_index(index: usize) -> Self {
    Self(index as u32)
  }

  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// Debris ring around a body. Interval in au from the body's center, mass in
/// Msol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ring {
  pub interval: Interval,
  pub mass: f64,
  pub eccentricity: f64,
}

/// A growing body in the disc.
#[derive(Clone, Debug)]
pub struct Planetesimal {
  pub id: PlanetesimalId,
  /// Msol.
  pub mass: f64,
  /// Around the star for top-level bodies, around `parent` for moons. au.
  pub orbit: OrbitalShape,
  pub inclination: f64,
  pub swept_gas: bool,
  pub parent: Option<PlanetesimalId>,
  pub moons: SmallVec<[PlanetesimalId; 4]>,
  pub rings: Vec<Ring>,
}

impl Planetesimal {
  pub fn new(id: PlanetesimalId, orbit: OrbitalShape, mass: f64, inclination: f64) -> Self {
    Self {
      id,
      mass,
      orbit,
      inclination,
      swept_gas: false,
      parent: None,
      moons: SmallVec::new(),
      rings: Vec::new(),
    }
  }

  /// Radial reach of the body's gravity.
  pub fn effect_limits(&self) -> Interval {
    let m = reduced_mass(self.mass);
    Interval::new(
      self.orbit.periapsis() * (1.0 - m),
      self.orbit.apoapsis() * (1.0 + m),
    )
  }

  /// Region of the disc whose eccentric dust orbits cross the effect limits.
  pub fn swept_dust_limits(&self, cloud_eccentricity: f64) -> Interval {
    let effect = self.effect_limits();
    let inner = effect.lower / (1.0 + cloud_eccentricity);
    let outer = effect.higher / (1.0 - cloud_eccentricity);
    Interval::new(inner.max(0.0), outer)
  }

  /// Radius (au) within which this body holds satellites against the star.
  pub fn hill_sphere_radius(&self, star_mass: f64) -> f64 {
    self.orbit.semi_major * (1.0 - self.orbit.eccentricity) * (self.mass / (3.0 * star_mass)).cbrt()
  }

  /// Mass above which the body starts pulling in gas.
  pub fn critical_mass(&self, ctx: &AccreteContext) -> f64 {
    let temperature = self.orbit.periapsis() * ctx.stellar_luminosity_lsol.sqrt();
    ctx.params.b * temperature.powf(-0.75)
  }

  #[inline]
  pub fn can_sweep_gas(&self, ctx: &AccreteContext) -> bool {
    self.mass > self.critical_mass(ctx)
  }
}

/// `(m / (1 + m))^(1/4)`.
#[inline]
pub fn reduced_mass(mass: f64) -> f64 {
  (mass / (1.0 + mass)).powf(0.25)
}

/// Orbit of the merged body: mass-weighted harmonic semi-major axis and an
/// eccentricity from the blended specific angular momentum, clamped to
/// `[0, 0.8]`.
pub fn combined_orbital_shape(a: &Planetesimal, b: &Planetesimal) -> OrbitalShape {
  let combined_mass = a.mass + b.mass;
  let new_semi_major =
    combined_mass / (a.mass / a.orbit.semi_major + b.mass / b.orbit.semi_major);

  let ta = a.mass * (a.orbit.semi_major * (1.0 - a.orbit.eccentricity.powi(2))).sqrt();
  let tb = b.mass * (b.orbit.semi_major * (1.0 - b.orbit.eccentricity.powi(2))).sqrt();
  let t = (ta + tb) / (combined_mass * new_semi_major.sqrt());

  let eccentricity = (1.0 - t * t).abs().sqrt().clamp(0.0, 0.8);
  OrbitalShape::new(eccentricity, new_semi_major)
}

/// Roche limit (au) of a moon around a planet.
#[inline]
pub fn roche_limit(planet_mass: f64, moon_mass: f64, moon_radius_km: f64) -> f64 {
  moon_radius_km / KM_PER_AU * (2.0 * planet_mass / moon_mass).cbrt()
}

/// Two bodies on crossing orbits collide when their semi-major axes are
/// strictly closer than twice the Roche limit. Anything at or beyond that
/// separation is a capture.
#[inline]
pub fn is_collision(separation: f64, roche_limit: f64) -> bool {
  separation < 2.0 * roche_limit
}

/// Kothari mass-radius relation, in km.
///
/// Atomic weight and number depend on the orbital zone and whether the body
/// is a gas giant.
pub fn kothari_radius_km(params: &AccreteParams, mass: f64, zone: u8, gas_giant: bool) -> f64 {
  let (atomic_weight, atomic_num) = match (zone, gas_giant) {
    (1, true) => (9.5, 4.5),
    (1, false) => (15.0, 8.0),
    (2, true) => (2.47, 2.0),
    (3, true) => (7.0, 4.0),
    (_, _) => (10.0, 5.0),
  };

  let numerator = (2.0 * params.beta_20 / params.a1_20)
    * (1.0 / (atomic_weight * atomic_num as f64).cbrt())
    * params.solar_mass_grams.cbrt();

  let denominator = 1.0
    + (params.a2_20 / params.a1_20)
      * (f64::powf(atomic_weight, 4.0 / 3.0) / (atomic_num * atomic_num))
      * params.solar_mass_grams.powf(2.0 / 3.0)
      * mass.powf(2.0 / 3.0);

  numerator / denominator * mass.cbrt() / CM_PER_KM
}

/// Owner of every body created during one disc simulation.
#[derive(Clone, Debug, Default)]
pub struct PlanetesimalArena {
  nodes: Vec<Planetesimal>,
}

impl PlanetesimalArena {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn alloc(&mut self, orbit: OrbitalShape, mass: f64, inclination: f64) -> PlanetesimalId {
    let id = PlanetesimalId::from_index(self.nodes.len());
    self.nodes.push(Planetesimal::new(id, orbit, mass, inclination));
    id
  }

  /// Take ownership of a body built outside the arena, assigning it the next
  /// id.
  pub fn insert(&mut self, mut body: Planetesimal) -> PlanetesimalId {
    let id = PlanetesimalId::from_index(self.nodes.len());
    body.id = id;
    self.nodes.push(body);
    id
  }

  #[inline]
  pub fn get(&self, id: PlanetesimalId) -> &Planetesimal {
    &self.nodes[id.index()]
  }

  #[inline]
  pub fn get_mut(&mut self, id: PlanetesimalId) -> &mut Planetesimal {
    &mut self.nodes[id.index()]
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Make `moon` a satellite of `parent`.
  pub fn attach_moon(&mut self, parent: PlanetesimalId, moon: PlanetesimalId) {
    self.get_mut(moon).parent = Some(parent);
    self.get_mut(parent).moons.push(moon);
  }

  /// Semi-major axis of the top-level ancestor, i.e. the distance to the star.
  pub fn distance_to_star(&self, id: PlanetesimalId) -> Option<f64> {
    let mut cur = self.get(id);
    for _ in 0..MAX_PARENT_DEPTH {
      match cur.parent {
        None => return Some(cur.orbit.semi_major),
        Some(parent) => cur = self.get(parent),
      }
    }
    error!("star distance lookup for planetesimal {:?} exceeded {} parents", id, MAX_PARENT_DEPTH);
    None
  }

  /// Kothari radius of a body in km, using the zone of its distance to the
  /// star.
  pub fn radius_km(&self, id: PlanetesimalId, ctx: &AccreteContext) -> f64 {
    let body = self.get(id);
    let zone = self
      .distance_to_star(id)
      .map(|d| ctx.orbital_zone(d))
      .unwrap_or(3);
    kothari_radius_km(&ctx.params, body.mass, zone, body.swept_gas)
  }

  /// Total mass of a body, its rings, and everything orbiting it.
  pub fn system_mass(&self, id: PlanetesimalId) -> f64 {
    let body = self.get(id);
    let rings: f64 = body.rings.iter().map(|r| r.mass).sum();
    let moons: f64 = body.moons.iter().map(|&m| self.system_mass(m)).sum();
    body.mass + rings + moons
  }
}

#[cfg(test)]
#[path = "planetesimal_test.rs"]
mod planetesimal_test;
