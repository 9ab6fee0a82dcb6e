//! Protoplanetary disc collapse.
//!
//! Nuclei are injected at random radii while dust remains inside the
//! placement bounds. Each accepted nucleus sweeps dust (and gas once it is
//! heavy enough) until its mass converges, is inserted into the sorted list of
//! top-level bodies, and then overlapping neighbours are resolved:
//!
//! ```text
//!   |a.semi - b.semi| <  2 * roche   ->  collision (masses add, orbits blend)
//!   |a.semi - b.semi| >= 2 * roche   ->  capture   (smaller becomes a moon)
//! ```
//!
//! Captured moons get a fresh orbit inside the parent's Hill sphere. A moon
//! grazing the parent's surface merges into it, one inside twice the Roche
//! limit becomes a ring, the rest are kept and coalesced among themselves.
//!
//! # Usage
//!
//! ```ignore
//! let mut disc = ProtoplanetaryDisc::new(ctx)?;
//! disc.collapse_disc();
//! let mut root = CelestialNode::from_star(star);
//! disc.convert_into(&mut root);
//! ```

use std::f64::consts::TAU;

use tracing::{trace, warn};

use crate::body::{BodyKind, CelestialNode, CelestialRing, OrbitingBody};
use crate::context::AccreteContext;
use crate::dust_bands::DustBands;
use crate::error::AccreteError;
use crate::interval::Interval;
use crate::orbit::{Orbit, OrbitalShape};
use crate::planetesimal::{
  combined_orbital_shape, is_collision, roche_limit, Planetesimal, PlanetesimalArena,
  PlanetesimalId, Ring,
};
use crate::stellar::StellarProperties;
use crate::units::{KM_PER_AU, TM_PER_AU, YG_PER_MJUPITER, YG_PER_MSOL};

/// Minimum mass (Msol) for a gas-swept body to ignite as a companion star.
pub const COMPANION_STAR_MIN_MASS_MSOL: f64 = 0.08;
/// Minimum mass (Jupiter masses) for a gas-swept body to be a brown dwarf.
pub const BROWN_DWARF_MIN_MASS_MJUP: f64 = 13.0;
/// Largest inclination (radians) given to a new nucleus.
pub const MAX_NUCLEUS_INCLINATION: f64 = 0.05;

/// Mass change, relative to the body's mass, below which dust accretion is
/// considered converged.
const ACCRETION_CONVERGENCE: f64 = 1e-4;

pub struct ProtoplanetaryDisc {
  pub ctx: AccreteContext,
  arena: PlanetesimalArena,
  /// Top-level bodies, sorted by semi-major axis.
  planetesimals: Vec<PlanetesimalId>,
  dust_bands: DustBands,
  planetesimal_bounds: Interval,
}

impl ProtoplanetaryDisc {
  /// Set up a fresh disc around the context's star.
  ///
  /// Nuclei are placed in `[0.1, 500] * sqrt(M)` au, clipped to the stable
  /// orbit range. Dust initially fills `[0, 2000] * sqrt(M)` au.
  pub fn new(ctx: AccreteContext) -> Result<Self, AccreteError> {
    let root_mass = ctx.stellar_mass_msol.sqrt();
    let ideal = Interval::new(0.1 * root_mass, 500.0 * root_mass);
    let planetesimal_bounds = ideal.intersection(&ctx.stable_orbits);
    if planetesimal_bounds.is_empty() {
      return Err(AccreteError::DegenerateDisc {
        lower: ctx.stable_orbits.lower,
        higher: ideal.higher,
      });
    }

    let dust_bands = DustBands::new(Interval::new(0.0, 2000.0 * root_mass));
    Ok(Self {
      ctx,
      arena: PlanetesimalArena::new(),
      planetesimals: Vec::new(),
      dust_bands,
      planetesimal_bounds,
    })
  }

  #[inline]
  pub fn planetesimal_bounds(&self) -> Interval {
    self.planetesimal_bounds
  }

  #[inline]
  pub fn dust_bands(&self) -> &DustBands {
    &self.dust_bands
  }

  #[inline]
  pub fn arena(&self) -> &PlanetesimalArena {
    &self.arena
  }

  /// Surviving top-level bodies, innermost first.
  #[inline]
  pub fn planetesimals(&self) -> &[PlanetesimalId] {
    &self.planetesimals
  }

  /// Run the accretion loop until the placement bounds hold no more dust or
  /// the iteration cap is hit. Returns the number of nuclei injected.
  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "accrete::collapse_disc")
  )]
  pub fn collapse_disc(&mut self) -> u32 {
    let mut iterations_remaining = self.ctx.params.max_collapse_iterations;
    let mut injected = 0;

    while self.dust_bands.has_dust(&self.planetesimal_bounds) {
      if iterations_remaining == 0 {
        warn!(
          "disc collapse ran out of iterations with {} bodies",
          self.planetesimals.len()
        );
        break;
      }
      iterations_remaining -= 1;

      let semi_major = self.planetesimal_bounds.lerp(self.ctx.uniform());
      let eccentricity = self.ctx.random_eccentricity();
      let inclination = MAX_NUCLEUS_INCLINATION * self.ctx.uniform();
      let candidate = Planetesimal::new(
        PlanetesimalId::from_index(self.arena.len()),
        OrbitalShape::new(eccentricity, semi_major),
        self.ctx.params.initial_planetesimal_mass,
        inclination,
      );

      let swept = candidate.swept_dust_limits(self.ctx.params.cloud_eccentricity);
      if self.dust_bands.has_dust(&swept) {
        let id = self.arena.insert(candidate);
        self.accrete_dust(id);
        self.insert_sorted(id);
        injected += 1;
      }

      let mut retries = 0;
      while retries < self.ctx.params.max_coalesce_retries {
        if !self.coalesce_top_level() {
          break;
        }
        retries += 1;
      }

      self.dust_bands.defragment();
    }

    trace!(
      "disc collapsed: {} nuclei, {} bodies, {} dust bands",
      injected,
      self.planetesimals.len(),
      self.dust_bands.len()
    );
    injected
  }

  /// Sweep dust into `id` until its mass stops changing.
  fn accrete_dust(&mut self, id: PlanetesimalId) {
    for _ in 0..self.ctx.params.max_accrete_iterations {
      let body = self.arena.get_mut(id);
      let swept = self.dust_bands.sweep(&self.ctx, body);
      body.mass += swept;
      if swept < ACCRETION_CONVERGENCE * body.mass {
        return;
      }
    }
  }

  fn insert_sorted(&mut self, id: PlanetesimalId) {
    let semi_major = self.arena.get(id).orbit.semi_major;
    let arena = &self.arena;
    let index = self
      .planetesimals
      .partition_point(|&p| arena.get(p).orbit.semi_major < semi_major);
    self.planetesimals.insert(index, id);
  }

  fn sort_by_semi_major(&self, ids: &mut [PlanetesimalId]) {
    ids.sort_by(|&a, &b| {
      let a = self.arena.get(a).orbit.semi_major;
      let b = self.arena.get(b).orbit.semi_major;
      a.total_cmp(&b)
    });
  }

  /// One forward pass over the top-level list. Returns true if anything
  /// merged.
  fn coalesce_top_level(&mut self) -> bool {
    let prev = std::mem::take(&mut self.planetesimals);
    let mut next = Vec::with_capacity(prev.len());
    let coalesced = self.coalesce(&prev, &mut next);
    self.sort_by_semi_major(&mut next);
    self.planetesimals = next;
    coalesced
  }

  /// Resolve every run of bodies with overlapping effect limits in `prev`
  /// (sorted by semi-major axis), pushing survivors into `out`.
  fn coalesce(&mut self, prev: &[PlanetesimalId], out: &mut Vec<PlanetesimalId>) -> bool {
    let mut coalesced = false;
    let mut i = 0;
    while i < prev.len() {
      let mut current = prev[i];
      i += 1;
      while i < prev.len() {
        let next = prev[i];
        let current_limits = self.arena.get(current).effect_limits();
        if !current_limits.intersects(&self.arena.get(next).effect_limits()) {
          break;
        }
        i += 1;
        coalesced = true;
        current = self.handle_intersection(current, next);
      }
      out.push(current);
    }
    coalesced
  }

  /// Resolve two overlapping bodies. Returns the survivor.
  fn handle_intersection(&mut self, a: PlanetesimalId, b: PlanetesimalId) -> PlanetesimalId {
    let (a, b) = if self.arena.get(b).mass > self.arena.get(a).mass {
      (b, a)
    } else {
      (a, b)
    };

    // Moons sharing a parent always collide.
    if self.arena.get(a).parent.is_some() {
      self.merge_bodies(a, b);
      return a;
    }

    let separation = (self.arena.get(a).orbit.semi_major - self.arena.get(b).orbit.semi_major).abs();
    let roche = self.roche_limit_between(a, b);
    if is_collision(separation, roche) {
      self.merge_bodies(a, b);
    } else {
      self.capture_moon(a, b);
    }
    a
  }

  fn roche_limit_between(&self, planet: PlanetesimalId, moon: PlanetesimalId) -> f64 {
    roche_limit(
      self.arena.get(planet).mass,
      self.arena.get(moon).mass,
      self.arena.radius_km(moon, &self.ctx),
    )
  }

  /// Fold `b` into `a`: masses add, orbits blend (unless `b` was orbiting
  /// `a`), and `b`'s moons and rings move over to `a`.
  pub fn merge_bodies(&mut self, a: PlanetesimalId, b: PlanetesimalId) {
    let new_shape = {
      let (body_a, body_b) = (self.arena.get(a), self.arena.get(b));
      (body_b.parent != Some(a)).then(|| combined_orbital_shape(body_a, body_b))
    };

    let body_b = self.arena.get_mut(b);
    let mass = body_b.mass;
    let swept_gas = body_b.swept_gas;
    let moons = std::mem::take(&mut body_b.moons);
    let rings = std::mem::take(&mut body_b.rings);

    let body_a = self.arena.get_mut(a);
    if let Some(shape) = new_shape {
      body_a.orbit = shape;
    }
    body_a.mass += mass;
    body_a.swept_gas |= swept_gas;
    body_a.rings.extend(rings);

    for moon in moons {
      self.arena.attach_moon(a, moon);
    }
  }

  /// Make `b` (and everything orbiting it) satellites of `a`.
  fn capture_moon(&mut self, a: PlanetesimalId, b: PlanetesimalId) {
    let shape = combined_orbital_shape(self.arena.get(a), self.arena.get(b));
    let roche = self.roche_limit_between(a, b);

    let mut candidates: Vec<PlanetesimalId> = std::mem::take(&mut self.arena.get_mut(a).moons)
      .into_iter()
      .collect();
    candidates.extend(std::mem::take(&mut self.arena.get_mut(b).moons));
    candidates.push(b);

    self.arena.get_mut(a).orbit = shape;
    let hill_radius = self.arena.get(a).hill_sphere_radius(self.ctx.stellar_mass_msol);
    let parent_radius_au = self.arena.radius_km(a, &self.ctx) / KM_PER_AU;

    let mut kept = Vec::with_capacity(candidates.len());
    for moon in candidates {
      let t = self.ctx.uniform();
      let eccentricity = self.ctx.random_eccentricity();
      let body = self.arena.get_mut(moon);
      body.parent = Some(a);
      body.orbit = OrbitalShape::new(eccentricity, hill_radius * t * t);

      if self.settle_moon(a, moon, roche, parent_radius_au) {
        kept.push(moon);
      }
    }

    self.sort_by_semi_major(&mut kept);
    let mut coalesced = Vec::with_capacity(kept.len());
    self.coalesce(&kept, &mut coalesced);

    let moons = &mut self.arena.get_mut(a).moons;
    moons.extend(coalesced);
  }

  /// Decide what becomes of `moon` on its new orbit around `parent`: it
  /// crashes into a parent whose surface its periapsis grazes, breaks up
  /// into a ring inside twice the Roche limit, or stays. Returns whether the
  /// moon was kept.
  fn settle_moon(
    &mut self,
    parent: PlanetesimalId,
    moon: PlanetesimalId,
    roche: f64,
    parent_radius_au: f64,
  ) -> bool {
    let periapsis = self.arena.get(moon).orbit.periapsis();
    let moon_radius_au = self.arena.radius_km(moon, &self.ctx) / KM_PER_AU;
    if periapsis - moon_radius_au <= 2.0 * parent_radius_au {
      self.merge_bodies(parent, moon);
      false
    } else if periapsis <= 2.0 * roche {
      self.convert_to_ring(parent, moon, parent_radius_au, moon_radius_au);
      false
    } else {
      true
    }
  }

  /// Spread `moon` into a ring around `parent`. A ring squeezed to nothing by
  /// the parent's surface is absorbed instead. Whatever orbited the moon
  /// moves over to the parent.
  fn convert_to_ring(
    &mut self,
    parent: PlanetesimalId,
    moon: PlanetesimalId,
    parent_radius_au: f64,
    moon_radius_au: f64,
  ) {
    let body = self.arena.get_mut(moon);
    let mass = body.mass;
    let inner = (body.orbit.periapsis() - moon_radius_au).max(1.5 * parent_radius_au);
    let outer = body.orbit.apoapsis() + moon_radius_au;
    let satellites = std::mem::take(&mut body.moons);
    let rings = std::mem::take(&mut body.rings);

    let parent_body = self.arena.get_mut(parent);
    if inner >= outer {
      parent_body.mass += mass;
    } else {
      parent_body.rings.push(Ring {
        interval: Interval::new(inner, outer),
        mass,
        eccentricity: 0.0,
      });
    }
    parent_body.rings.extend(rings);

    for satellite in satellites {
      self.arena.attach_moon(parent, satellite);
    }
  }

  /// Turn every surviving body into children of `root`. Bodies that never
  /// grew past three seed masses are dropped.
  pub fn convert_into(&mut self, root: &mut CelestialNode) {
    let top_level = self.planetesimals.clone();
    for id in top_level {
      self.convert_body(id, root);
    }
  }

  fn convert_body(&mut self, id: PlanetesimalId, parent: &mut CelestialNode) {
    let body = self.arena.get(id).clone();
    if body.mass < 3.0 * self.ctx.params.initial_planetesimal_mass {
      return;
    }

    let mass_yg = body.mass * YG_PER_MSOL;
    let (kind, radius_km) = if body.swept_gas && body.mass >= COMPANION_STAR_MIN_MASS_MSOL {
      let star = StellarProperties::from_initial(mass_yg, self.ctx.system_age_myr, self.ctx.metallicity);
      let radius_km = star.radius_km();
      (BodyKind::Star(star), radius_km)
    } else {
      let kind = if !body.swept_gas {
        BodyKind::RockyWorld
      } else if mass_yg >= BROWN_DWARF_MIN_MASS_MJUP * YG_PER_MJUPITER {
        BodyKind::BrownDwarf
      } else {
        BodyKind::GasGiant
      };
      (kind, self.arena.radius_km(id, &self.ctx))
    };

    let mut orbit = Orbit::new(body.orbit.with_semi_major_scaled(TM_PER_AU));
    orbit.inclination = body.inclination;
    orbit.ascending_node = TAU * self.ctx.uniform();
    orbit.phase = TAU * self.ctx.uniform();

    let mut node = CelestialNode::new(kind, mass_yg, radius_km);
    node.rings = body
      .rings
      .iter()
      .map(|ring| CelestialRing {
        interval_tm: ring.interval.scaled(TM_PER_AU),
        mass_yg: ring.mass * YG_PER_MSOL,
        eccentricity: ring.eccentricity,
      })
      .collect();

    for &moon in body.moons.iter() {
      self.convert_body(moon, &mut node);
    }

    parent.children.push(OrbitingBody { orbit, node });
  }
}

#[cfg(test)]
#[path = "disc_test.rs"]
mod disc_test;
