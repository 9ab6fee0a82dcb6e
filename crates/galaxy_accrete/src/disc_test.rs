use super::*;
use crate::params::AccreteParams;
use crate::units::YG_PER_MSOL;

fn sun() -> StellarProperties {
  StellarProperties::from_initial(YG_PER_MSOL, 4600.0, 0.0122)
}

fn sun_disc(seed: u64) -> ProtoplanetaryDisc {
  let ctx = AccreteContext::new(AccreteParams::default(), &sun(), seed).expect("valid star");
  ProtoplanetaryDisc::new(ctx).expect("sun has room for a disc")
}

fn alloc(disc: &mut ProtoplanetaryDisc, semi_major: f64, mass: f64) -> PlanetesimalId {
  disc.arena.alloc(OrbitalShape::new(0.05, semi_major), mass, 0.0)
}

// =========================================================================
// Setup
// =========================================================================

#[test]
fn test_bounds_scale_with_stellar_mass() {
  let disc = sun_disc(1);
  let bounds = disc.planetesimal_bounds();
  assert!((bounds.lower - 0.1).abs() < 1e-12);
  assert!((bounds.higher - 500.0).abs() < 1e-9);
  assert_eq!(disc.dust_bands().len(), 1);
  let dust = disc.dust_bands().bands()[0].interval;
  assert_eq!(dust.lower, 0.0);
  assert!((dust.higher - 2000.0).abs() < 1e-9);
}

/// A stable orbit range beyond the placement bounds leaves no disc.
#[test]
fn test_degenerate_disc_is_rejected() {
  let mut ctx = AccreteContext::new(AccreteParams::default(), &sun(), 1).expect("valid star");
  ctx.stable_orbits = Interval::new(1000.0, f64::INFINITY);
  let result = ProtoplanetaryDisc::new(ctx);
  assert!(matches!(result, Err(AccreteError::DegenerateDisc { .. })));
}

// =========================================================================
// Collisions
// =========================================================================

/// The merged body carries exactly the sum of both masses.
#[test]
fn test_merge_conserves_mass() {
  let mut disc = sun_disc(2);
  let a = alloc(&mut disc, 1.0, 3.0e-6);
  let b = alloc(&mut disc, 1.1, 1.7e-7);
  let expected = 3.0e-6 + 1.7e-7;

  disc.merge_bodies(a, b);
  assert_eq!(disc.arena().get(a).mass, expected);

  let semi = disc.arena().get(a).orbit.semi_major;
  assert!(semi > 1.0 && semi < 1.1, "blended orbit at {}", semi);
  let ecc = disc.arena().get(a).orbit.eccentricity;
  assert!((0.0..=0.8).contains(&ecc));
}

/// Moons of the absorbed body are handed to the survivor.
#[test]
fn test_merge_moves_moons() {
  let mut disc = sun_disc(3);
  let a = alloc(&mut disc, 1.0, 3.0e-6);
  let b = alloc(&mut disc, 1.1, 1.0e-6);
  let moon = alloc(&mut disc, 0.001, 1.0e-9);
  disc.arena.attach_moon(b, moon);

  disc.merge_bodies(a, b);
  assert_eq!(disc.arena().get(moon).parent, Some(a));
  assert!(disc.arena().get(a).moons.contains(&moon));
  assert!(disc.arena().get(b).moons.is_empty());
}

/// A moon crashing into its own parent leaves the parent's orbit alone.
#[test]
fn test_merge_moon_into_parent_keeps_orbit() {
  let mut disc = sun_disc(4);
  let a = alloc(&mut disc, 5.2, 1.0e-3);
  let moon = alloc(&mut disc, 0.002, 1.0e-8);
  disc.arena.attach_moon(a, moon);
  let before = disc.arena().get(a).orbit;

  disc.merge_bodies(a, moon);
  assert_eq!(disc.arena().get(a).orbit, before);
  assert_eq!(disc.arena().get(a).mass, 1.0e-3 + 1.0e-8);
}

// =========================================================================
// Capture boundary
// =========================================================================

/// Sets up `a` and `b` so that `|a.semi - b.semi|` is `factor * 2 * roche`,
/// with both semi-major axes exact multiples of the Roche limit.
fn boundary_pair(disc: &mut ProtoplanetaryDisc, factor: f64) -> (PlanetesimalId, PlanetesimalId) {
  let a = alloc(disc, 0.5, 1.0e-3);
  let b = alloc(disc, 0.5, 1.0e-6);
  let roche = disc.roche_limit_between(a, b);

  disc.arena.get_mut(a).orbit.semi_major = 2.0 * roche;
  disc.arena.get_mut(b).orbit.semi_major = 2.0 * roche + 2.0 * roche * factor;
  assert_eq!(disc.roche_limit_between(a, b), roche, "roche must not depend on the move");
  (a, b)
}

/// Exactly twice the Roche limit apart is a capture.
#[test]
fn test_separation_at_twice_roche_captures() {
  let mut disc = sun_disc(5);
  let (a, b) = boundary_pair(&mut disc, 1.0);
  let sep = disc.arena().get(b).orbit.semi_major - disc.arena().get(a).orbit.semi_major;
  assert_eq!(sep, 2.0 * disc.roche_limit_between(a, b));

  let survivor = disc.handle_intersection(a, b);
  assert_eq!(survivor, a);
  assert_eq!(disc.arena().get(b).parent, Some(a));
}

/// Anything closer collides.
#[test]
fn test_separation_inside_twice_roche_collides() {
  let mut disc = sun_disc(6);
  let (a, b) = boundary_pair(&mut disc, 0.5);

  let survivor = disc.handle_intersection(a, b);
  assert_eq!(survivor, a);
  assert_eq!(disc.arena().get(b).parent, None);
  assert_eq!(disc.arena().get(a).mass, 1.0e-3 + 1.0e-6);
}

/// Resolving a collision does not sweep any extra dust into the survivor.
#[test]
fn test_collision_leaves_dust_untouched() {
  let mut disc = sun_disc(16);
  let a = alloc(&mut disc, 1.0, 3.0e-6);
  let b = alloc(&mut disc, 1.0, 1.0e-7);
  let bands = disc.dust_bands().clone();

  disc.handle_intersection(a, b);
  assert_eq!(disc.arena().get(a).mass, 3.0e-6 + 1.0e-7);
  assert_eq!(disc.dust_bands(), &bands);
}

/// The smaller body is always the one that gets absorbed or captured.
#[test]
fn test_intersection_keeps_larger_body() {
  let mut disc = sun_disc(7);
  let small = alloc(&mut disc, 1.0, 1.0e-9);
  let large = alloc(&mut disc, 1.0, 1.0e-5);
  assert_eq!(disc.handle_intersection(small, large), large);
}

// =========================================================================
// Rings
// =========================================================================

#[test]
fn test_moon_inside_roche_becomes_ring() {
  let mut disc = sun_disc(8);
  let parent = alloc(&mut disc, 5.2, 1.0e-3);
  let moon = alloc(&mut disc, 0.001, 2.0e-9);
  disc.arena.attach_moon(parent, moon);
  disc.arena.get_mut(moon).orbit = OrbitalShape::new(0.1, 0.001);

  disc.convert_to_ring(parent, moon, 0.0004, 0.00001);

  let rings = &disc.arena().get(parent).rings;
  assert_eq!(rings.len(), 1);
  assert_eq!(rings[0].mass, 2.0e-9);
  assert!((rings[0].interval.lower - (0.0009 - 0.00001)).abs() < 1e-15);
  assert!((rings[0].interval.higher - (0.0011 + 0.00001)).abs() < 1e-15);
  assert_eq!(disc.arena().get(parent).mass, 1.0e-3);
}

/// A ring squeezed out by the parent's surface falls onto the parent.
#[test]
fn test_squeezed_ring_is_absorbed() {
  let mut disc = sun_disc(9);
  let parent = alloc(&mut disc, 5.2, 1.0e-3);
  let moon = alloc(&mut disc, 0.001, 2.0e-9);
  disc.arena.get_mut(moon).orbit = OrbitalShape::new(0.0, 0.001);

  disc.convert_to_ring(parent, moon, 0.01, 0.00001);

  assert!(disc.arena().get(parent).rings.is_empty());
  assert_eq!(disc.arena().get(parent).mass, 1.0e-3 + 2.0e-9);
}

/// Satellites of a moon that breaks up are handed to the parent.
#[test]
fn test_ring_keeps_satellites() {
  let mut disc = sun_disc(10);
  let parent = alloc(&mut disc, 5.2, 1.0e-3);
  let moon = alloc(&mut disc, 0.001, 2.0e-9);
  let pebble = alloc(&mut disc, 0.00001, 1.0e-12);
  disc.arena.attach_moon(parent, moon);
  disc.arena.attach_moon(moon, pebble);
  disc.arena.get_mut(moon).rings.push(Ring {
    interval: Interval::new(0.000001, 0.000002),
    mass: 1.0e-13,
    eccentricity: 0.0,
  });
  disc.arena.get_mut(moon).orbit = OrbitalShape::new(0.1, 0.001);
  let before = disc.arena().system_mass(parent);

  disc.convert_to_ring(parent, moon, 0.0004, 0.00001);
  disc.arena.get_mut(parent).moons.retain(|m| *m != moon);

  assert_eq!(disc.arena().get(pebble).parent, Some(parent));
  assert!(disc.arena().get(parent).moons.contains(&pebble));
  assert_eq!(disc.arena().get(parent).rings.len(), 2);
  let after = disc.arena().system_mass(parent);
  assert!((after - before).abs() <= before * 1e-12, "{} -> {}", before, after);
}

// =========================================================================
// Captured moons
// =========================================================================

/// A Jupiter-like parent with a small moon already on its parent link.
fn moon_pair(disc: &mut ProtoplanetaryDisc) -> (PlanetesimalId, PlanetesimalId, f64, f64) {
  let parent = alloc(disc, 5.2, 1.0e-3);
  let moon = alloc(disc, 5.3, 1.0e-9);
  let roche = disc.roche_limit_between(parent, moon);
  disc.arena.get_mut(moon).parent = Some(parent);
  let parent_radius_au = disc.arena.radius_km(parent, &disc.ctx) / KM_PER_AU;
  (parent, moon, roche, parent_radius_au)
}

fn moon_radius_au(disc: &ProtoplanetaryDisc, moon: PlanetesimalId) -> f64 {
  disc.arena.radius_km(moon, &disc.ctx) / KM_PER_AU
}

/// A moon whose periapsis grazes the parent falls onto it.
#[test]
fn test_grazing_moon_merges_into_parent() {
  let mut disc = sun_disc(12);
  let (parent, moon, roche, parent_radius_au) = moon_pair(&mut disc);
  disc.arena.get_mut(moon).orbit = OrbitalShape::new(0.0, 1.5 * parent_radius_au);

  assert!(!disc.settle_moon(parent, moon, roche, parent_radius_au));
  assert_eq!(disc.arena().get(parent).mass, 1.0e-3 + 1.0e-9);
  assert!(disc.arena().get(parent).rings.is_empty());
}

/// Clear of the surface but inside twice the Roche limit gives a ring.
#[test]
fn test_close_moon_becomes_ring() {
  let mut disc = sun_disc(13);
  let (parent, moon, roche, parent_radius_au) = moon_pair(&mut disc);
  let surface = 2.0 * parent_radius_au + moon_radius_au(&disc, moon);
  assert!(surface < 2.0 * roche, "no room between surface and roche limit");
  disc.arena.get_mut(moon).orbit = OrbitalShape::new(0.0, 0.5 * (surface + 2.0 * roche));

  assert!(!disc.settle_moon(parent, moon, roche, parent_radius_au));
  let rings = &disc.arena().get(parent).rings;
  assert_eq!(rings.len(), 1);
  assert_eq!(rings[0].mass, 1.0e-9);
  assert_eq!(disc.arena().get(parent).mass, 1.0e-3);
}

/// Beyond twice the Roche limit the moon survives.
#[test]
fn test_distant_moon_is_kept() {
  let mut disc = sun_disc(14);
  let (parent, moon, roche, parent_radius_au) = moon_pair(&mut disc);
  disc.arena.get_mut(moon).orbit = OrbitalShape::new(0.0, 4.0 * roche);

  assert!(disc.settle_moon(parent, moon, roche, parent_radius_au));
  assert_eq!(disc.arena().get(parent).mass, 1.0e-3);
  assert!(disc.arena().get(parent).rings.is_empty());
}

/// Captures keep every moon inside the parent's Hill sphere and lose no
/// mass, whichever way each moon settles.
#[test]
fn test_capture_bounds_moons_and_conserves_mass() {
  for seed in 0..32 {
    let mut disc = sun_disc(100 + seed);
    let parent = alloc(&mut disc, 5.2, 1.0e-3);
    let captured = alloc(&mut disc, 5.6, 2.0e-6);
    for i in 0..3 {
      let moon = alloc(&mut disc, 0.01 * (i + 1) as f64, 1.0e-9);
      disc.arena.attach_moon(parent, moon);
    }
    let before = disc.arena().system_mass(parent) + disc.arena().system_mass(captured);

    assert_eq!(disc.handle_intersection(parent, captured), parent);

    let hill = disc.arena().get(parent).hill_sphere_radius(disc.ctx.stellar_mass_msol);
    for &moon in &disc.arena().get(parent).moons {
      let body = disc.arena().get(moon);
      assert_eq!(body.parent, Some(parent));
      assert!(body.orbit.semi_major <= hill, "seed {}: moon at {} > hill {}", seed, body.orbit.semi_major, hill);
    }
    let after = disc.arena().system_mass(parent);
    assert!((after - before).abs() <= before * 1e-12, "seed {}: {} -> {}", seed, before, after);
  }
}

// =========================================================================
// Full collapse
// =========================================================================

fn collapse(seed: u64) -> ProtoplanetaryDisc {
  let mut disc = sun_disc(seed);
  disc.collapse_disc();
  disc
}

/// Same seed, same planetary system.
#[test]
fn test_collapse_is_deterministic() {
  let a = collapse(0xACC2E7E);
  let b = collapse(0xACC2E7E);

  assert_eq!(a.planetesimals(), b.planetesimals());
  for (&ia, &ib) in a.planetesimals().iter().zip(b.planetesimals()) {
    let (pa, pb) = (a.arena().get(ia), b.arena().get(ib));
    assert_eq!(pa.mass, pb.mass);
    assert_eq!(pa.orbit, pb.orbit);
    assert_eq!(pa.moons.as_slice(), pb.moons.as_slice());
  }
  assert_eq!(a.dust_bands(), b.dust_bands());
}

/// A collapsed disc has top-level planets sorted by semi-major axis.
#[test]
fn test_collapse_sorts_planets() {
  let disc = collapse(42);
  let planets = disc.planetesimals();
  assert!(!planets.is_empty());

  for pair in planets.windows(2) {
    let (a, b) = (disc.arena().get(pair[0]), disc.arena().get(pair[1]));
    assert!(a.orbit.semi_major <= b.orbit.semi_major);
    assert!(a.parent.is_none() && b.parent.is_none());
  }
}

/// Converted systems hang every body off the star with orbits in Tm.
#[test]
fn test_convert_into_builds_body_tree() {
  let mut disc = collapse(7);
  let mut root = CelestialNode::from_star(disc.ctx_star());
  disc.convert_into(&mut root);

  assert!(root.body_count() > 1);
  for child in &root.children {
    assert!(child.orbit.shape.semi_major > 0.0);
    assert!(child.node.mass_yg >= 3.0 * 1e-15 * YG_PER_MSOL);
    assert!(child.node.radius_km > 0.0);
    assert!((0.0..TAU).contains(&child.orbit.phase));
  }

  let mut after = root.clone();
  after.update_positions(1.0e7);
  assert!(after.children.iter().all(|c| c.node.position.is_finite()));
}

/// Collapse honours the injection cap.
#[test]
fn test_collapse_respects_iteration_cap() {
  let params = AccreteParams {
    max_collapse_iterations: 3,
    ..AccreteParams::default()
  };
  let ctx = AccreteContext::new(params, &sun(), 11).expect("valid star");
  let mut disc = ProtoplanetaryDisc::new(ctx).expect("disc");
  assert!(disc.collapse_disc() <= 3);
}

impl ProtoplanetaryDisc {
  fn ctx_star(&self) -> StellarProperties {
    StellarProperties::from_initial(
      self.ctx.stellar_mass_msol * YG_PER_MSOL,
      self.ctx.system_age_myr,
      self.ctx.metallicity,
    )
  }
}
