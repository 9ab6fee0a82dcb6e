use super::*;
use crate::stellar::StellarProperties;
use crate::units::YG_PER_MSOL;

fn sun_context() -> AccreteContext {
  let sun = StellarProperties::from_initial(YG_PER_MSOL, 4600.0, 0.0122);
  AccreteContext::new(AccreteParams::default(), &sun, 3).expect("valid star")
}

fn body(semi_major: f64, eccentricity: f64, mass: f64) -> Planetesimal {
  Planetesimal::new(
    PlanetesimalId::from_index(0),
    OrbitalShape::new(eccentricity, semi_major),
    mass,
    0.0,
  )
}

// =========================================================================
// Reach
// =========================================================================

#[test]
fn test_reduced_mass() {
  assert_eq!(reduced_mass(0.0), 0.0);
  assert!((reduced_mass(1.0) - 0.5f64.powf(0.25)).abs() < 1e-15);
  assert!(reduced_mass(1e-3) < reduced_mass(1e-2));
}

/// Heavier bodies reach further and the dust cloud widens the swept zone.
#[test]
fn test_swept_limits_contain_effect_limits() {
  let light = body(1.0, 0.1, 1e-12);
  let heavy = body(1.0, 0.1, 1e-4);

  let light_effect = light.effect_limits();
  let heavy_effect = heavy.effect_limits();
  assert!(heavy_effect.contains(&light_effect));

  let swept = heavy.swept_dust_limits(0.2);
  assert!(swept.contains(&heavy_effect));
  assert!((swept.lower - heavy_effect.lower / 1.2).abs() < 1e-15);
  assert!((swept.higher - heavy_effect.higher / 0.8).abs() < 1e-15);
}

#[test]
fn test_critical_mass_and_gas_sweeping() {
  let ctx = sun_context();
  let seed = body(5.0, 0.0, 1e-15);
  let giant = body(5.0, 0.0, 1e-3);

  let expected = ctx.params.b * (5.0 * ctx.stellar_luminosity_lsol.sqrt()).powf(-0.75);
  assert!((seed.critical_mass(&ctx) - expected).abs() < 1e-18);
  assert!(!seed.can_sweep_gas(&ctx));
  assert!(giant.can_sweep_gas(&ctx));
}

#[test]
fn test_hill_sphere_grows_with_mass() {
  let earth = body(1.0, 0.0, 3e-6);
  let jupiter = body(1.0, 0.0, 1e-3);
  let r = earth.hill_sphere_radius(1.0);
  assert!((r - (1e-6f64).cbrt()).abs() < 1e-12);
  assert!(jupiter.hill_sphere_radius(1.0) > r);
}

// =========================================================================
// Merging
// =========================================================================

#[test]
fn test_combined_shape_lies_between_inputs() {
  let a = body(1.0, 0.05, 3e-6);
  let b = body(2.0, 0.05, 3e-6);
  let shape = combined_orbital_shape(&a, &b);
  assert!(shape.semi_major > 1.0 && shape.semi_major < 2.0);
  assert!((shape.semi_major - 4.0 / 3.0).abs() < 1e-12);
}

/// Wildly different orbits never produce an eccentricity past 0.8.
#[test]
fn test_combined_shape_clamps_eccentricity() {
  let a = body(0.1, 0.95, 1.0);
  let b = body(100.0, 0.0, 1.0);
  let shape = combined_orbital_shape(&a, &b);
  assert!(shape.eccentricity <= 0.8);
  assert!(shape.eccentricity >= 0.0);
}

// =========================================================================
// Capture boundary
// =========================================================================

/// Collision needs strictly less than twice the Roche limit.
#[test]
fn test_collision_is_strict() {
  let roche = 0.125;
  assert!(is_collision(0.2499, roche));
  assert!(!is_collision(0.25, roche));
  assert!(!is_collision(0.3, roche));
}

#[test]
fn test_roche_limit_scales_with_mass_ratio() {
  let base = roche_limit(1.0, 1.0, KM_PER_AU);
  assert!((base - 2f64.cbrt()).abs() < 1e-12);
  assert!(roche_limit(8.0, 1.0, KM_PER_AU) > base);
}

// =========================================================================
// Radius
// =========================================================================

/// Gas giants come out larger than rocky bodies of the same mass.
#[test]
fn test_kothari_gas_giants_are_larger() {
  let params = AccreteParams::default();
  let mass = 1e-4;
  let rocky = kothari_radius_km(&params, mass, 2, false);
  let gas = kothari_radius_km(&params, mass, 2, true);
  assert!(rocky > 0.0);
  assert!(gas > rocky);
}

/// An earth mass in the inner zone lands near the earth's radius.
#[test]
fn test_kothari_earth() {
  let params = AccreteParams::default();
  let r = kothari_radius_km(&params, 3.0e-6, 1, false);
  assert!(r > 4_000.0 && r < 9_000.0, "earth radius came out as {} km", r);
}

// =========================================================================
// Arena
// =========================================================================

#[test]
fn test_moon_distance_walks_to_star() {
  let mut arena = PlanetesimalArena::new();
  let planet = arena.alloc(OrbitalShape::new(0.0, 5.2), 1e-3, 0.0);
  let moon = arena.alloc(OrbitalShape::new(0.0, 0.003), 1e-8, 0.0);
  arena.attach_moon(planet, moon);

  assert_eq!(arena.distance_to_star(moon), Some(5.2));
  assert_eq!(arena.get(planet).moons.as_slice(), &[moon]);
  assert_eq!(arena.system_mass(planet), 1e-3 + 1e-8);
}

/// A parent cycle is reported instead of looping forever.
#[test]
fn test_distance_to_star_gives_up_on_cycles() {
  let mut arena = PlanetesimalArena::new();
  let a = arena.alloc(OrbitalShape::new(0.0, 1.0), 1e-6, 0.0);
  let b = arena.alloc(OrbitalShape::new(0.0, 0.01), 1e-9, 0.0);
  arena.get_mut(a).parent = Some(b);
  arena.get_mut(b).parent = Some(a);
  assert_eq!(arena.distance_to_star(a), None);
}
