use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::orbit::OrbitalShape;
use crate::params::AccreteParams;
use crate::planetesimal::PlanetesimalId;
use crate::stellar::StellarProperties;
use crate::units::YG_PER_MSOL;

fn assert_well_formed(bands: &DustBands) {
  for pair in bands.bands().windows(2) {
    let (a, b) = (&pair[0], &pair[1]);
    assert!(a.interval.lower < a.interval.higher, "empty band {:?}", a);
    assert_eq!(
      a.interval.higher, b.interval.lower,
      "bands must stay sorted and contiguous: {:?} / {:?}",
      a, b
    );
  }
}

fn assert_defragmented(bands: &DustBands) {
  for pair in bands.bands().windows(2) {
    let (a, b) = (&pair[0], &pair[1]);
    assert!(
      a.has_gas != b.has_gas || a.has_dust != b.has_dust,
      "adjacent bands share material: {:?} / {:?}",
      a,
      b
    );
  }
}

// =========================================================================
// remove_material
// =========================================================================

/// Removing from the middle of a band splits it three ways.
#[test]
fn test_remove_middle_splits_three_ways() {
  let mut bands = DustBands::new(Interval::new(0.0, 10.0));
  bands.remove_material(Interval::new(3.0, 5.0), false);

  assert_eq!(
    bands.bands(),
    &[
      DustBand::new(Interval::new(0.0, 3.0), true, true),
      DustBand::new(Interval::new(3.0, 5.0), true, false),
      DustBand::new(Interval::new(5.0, 10.0), true, true),
    ]
  );
}

/// Overlapping either edge trims the band and keeps the outside intact.
#[test]
fn test_remove_overlapping_edges() {
  let mut bands = DustBands::new(Interval::new(2.0, 8.0));
  bands.remove_material(Interval::new(0.0, 3.0), false);
  bands.remove_material(Interval::new(7.0, 9.0), false);

  assert_eq!(
    bands.bands(),
    &[
      DustBand::new(Interval::new(2.0, 3.0), true, false),
      DustBand::new(Interval::new(3.0, 7.0), true, true),
      DustBand::new(Interval::new(7.0, 8.0), true, false),
    ]
  );
}

/// Removing gas too leaves a band with no material at all.
#[test]
fn test_remove_gas_clears_everything() {
  let mut bands = DustBands::new(Interval::new(0.0, 4.0));
  bands.remove_material(Interval::new(-1.0, 5.0), true);

  assert_eq!(
    bands.bands(),
    &[DustBand::new(Interval::new(0.0, 4.0), false, false)]
  );
  assert!(!bands.has_dust(&Interval::new(0.0, 4.0)));
}

/// A gas-only band never gets its gas back from a dust-only removal.
#[test]
fn test_gasless_band_stays_gasless() {
  let mut bands = DustBands::new(Interval::new(0.0, 4.0));
  bands.remove_material(Interval::new(1.0, 2.0), true);
  bands.remove_material(Interval::new(0.0, 4.0), false);
  bands.defragment();

  assert!(bands
    .bands()
    .iter()
    .all(|b| !b.has_dust));
  assert!(bands
    .bands()
    .iter()
    .any(|b| !b.has_gas && b.interval == Interval::new(1.0, 2.0)));
}

/// Touching a band at an endpoint leaves it alone.
#[test]
fn test_remove_touching_is_noop() {
  let mut bands = DustBands::new(Interval::new(0.0, 4.0));
  bands.remove_material(Interval::new(4.0, 6.0), true);
  assert_eq!(bands.len(), 1);
  assert!(bands.has_dust(&Interval::new(3.0, 4.0)));
  assert!(!bands.has_dust(&Interval::new(4.0, 6.0)));
}

// =========================================================================
// defragment
// =========================================================================

/// Split pieces with identical material fuse back together.
#[test]
fn test_defragment_merges_runs() {
  let mut bands = DustBands::new(Interval::new(0.0, 10.0));
  bands.remove_material(Interval::new(2.0, 3.0), false);
  bands.remove_material(Interval::new(3.0, 4.0), false);
  bands.remove_material(Interval::new(4.0, 5.0), false);
  assert_eq!(bands.len(), 5);

  bands.defragment();
  assert_eq!(
    bands.bands(),
    &[
      DustBand::new(Interval::new(0.0, 2.0), true, true),
      DustBand::new(Interval::new(2.0, 5.0), true, false),
      DustBand::new(Interval::new(5.0, 10.0), true, true),
    ]
  );
}

/// Random removal sequences always leave a sorted, contiguous, fully merged
/// list.
#[test]
fn test_remove_then_defragment_invariant() {
  let mut rng = ChaCha8Rng::seed_from_u64(7);
  let mut bands = DustBands::new(Interval::new(0.0, 100.0));

  for _ in 0..500 {
    let a = rng.random_range(-10.0..110.0);
    let w = rng.random_range(0.01..15.0);
    let remove_gas = rng.random_bool(0.3);
    bands.remove_material(Interval::new(a, a + w), remove_gas);
    bands.defragment();

    assert_well_formed(&bands);
    assert_defragmented(&bands);
    assert_eq!(bands.bands()[0].interval.lower, 0.0);
    assert_eq!(bands.bands()[bands.len() - 1].interval.higher, 100.0);
  }
}

// =========================================================================
// sweep
// =========================================================================

fn sun_context() -> AccreteContext {
  let sun = StellarProperties::from_initial(YG_PER_MSOL, 4600.0, 0.0122);
  AccreteContext::new(AccreteParams::default(), &sun, 1).expect("valid star")
}

/// Sweeping collects dust and clears the swept region.
#[test]
fn test_sweep_collects_and_clears() {
  let ctx = sun_context();
  let mut bands = DustBands::new(Interval::new(0.0, 50.0));
  let mut body = Planetesimal::new(
    PlanetesimalId::from_index(0),
    OrbitalShape::new(0.05, 1.0),
    ctx.params.initial_planetesimal_mass,
    0.0,
  );

  let swept_limits = body.swept_dust_limits(ctx.params.cloud_eccentricity);
  let mass = bands.sweep(&ctx, &mut body);

  assert!(mass > 0.0);
  assert!(!body.swept_gas, "a seed body is far below critical mass");
  assert!(!bands.has_dust(&swept_limits));
  assert!(bands.has_dust(&Interval::new(10.0, 20.0)));

  // Second pass over the same region finds nothing left.
  let again = bands.sweep(&ctx, &mut body);
  assert_eq!(again, 0.0);
}
