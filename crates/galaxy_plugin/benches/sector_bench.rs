//! Benchmarks for sector generation and ticket enumeration.
//!
//! Workload: the default galaxy weights under a uniform solar-neighbourhood
//! field, so star counts match what a viewer inside the disc would load.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galaxy_plugin::{
  ConstantDensityField, Galaxy, GalaxyConfig, RegionWeights, SectorPos, SectorTicketInfo,
  BASE_SIZE_TM,
};
use glam::{DVec3, IVec3};

fn disc_galaxy() -> Galaxy {
  let field = ConstantDensityField(RegionWeights::new(0.0, 0.0, 1.0, 0.0));
  Galaxy::new(GalaxyConfig::default(), Arc::new(field))
}

// ============================================================================
// Sector generation
// ============================================================================

/// Generate one sector per level.
fn bench_generate_sector(c: &mut Criterion) {
  let galaxy = disc_galaxy();
  let mut group = c.benchmark_group("generate_sector");

  for level in [0u8, 2, 5, 7] {
    let pos = SectorPos::new(level, IVec3::new(1, -1, 0));
    group.bench_with_input(BenchmarkId::from_parameter(level), &pos, |b, pos| {
      b.iter(|| black_box(galaxy.generate_sector_elements(*pos)))
    });
  }

  group.finish();
}

// ============================================================================
// Tickets
// ============================================================================

/// Enumerate the sectors of a visual ticket and diff a small move.
fn bench_visual_ticket(c: &mut Criterion) {
  let center = DVec3::splat(0.3 * BASE_SIZE_TM);
  let info = SectorTicketInfo::visual(center);

  c.bench_function("visual_ticket_affected", |b| {
    b.iter(|| black_box(info.affected_sectors().len()))
  });

  let moved = SectorTicketInfo::visual(center + DVec3::X * BASE_SIZE_TM);
  c.bench_function("visual_ticket_diff", |b| {
    b.iter(|| {
      let mut tracker = galaxy_plugin::TicketTracker::new(info.clone());
      tracker.diff();
      tracker.desired = moved.clone();
      black_box(tracker.diff())
    })
  });
}

criterion_group!(benches, bench_generate_sector, bench_visual_ticket);
criterion_main!(benches);
