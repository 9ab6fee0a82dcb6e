//! Spatial interest queries.
//!
//! A ticket asks for either one exact sector or a multi-level sphere of
//! interest: a sphere per level, with the radius growing for coarser levels
//! so that bright stars (which live in high levels) are visible from much
//! further away than dim ones.
//!
//! ```text
//! level 2   r * scale[2]   ( . . . . . . . . . . . )
//! level 1   r * scale[1]       ( . . . . . . . )
//! level 0   r * scale[0]          ( . . . . )
//!                                   center
//! ```

use std::collections::HashSet;

use glam::{DVec3, IVec3};
use smallvec::SmallVec;

use crate::sector_pos::{size_for_level, SectorPos, BASE_SIZE_TM, LEVEL_COUNT};

/// Center movement (as a fraction of the base radius) below which a multi
/// ticket is not re-evaluated.
pub const MULTI_UPDATE_THRESHOLD: f64 = 0.01;

/// Radius multipliers that double the interest radius per level.
pub const DEFAULT_LEVEL_SCALE: [f64; LEVEL_COUNT] = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0];

/// Spheres of interest around `center`, one per level.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiTicketInfo {
  /// Tm.
  pub center: DVec3,
  /// Radius at level 0, Tm.
  pub base_radius: f64,
  pub per_level_scale: [f64; LEVEL_COUNT],
}

impl MultiTicketInfo {
  pub fn new(center: DVec3, base_radius: f64) -> Self {
    Self {
      center,
      base_radius,
      per_level_scale: DEFAULT_LEVEL_SCALE,
    }
  }

  #[inline]
  pub fn radius_for_level(&self, level: u8) -> f64 {
    self.base_radius * self.per_level_scale[level as usize]
  }

  fn enumerate(&self, consumer: &mut impl FnMut(SectorPos)) {
    for level in 0..LEVEL_COUNT as u8 {
      let radius = self.radius_for_level(level);
      if !(radius >= 0.0) {
        continue;
      }
      let width = size_for_level(level);
      let lo = ((self.center - DVec3::splat(radius)) / width).floor().as_ivec3();
      let hi = ((self.center + DVec3::splat(radius)) / width).floor().as_ivec3();

      for x in lo.x..=hi.x {
        for y in lo.y..=hi.y {
          for z in lo.z..=hi.z {
            let pos = SectorPos::new(level, IVec3::new(x, y, z));
            if pos.bounds().intersects_sphere(self.center, radius) {
              consumer(pos);
            }
          }
        }
      }
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SectorTicketInfo {
  /// Exactly one sector.
  Single(SectorPos),
  /// Every sector, on every level, touched by the level's sphere.
  Multi(MultiTicketInfo),
}

impl SectorTicketInfo {
  #[inline]
  pub fn single(pos: SectorPos) -> Self {
    Self::Single(pos)
  }

  /// Interest volume for rendering the sky around `center`.
  #[inline]
  pub fn visual(center: DVec3) -> Self {
    Self::Multi(MultiTicketInfo::new(center, BASE_SIZE_TM))
  }

  /// Call `consumer` once for every sector this query covers.
  pub fn enumerate_affected(&self, mut consumer: impl FnMut(SectorPos)) {
    match self {
      Self::Single(pos) => consumer(*pos),
      Self::Multi(multi) => multi.enumerate(&mut consumer),
    }
  }

  pub fn affected_sectors(&self) -> HashSet<SectorPos> {
    let mut out = HashSet::new();
    self.enumerate_affected(|pos| {
      out.insert(pos);
    });
    out
  }

  /// Whether switching from `prev` to `self` is worth a re-diff. Small
  /// movements of a multi ticket's center are ignored.
  pub fn should_update(&self, prev: &SectorTicketInfo) -> bool {
    match (self, prev) {
      (Self::Single(a), Self::Single(b)) => a != b,
      (Self::Multi(a), Self::Multi(b)) => {
        if a.base_radius != b.base_radius || a.per_level_scale != b.per_level_scale {
          return true;
        }
        a.center.distance(b.center) >= MULTI_UPDATE_THRESHOLD * a.base_radius
      }
      _ => true,
    }
  }
}

/// Positions to load and unload after one diff.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TicketDiff {
  pub load: SmallVec<[SectorPos; 8]>,
  pub unload: SmallVec<[SectorPos; 8]>,
}

impl TicketDiff {
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.load.is_empty() && self.unload.is_empty()
  }
}

/// Per-ticket bookkeeping: the query the consumer wants, the query that is
/// currently applied, and the positions that query resolved to.
#[derive(Clone, Debug)]
pub struct TicketTracker {
  pub desired: SectorTicketInfo,
  applied: Option<SectorTicketInfo>,
  loaded: HashSet<SectorPos>,
}

impl TicketTracker {
  pub fn new(desired: SectorTicketInfo) -> Self {
    Self {
      desired,
      applied: None,
      loaded: HashSet::new(),
    }
  }

  /// Positions currently held by this ticket.
  #[inline]
  pub fn loaded(&self) -> &HashSet<SectorPos> {
    &self.loaded
  }

  /// Bring the applied query up to `desired`, returning only the positions
  /// that entered or left the covered set.
  pub fn diff(&mut self) -> TicketDiff {
    if let Some(applied) = &self.applied {
      if !self.desired.should_update(applied) {
        return TicketDiff::default();
      }
    }

    let next = self.desired.affected_sectors();
    let mut diff = TicketDiff::default();
    diff.load.extend(next.difference(&self.loaded).copied());
    diff.unload.extend(self.loaded.difference(&next).copied());
    // Deterministic application order.
    diff.load.sort_unstable();
    diff.unload.sort_unstable();

    self.loaded = next;
    self.applied = Some(self.desired.clone());
    diff
  }

  /// Release everything; used when the ticket is removed.
  pub fn release(&mut self) -> Vec<SectorPos> {
    self.applied = None;
    let mut out: Vec<SectorPos> = self.loaded.drain().collect();
    out.sort_unstable();
    out
  }
}

#[cfg(test)]
#[path = "ticket_test.rs"]
mod ticket_test;
