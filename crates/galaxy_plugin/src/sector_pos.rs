//! Sector addressing.
//!
//! A [`SectorPos`] names one cube of the galaxy octree by level and integer
//! grid coordinate. Level 0 is the finest; every level up doubles the edge
//! length, up to [`ROOT_LEVEL`] where the independent root trees live.
//!
//! ```text
//! level 7  |---------------------------------------------|  root, 1280 ly
//! level 6  |----------------------|----------------------|
//!   ...
//! level 0  |--|--|--|--|--|--|--|--|--|--|--|--|--|--|--|-|  10 ly
//! ```
//!
//! Coordinates are floored, so negative space works the same as positive:
//! the parent of `-1` is `-1`, not `0`.

use std::cmp::Ordering;
use std::fmt;

use galaxy_accrete::units::TM_PER_LY;
use glam::{DVec3, IVec3};

use crate::bounds::DAabb3;

/// Level of the root sectors.
pub const ROOT_LEVEL: u8 = 7;

/// Edge length of a level 0 sector, in Tm.
pub const BASE_SIZE_TM: f64 = 10.0 * TM_PER_LY;

/// Number of levels, finest to root inclusive.
pub const LEVEL_COUNT: usize = ROOT_LEVEL as usize + 1;

/// Edge length of a sector at `level`, in Tm.
#[inline]
pub fn size_for_level(level: u8) -> f64 {
  BASE_SIZE_TM * (1u64 << level) as f64
}

/// Position of a sector in the octree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectorPos {
  pub level: u8,
  pub coords: IVec3,
}

impl SectorPos {
  #[inline]
  pub const fn new(level: u8, coords: IVec3) -> Self {
    Self { level, coords }
  }

  /// Sector at `level` containing `pos` (Tm).
  pub fn from_position(level: u8, pos: DVec3) -> Self {
    let cell = (pos / size_for_level(level)).floor();
    Self::new(level, cell.as_ivec3())
  }

  /// Root sector containing the point `pos`.
  #[inline]
  pub fn root_containing(pos: DVec3) -> Self {
    Self::from_position(ROOT_LEVEL, pos)
  }

  #[inline]
  pub fn width(&self) -> f64 {
    size_for_level(self.level)
  }

  /// Parent one level up. `None` for roots.
  pub fn parent(&self) -> Option<Self> {
    if self.level >= ROOT_LEVEL {
      return None;
    }
    Some(Self::new(self.level + 1, self.coords.div_euclid(IVec3::splat(2))))
  }

  /// Child in `octant` (x = bit 0, y = bit 1, z = bit 2). `None` at level 0.
  pub fn child(&self, octant: u8) -> Option<Self> {
    if self.level == 0 {
      return None;
    }
    let offset = IVec3::new(
      (octant & 1) as i32,
      ((octant >> 1) & 1) as i32,
      ((octant >> 2) & 1) as i32,
    );
    Some(Self::new(self.level - 1, self.coords * 2 + offset))
  }

  /// Coordinates of the ancestor at `level`. Only meaningful for
  /// `level >= self.level`.
  #[inline]
  pub fn level_coords_at(&self, level: u8) -> IVec3 {
    debug_assert!(level >= self.level);
    let shift = (level - self.level) as u32;
    IVec3::new(
      self.coords.x >> shift,
      self.coords.y >> shift,
      self.coords.z >> shift,
    )
  }

  /// Whether this position lies inside some root tree.
  #[inline]
  pub fn is_in_tree(&self) -> bool {
    self.level <= ROOT_LEVEL
  }

  /// Coordinates of the root tree this sector belongs to. `None` above
  /// [`ROOT_LEVEL`].
  #[inline]
  pub fn root_coords(&self) -> Option<IVec3> {
    self.is_in_tree().then(|| self.level_coords_at(ROOT_LEVEL))
  }

  /// Octant of this sector inside its parent.
  #[inline]
  pub fn octant_in_parent(&self) -> u8 {
    let bit = |c: i32| (c & 1) as u8;
    bit(self.coords.x) | (bit(self.coords.y) << 1) | (bit(self.coords.z) << 2)
  }

  /// Whether `other` is this sector or one of its descendants.
  pub fn contains_pos(&self, other: &SectorPos) -> bool {
    other.level <= self.level && other.level_coords_at(self.level) == self.coords
  }

  #[inline]
  pub fn min_bound(&self) -> DVec3 {
    self.coords.as_dvec3() * self.width()
  }

  #[inline]
  pub fn max_bound(&self) -> DVec3 {
    self.min_bound() + DVec3::splat(self.width())
  }

  #[inline]
  pub fn center(&self) -> DVec3 {
    self.min_bound() + DVec3::splat(0.5 * self.width())
  }

  #[inline]
  pub fn bounds(&self) -> DAabb3 {
    DAabb3::new(self.min_bound(), self.max_bound())
  }
}

// Level first, then x, y, z.
impl Ord for SectorPos {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.level, self.coords.to_array()).cmp(&(other.level, other.coords.to_array()))
  }
}

impl PartialOrd for SectorPos {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for SectorPos {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "#L{}:({}, {}, {})",
      self.level, self.coords.x, self.coords.y, self.coords.z
    )
  }
}

/// A single star system: the sector it was generated in plus its index in
/// that sector's packed elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GalaxySectorId {
  pub sector_pos: SectorPos,
  pub element_index: u32,
}

impl GalaxySectorId {
  #[inline]
  pub const fn new(sector_pos: SectorPos, element_index: u32) -> Self {
    Self {
      sector_pos,
      element_index,
    }
  }
}

impl fmt::Display for GalaxySectorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{}", self.sector_pos, self.element_index)
  }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_size_doubles_per_level() {
    assert_eq!(size_for_level(0), BASE_SIZE_TM);
    for level in 0..ROOT_LEVEL {
      assert_eq!(size_for_level(level + 1), 2.0 * size_for_level(level));
    }
  }

  /// Negative coordinates floor towards negative infinity.
  #[test]
  fn test_parent_floors_negative_coords() {
    let pos = SectorPos::new(0, IVec3::new(-1, 3, -4));
    let parent = pos.parent().unwrap();
    assert_eq!(parent, SectorPos::new(1, IVec3::new(-1, 1, -2)));
    assert!(parent.contains_pos(&pos));
    assert_eq!(SectorPos::new(ROOT_LEVEL, IVec3::ZERO).parent(), None);
  }

  #[test]
  fn test_child_parent_roundtrip() {
    let pos = SectorPos::new(3, IVec3::new(5, -2, 0));
    for octant in 0..8 {
      let child = pos.child(octant).unwrap();
      assert_eq!(child.parent(), Some(pos));
      assert_eq!(child.octant_in_parent(), octant);
    }
    assert_eq!(SectorPos::new(0, IVec3::ZERO).child(0), None);
  }

  #[test]
  fn test_from_position_matches_bounds() {
    let p = DVec3::new(-1.0, 123_456.0, 9_999_999.0);
    for level in 0..=ROOT_LEVEL {
      let pos = SectorPos::from_position(level, p);
      assert!(pos.bounds().contains_point(p), "{} misses {}", pos, p);
    }
  }

  #[test]
  fn test_root_coords() {
    let pos = SectorPos::from_position(0, DVec3::new(-1.0, 0.0, size_for_level(ROOT_LEVEL)));
    assert_eq!(pos.root_coords(), Some(IVec3::new(-1, 0, 1)));
    let root = SectorPos::root_containing(DVec3::new(-1.0, 0.0, size_for_level(ROOT_LEVEL)));
    assert_eq!(Some(root.coords), pos.root_coords());
  }

  #[test]
  fn test_above_root_has_no_tree() {
    let root = SectorPos::new(ROOT_LEVEL, IVec3::new(3, -2, 0));
    assert!(root.is_in_tree());
    assert_eq!(root.root_coords(), Some(root.coords));

    let above = SectorPos::new(ROOT_LEVEL + 1, IVec3::ZERO);
    assert!(!above.is_in_tree());
    assert_eq!(above.root_coords(), None);
    assert!(!root.contains_pos(&above));
  }

  #[test]
  fn test_display() {
    let pos = SectorPos::new(2, IVec3::new(1, -2, 3));
    assert_eq!(pos.to_string(), "#L2:(1, -2, 3)");
    assert_eq!(GalaxySectorId::new(pos, 17).to_string(), "#L2:(1, -2, 3)#17");
  }
}
