//! Packed star-system summaries.
//!
//! Each sector stores its summaries as two flat arrays instead of a `Vec` of
//! structs, so a complete sector is three allocations regardless of how many
//! stars it holds.
//!
//! ```text
//! floats: [ x y z age mass lum temp | x y z age mass lum temp | ... ]   7 per entry
//! ints:   [ layer seed_lo seed_hi   | layer seed_lo seed_hi   | ... ]   3 per entry
//! ```
//!
//! Positions are stored as `f32` offsets from the sector's minimum corner,
//! which keeps them precise at any distance from the galactic origin.

use glam::DVec3;

const FLOAT_STRIDE: usize = 7;
const INT_STRIDE: usize = 3;

/// One unpacked summary.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementHolder {
  /// Absolute position, Tm.
  pub system_pos: DVec3,
  pub seed: u64,
  /// Id of the generation layer that produced this entry.
  pub generation_layer: u32,
  pub age_myr: f64,
  pub mass_yg: f64,
  pub luminosity_lsol: f64,
  pub temperature_k: f64,
}

impl ElementHolder {
  /// Whether every numeric field is finite.
  pub fn is_finite(&self) -> bool {
    self.system_pos.is_finite()
      && self.age_myr.is_finite()
      && self.mass_yg.is_finite()
      && self.luminosity_lsol.is_finite()
      && self.temperature_k.is_finite()
  }
}

/// Struct-of-arrays store for the summaries of one sector.
///
/// Entries are appended and never reordered; an entry's index is its
/// permanent address within the sector.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedSectorElements {
  origin: DVec3,
  floats: Vec<f32>,
  ints: Vec<i32>,
  capacity: usize,
  len: usize,
}

impl PackedSectorElements {
  pub fn new(origin: DVec3) -> Self {
    Self {
      origin,
      floats: Vec::new(),
      ints: Vec::new(),
      capacity: 0,
      len: 0,
    }
  }

  #[inline]
  pub fn origin(&self) -> DVec3 {
    self.origin
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Make room for at least `additional` more entries. Growth at least
  /// doubles the current capacity.
  pub fn reserve(&mut self, additional: usize) {
    let desired = self.len + additional;
    if desired <= self.capacity {
      return;
    }
    let new_capacity = desired.max(2 * self.capacity);
    self.floats.resize(new_capacity * FLOAT_STRIDE, 0.0);
    self.ints.resize(new_capacity * INT_STRIDE, 0);
    self.capacity = new_capacity;
  }

  /// Write `elem` into slot `index`. The slot only becomes visible once
  /// covered by [`mark_written`]. Returns `false` (writing nothing) when
  /// `index` is not below the capacity.
  ///
  /// [`mark_written`]: Self::mark_written
  pub fn store(&mut self, elem: &ElementHolder, index: usize) -> bool {
    if index >= self.capacity {
      return false;
    }
    let rel = elem.system_pos - self.origin;

    let f = &mut self.floats[index * FLOAT_STRIDE..(index + 1) * FLOAT_STRIDE];
    f[0] = rel.x as f32;
    f[1] = rel.y as f32;
    f[2] = rel.z as f32;
    f[3] = elem.age_myr as f32;
    f[4] = elem.mass_yg as f32;
    f[5] = elem.luminosity_lsol as f32;
    f[6] = elem.temperature_k as f32;

    let i = &mut self.ints[index * INT_STRIDE..(index + 1) * INT_STRIDE];
    i[0] = elem.generation_layer as i32;
    i[1] = elem.seed as u32 as i32;
    i[2] = (elem.seed >> 32) as u32 as i32;
    true
  }

  /// Extend the visible length by `count` slots written with [`store`].
  ///
  /// [`store`]: Self::store
  pub fn mark_written(&mut self, count: usize) {
    debug_assert!(self.len + count <= self.capacity);
    self.len = (self.len + count).min(self.capacity);
  }

  /// Append one entry and return its index.
  pub fn push(&mut self, elem: &ElementHolder) -> usize {
    self.reserve(1);
    let index = self.len;
    let stored = self.store(elem, index);
    debug_assert!(stored, "reserve left no room");
    self.mark_written(1);
    index
  }

  /// Fill `out` from entry `index`. Returns `false` (leaving `out` alone)
  /// when the index is past the end.
  pub fn load(&self, out: &mut ElementHolder, index: usize) -> bool {
    if index >= self.len {
      return false;
    }
    let f = &self.floats[index * FLOAT_STRIDE..(index + 1) * FLOAT_STRIDE];
    let i = &self.ints[index * INT_STRIDE..(index + 1) * INT_STRIDE];

    out.system_pos = self.origin + DVec3::new(f[0] as f64, f[1] as f64, f[2] as f64);
    out.age_myr = f[3] as f64;
    out.mass_yg = f[4] as f64;
    out.luminosity_lsol = f[5] as f64;
    out.temperature_k = f[6] as f64;
    out.generation_layer = i[0] as u32;
    out.seed = (i[1] as u32 as u64) | ((i[2] as u32 as u64) << 32);
    true
  }

  pub fn get(&self, index: usize) -> Option<ElementHolder> {
    let mut out = ElementHolder::default();
    self.load(&mut out, index).then_some(out)
  }

  pub fn iter(&self) -> impl Iterator<Item = ElementHolder> + '_ {
    (0..self.len).filter_map(move |index| self.get(index))
  }

  /// Drop unused capacity after a generation pass.
  pub fn shrink_to_fit(&mut self) {
    self.floats.truncate(self.len * FLOAT_STRIDE);
    self.ints.truncate(self.len * INT_STRIDE);
    self.floats.shrink_to_fit();
    self.ints.shrink_to_fit();
    self.capacity = self.len;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn holder(i: u64) -> ElementHolder {
    ElementHolder {
      system_pos: DVec3::new(1000.0 + i as f64, 2000.0, 3000.5),
      seed: 0xDEAD_BEEF_0000_0000 | i,
      generation_layer: 2,
      age_myr: 4600.0,
      mass_yg: 1.989e9,
      luminosity_lsol: 1.0,
      temperature_k: 5772.0,
    }
  }

  #[test]
  fn test_push_and_load() {
    let mut elements = PackedSectorElements::new(DVec3::splat(1000.0));
    assert_eq!(elements.push(&holder(0)), 0);
    assert_eq!(elements.push(&holder(1)), 1);

    let back = elements.get(1).unwrap();
    assert_eq!(back.seed, holder(1).seed);
    assert_eq!(back.generation_layer, 2);
    assert_eq!(back.system_pos, DVec3::new(1001.0, 2000.0, 3000.5));
    assert_eq!(back.temperature_k, 5772.0);
    assert!(elements.get(2).is_none());
  }

  /// Seeds with the high bit set survive the split into two ints.
  #[test]
  fn test_seed_high_bits() {
    let mut elements = PackedSectorElements::new(DVec3::ZERO);
    let mut elem = holder(0);
    elem.seed = u64::MAX - 1;
    elements.push(&elem);
    assert_eq!(elements.get(0).unwrap().seed, u64::MAX - 1);
  }

  #[test]
  fn test_reserve_doubles() {
    let mut elements = PackedSectorElements::new(DVec3::ZERO);
    elements.reserve(3);
    assert_eq!(elements.capacity(), 3);
    for i in 0..4 {
      elements.push(&holder(i));
    }
    assert_eq!(elements.capacity(), 6);
  }

  #[test]
  fn test_store_then_mark_written() {
    let mut elements = PackedSectorElements::new(DVec3::ZERO);
    elements.reserve(2);
    assert!(elements.store(&holder(0), 0));
    assert!(elements.store(&holder(1), 1));
    assert!(elements.is_empty());
    elements.mark_written(2);
    assert_eq!(elements.iter().count(), 2);
  }

  #[test]
  fn test_store_past_capacity_is_rejected() {
    let mut elements = PackedSectorElements::new(DVec3::ZERO);
    elements.reserve(1);
    assert!(!elements.store(&holder(3), 1));
    assert!(!elements.store(&holder(3), usize::MAX / 2));
    elements.mark_written(1);
    assert_eq!(elements.get(0).unwrap().seed, 0);
  }

  #[test]
  fn test_shrink_to_fit() {
    let mut elements = PackedSectorElements::new(DVec3::ZERO);
    elements.reserve(100);
    elements.push(&holder(7));
    elements.shrink_to_fit();
    assert_eq!(elements.capacity(), 1);
    assert_eq!(elements.get(0).unwrap().seed, holder(7).seed);
  }
}
