//! Seed derivation.
//!
//! Every random decision in a sector is drawn from a stream whose seed is a
//! pure function of the galaxy seed and the sector's address, so any sector
//! can be regenerated alone, on any thread, in any order.

use crate::sector_pos::SectorPos;

#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
  x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
  x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
  x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
  x ^ (x >> 31)
}

#[inline]
fn zigzag_i32(value: i32) -> u64 {
  let v = value as i64;
  ((v << 1) ^ (v >> 63)) as u64
}

/// Seed of one sector.
pub fn sector_seed(galaxy_seed: u64, pos: SectorPos) -> u64 {
  let mut x = galaxy_seed ^ 0x9E37_79B9_7F4A_7C15;
  x ^= (pos.level as u64).wrapping_mul(0xD1B5_4A32_D192_ED03);
  x = splitmix64(x);
  x ^= zigzag_i32(pos.coords.x).wrapping_mul(0xBF58_476D_1CE4_E5B9);
  x = splitmix64(x);
  x ^= zigzag_i32(pos.coords.y).wrapping_mul(0x94D0_49BB_1331_11EB);
  x = splitmix64(x);
  x ^= zigzag_i32(pos.coords.z).wrapping_mul(0xD6E8_FEB8_6659_FD93);
  splitmix64(x)
}

/// Seed of one layer's stream within a sector.
#[inline]
pub fn layer_seed(sector_seed: u64, layer_id: u32) -> u64 {
  splitmix64(sector_seed ^ (layer_id as u64).wrapping_mul(0xA24B_AED4_963E_E407))
}

/// Map a hash to `[0, 1)` using its top 53 bits.
#[inline]
pub fn unit_f64(hash: u64) -> f64 {
  (hash >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

#[cfg(test)]
mod tests {
  use super::*;
  use glam::IVec3;

  #[test]
  fn test_sector_seed_depends_on_every_coordinate() {
    let base = SectorPos::new(0, IVec3::new(1, 2, 3));
    let seed = sector_seed(42, base);
    assert_eq!(seed, sector_seed(42, base));
    assert_ne!(seed, sector_seed(43, base));
    assert_ne!(seed, sector_seed(42, SectorPos::new(1, IVec3::new(1, 2, 3))));
    assert_ne!(seed, sector_seed(42, SectorPos::new(0, IVec3::new(-1, 2, 3))));
    assert_ne!(seed, sector_seed(42, SectorPos::new(0, IVec3::new(1, 3, 2))));
    assert_ne!(seed, sector_seed(42, SectorPos::new(0, IVec3::new(1, 2, 4))));
  }

  #[test]
  fn test_layer_seed_separates_layers() {
    assert_ne!(layer_seed(7, 0), layer_seed(7, 1));
  }

  #[test]
  fn test_unit_f64_range() {
    assert_eq!(unit_f64(0), 0.0);
    assert!(unit_f64(u64::MAX) < 1.0);
  }
}
