//! Generation layer interface.
//!
//! A galaxy runs its layers in registration order to fill a sector, and
//! hands every summary back to the layer that produced it for expansion.

use glam::DVec3;

use crate::bounds::DAabb3;
use crate::config::GalaxyConfig;
use crate::density::DensityField;
use crate::elements::{ElementHolder, PackedSectorElements};
use crate::error::GalaxyError;
use crate::sector_pos::{GalaxySectorId, SectorPos};
use crate::system::StarSystem;

/// Read-only inputs for generating one sector.
pub struct LayerContext<'a> {
  pub config: &'a GalaxyConfig,
  pub density: &'a dyn DensityField,
  pub pos: SectorPos,
  /// Sector seed; layers mix in their own id before drawing from it.
  pub seed: u64,
}

impl LayerContext<'_> {
  #[inline]
  pub fn bounds(&self) -> DAabb3 {
    self.pos.bounds()
  }

  #[inline]
  pub fn volume_min(&self) -> DVec3 {
    self.pos.min_bound()
  }
}

/// One stage of sector generation.
///
/// Implementations run on worker threads and must be deterministic in
/// their inputs.
pub trait GalaxyGenerationLayer: Send + Sync {
  /// Unique per galaxy; stored in every summary this layer writes.
  fn layer_id(&self) -> u32;

  /// Append this layer's summaries for `ctx.pos` to `out`.
  fn generate_into(&self, ctx: &LayerContext<'_>, out: &mut PackedSectorElements);

  /// Expand one of this layer's summaries into a full system.
  fn generate_full_system(
    &self,
    config: &GalaxyConfig,
    id: GalaxySectorId,
    summary: &ElementHolder,
  ) -> Result<StarSystem, GalaxyError>;
}
