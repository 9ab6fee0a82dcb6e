//! Galaxy - the immutable generation context shared by every worker.
//!
//! Holds the config, the density field and the ordered generation layers.
//! Both entry points are pure functions of their arguments and can be
//! called from any thread.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::base_layer::BaseGalaxyGenerationLayer;
use crate::config::GalaxyConfig;
use crate::density::DensityField;
use crate::elements::PackedSectorElements;
use crate::error::GalaxyError;
use crate::layer::{GalaxyGenerationLayer, LayerContext};
use crate::sector_pos::{GalaxySectorId, SectorPos};
use crate::seed::sector_seed;
use crate::system::StarSystem;

pub struct Galaxy {
  config: GalaxyConfig,
  density: Arc<dyn DensityField>,
  layers: Vec<Box<dyn GalaxyGenerationLayer>>,
}

impl Galaxy {
  /// Galaxy with the base star layer registered.
  pub fn new(config: GalaxyConfig, density: Arc<dyn DensityField>) -> Self {
    let base = BaseGalaxyGenerationLayer::new(&config);
    Self {
      config,
      density,
      layers: vec![Box::new(base)],
    }
  }

  /// Galaxy without any layers.
  pub fn empty(config: GalaxyConfig, density: Arc<dyn DensityField>) -> Self {
    Self {
      config,
      density,
      layers: Vec::new(),
    }
  }

  /// Append a layer. Layers run in registration order.
  pub fn add_layer(&mut self, layer: Box<dyn GalaxyGenerationLayer>) -> Result<(), GalaxyError> {
    let id = layer.layer_id();
    if self.layer(id).is_some() {
      warn!("Generation layer {} is already registered", id);
      return Err(GalaxyError::DuplicateLayer(id));
    }
    self.layers.push(layer);
    Ok(())
  }

  pub fn with_layer(mut self, layer: Box<dyn GalaxyGenerationLayer>) -> Result<Self, GalaxyError> {
    self.add_layer(layer)?;
    Ok(self)
  }

  #[inline]
  pub fn config(&self) -> &GalaxyConfig {
    &self.config
  }

  #[inline]
  pub fn density(&self) -> &dyn DensityField {
    self.density.as_ref()
  }

  #[inline]
  pub fn layer_count(&self) -> usize {
    self.layers.len()
  }

  fn layer(&self, id: u32) -> Option<&dyn GalaxyGenerationLayer> {
    self
      .layers
      .iter()
      .find(|layer| layer.layer_id() == id)
      .map(|layer| layer.as_ref())
  }

  #[inline]
  pub fn sector_seed(&self, pos: SectorPos) -> u64 {
    sector_seed(self.config.seed, pos)
  }

  /// Run every layer over `pos`.
  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "galaxy::generate_sector", fields(pos = %pos))
  )]
  pub fn generate_sector_elements(&self, pos: SectorPos) -> PackedSectorElements {
    let ctx = LayerContext {
      config: &self.config,
      density: self.density.as_ref(),
      pos,
      seed: self.sector_seed(pos),
    };

    let mut elements = PackedSectorElements::new(pos.min_bound());
    for layer in &self.layers {
      layer.generate_into(&ctx, &mut elements);
    }
    elements.shrink_to_fit();

    trace!(sector = %pos, count = elements.len(), "Generated sector");
    elements
  }

  /// Expand the summary at `id` out of its sector's `elements`.
  pub fn generate_full_system(
    &self,
    id: GalaxySectorId,
    elements: &PackedSectorElements,
  ) -> Result<StarSystem, GalaxyError> {
    let summary = elements
      .get(id.element_index as usize)
      .ok_or(GalaxyError::ElementIndexOutOfRange {
        id,
        len: elements.len(),
      })?;
    let layer = self
      .layer(summary.generation_layer)
      .ok_or(GalaxyError::UnknownLayer(summary.generation_layer))?;
    layer.generate_full_system(&self.config, id, &summary)
  }
}
