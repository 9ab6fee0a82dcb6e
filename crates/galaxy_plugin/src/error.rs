//! Galaxy errors.

use galaxy_accrete::AccreteError;
use thiserror::Error;

use crate::sector_pos::GalaxySectorId;
use crate::threading::TaskError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GalaxyError {
  /// The summary index is past the end of the sector's elements.
  #[error("system {id} is out of range (sector holds {len} elements)")]
  ElementIndexOutOfRange { id: GalaxySectorId, len: usize },

  /// No generation layer with this id is registered.
  #[error("no generation layer with id {0}")]
  UnknownLayer(u32),

  /// A layer with this id is already registered.
  #[error("generation layer {0} is already registered")]
  DuplicateLayer(u32),

  /// The summary holds non-finite values and cannot be expanded.
  #[error("summary of system {0} is not finite")]
  NonFiniteSummary(GalaxySectorId),

  #[error(transparent)]
  Accrete(#[from] AccreteError),

  #[error(transparent)]
  Task(#[from] TaskError),
}
