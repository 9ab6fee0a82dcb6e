//! galaxy_plugin - Framework/engine independent galaxy sector cache
//!
//! Splits a galaxy into an octree of cubic sectors, fills the sectors the
//! consumer asks for with star-system summaries on a worker pool, and
//! expands single summaries into full planetary systems on demand.
//!
//! # Features
//!
//! - **Sector octree**: reference-counted loading with lazy branches, one
//!   tree per root coordinate
//! - **Tickets**: single-sector or multi-level sphere queries, diffed so a
//!   moving viewer only loads the edge of its volume
//! - **Deduplicated generation**: one task per sector, system expansion
//!   chained behind its sector without blocking a worker
//! - **Star placement**: IMF-driven star counts and rejection sampling
//!   against interpolated region masks
//! - **Expansion**: planetary accretion via `galaxy_accrete`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use galaxy_plugin::{ConstantDensityField, Galaxy, GalaxyConfig, SectorManager, SectorTicketInfo};
//!
//! let galaxy = Galaxy::new(GalaxyConfig::default(), Arc::new(ConstantDensityField::uniform(1.0)));
//! let mut manager = SectorManager::new(Arc::new(galaxy));
//!
//! let ticket = manager.create_sector_ticket(SectorTicketInfo::visual(camera_pos));
//! manager.force_load(ticket);
//! manager.enumerate(ticket, |pos, elements| {
//!     println!("{}: {} stars", pos, elements.len());
//! });
//! ```

pub mod bounds;
pub mod sector_pos;
pub use bounds::DAabb3;
pub use sector_pos::{GalaxySectorId, SectorPos, BASE_SIZE_TM, LEVEL_COUNT, ROOT_LEVEL};

// Packed per-sector summaries
pub mod elements;
pub use elements::{ElementHolder, PackedSectorElements};

// Reference-counted sector octree
pub mod sector;
pub use sector::{GalaxySector, SectorDebugInfo};

// Spatial interest queries
pub mod ticket;
pub use ticket::{MultiTicketInfo, SectorTicketInfo, TicketDiff, TicketTracker};

// Worker pool with futures
pub mod threading;
pub use threading::{Executor, TaskError, TaskHandle, TaskId};

// Generation inputs
pub mod config;
pub mod density;
pub mod imf;
pub mod mask_field;
pub mod seed;
pub use config::{GalaxyConfig, StarFormationHistory};
pub use density::{ConstantDensityField, DensityField, FnDensityField, Region, RegionWeights};

// Generation layers
pub mod base_layer;
pub mod layer;
pub use base_layer::BaseGalaxyGenerationLayer;
pub use layer::{GalaxyGenerationLayer, LayerContext};

pub mod error;
pub mod galaxy;
pub mod system;
pub use error::GalaxyError;
pub use galaxy::Galaxy;
pub use system::StarSystem;

// Ticket-driven cache
pub mod manager;
pub use manager::{SectorManager, SectorTicket, SystemTicket, TicketId};

// Engine-agnostic metrics (feature-gated)
pub mod metrics;
pub use metrics::GalaxyMetrics;
