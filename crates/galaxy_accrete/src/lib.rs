//! galaxy_accrete - planetary accretion and stellar physics
//!
//! Engine independent. Takes the bulk properties of a single star and grows a
//! planetary system around it by sweeping dust out of a protoplanetary disc,
//! then hands back a hierarchical body tree with analytic orbits.
//!
//! # Features
//!
//! - **Dust bands**: ordered radial intervals of remaining gas/dust
//! - **Planetesimals**: arena-allocated bodies with moon links by index
//! - **Disc collapse**: Dole-style accretion with collision, capture and
//!   ring formation
//! - **Stellar model**: analytic main sequence fits plus remnant tracks
//!
//! # Example
//!
//! ```ignore
//! use galaxy_accrete::units::YG_PER_MSOL;
//! use galaxy_accrete::{AccreteContext, AccreteParams, CelestialNode, ProtoplanetaryDisc, StellarProperties};
//!
//! let star = StellarProperties::from_initial(1.0 * YG_PER_MSOL, 4600.0, 0.0122);
//! let ctx = AccreteContext::new(AccreteParams::default(), &star, 0xC0FFEE)?;
//! let mut disc = ProtoplanetaryDisc::new(ctx)?;
//! disc.collapse_disc();
//!
//! let mut root = CelestialNode::from_star(star);
//! disc.convert_into(&mut root);
//! println!("{} bodies", root.body_count());
//! ```

pub mod body;
pub mod context;
pub mod disc;
pub mod dust_bands;
pub mod error;
pub mod interval;
pub mod orbit;
pub mod params;
pub mod planetesimal;
pub mod stellar;
pub mod units;

pub use body::{BodyKind, CelestialNode, CelestialRing, OrbitingBody};
pub use context::AccreteContext;
pub use disc::ProtoplanetaryDisc;
pub use dust_bands::{DustBand, DustBands};
pub use error::AccreteError;
pub use interval::Interval;
pub use orbit::{Orbit, OrbitalShape};
pub use params::AccreteParams;
pub use planetesimal::{Planetesimal, PlanetesimalArena, PlanetesimalId, Ring};
pub use stellar::{SpectralClass, StarType, StellarProperties};
