//! # Search Model
//!
//! Plain data that crosses every boundary: codec ↔ substrate ↔ propagator
//! ↔ merger ↔ coordinator.
//!
//! Design rule: this module is pure data: no I/O, no state, no async.

pub mod node;
pub mod distance;
pub mod emission;
pub mod dataset;

pub use node::{NodeId, NodeRecord};
pub use distance::{Distance, UNKNOWN_RAW};
pub use emission::{Emission, EmittedValue, Emissions};
pub use dataset::RoundDataset;
