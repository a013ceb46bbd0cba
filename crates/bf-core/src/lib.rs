//! bf-core: Bracket graph model and invariant engines for BracketForge
//!
//! This crate owns the node/edge data model, the graph store, and the pure
//! validators every edit passes through: cycle detection, default-edge
//! resolution, podium positions and the structural minimum.

mod error;
mod graph;
mod model;

pub mod cycle;
pub mod default_edge;
pub mod invariants;
pub mod podium;
pub mod structure;

pub use error::*;
pub use graph::*;
pub use model::*;

pub use invariants::check_invariants;

/// Default capacity for newly created match nodes
pub const DEFAULT_MATCH_CAPACITY: u32 = 2;

/// Lowest allowed match capacity
pub const MIN_MATCH_CAPACITY: u32 = 1;

/// Highest allowed match capacity. Slots are allocated up front.
pub const MAX_MATCH_CAPACITY: u32 = 1024;
