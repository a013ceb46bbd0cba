//! bf-state: Edit sessions, undo/redo, drafts, snapshots
//!
//! Provides the command layer on top of bf-core with full undo/redo support.

mod commands;
mod draft;
mod history;
mod preferences;
mod session;
mod snapshot;
mod stage;

pub use commands::*;
pub use draft::*;
pub use history::*;
pub use preferences::*;
pub use session::*;
pub use snapshot::*;
