//! Tree Structure Layer
//!
//! The arena holding node instances and the structural primitives (locate,
//! materialize, run splicing) the relation mutators are built from.

pub mod arena;

pub use arena::{ArenaError, RunBounds, TreeArena};
