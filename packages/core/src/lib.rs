//! KinTree Core Expansion Engine
//!
//! This crate implements the tree expansion/collapse and cache-coherence
//! engine behind an expandable genealogical/relationship graph whose nodes
//! are fetched lazily from knowledge-base backends.
//!
//! # Architecture
//!
//! - **Arena of node instances**: every tree position has its own `tree_id`;
//!   the same backend entity may occupy several positions at once
//! - **Structural fold cache**: per node and relation, a tagged state
//!   (`NotFetched | Folded | Expanded`) decides between fetch, reuse, and
//!   fold without a separate cache object
//! - **Spliced runs**: siblings and spouses do not open a nested level,
//!   they are inserted as a contiguous run next to their anchor inside an
//!   existing list, and removed only as a whole
//! - **Single logical thread**: mutations are synchronous sections under
//!   one lock; fetches suspend only their own toggle and re-locate their
//!   target when they resolve
//!
//! # Modules
//!
//! - [`models`] - Entity, TreeNode, Relation, Fit
//! - [`tree`] - the arena: locator, materialization, run splicing
//! - [`services`] - TreeService plus the fetcher/bookmark trait seams

pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use models::*;
pub use services::*;
pub use tree::*;
