//! Data Model
//!
//! Core data structures of the expansion engine:
//!
//! - [`Entity`] - backend payload, shared by reference across tree positions
//! - [`TreeNode`] - one position of the active tree, with per-relation
//!   expansion state
//! - [`Relation`] - the four traversal relations and their placement rules
//! - [`Fit`] - derived viewport hint recomputed after every mutation

pub mod entity;
pub mod fit;
pub mod node;
pub mod relation;

pub use entity::Entity;
pub use fit::Fit;
pub use node::{Owner, RelationSlot, RelationState, TreeId, TreeNode};
pub use relation::{Relation, TreeView};
