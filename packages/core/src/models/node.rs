//! Tree Node Instances
//!
//! This module defines `TreeNode`, one occurrence of an entity at a specific
//! tree position, and the per-relation expansion state attached to it.
//!
//! # Position Identity vs Entity Identity
//!
//! The same backend entity can occupy several positions of the active tree
//! (as a sibling run member here, a separately expanded parent there). Each
//! position gets its own `tree_id` (a v4 UUID string); the backend entity id
//! is only a reference into the shared entity store.
//!
//! # Expansion State
//!
//! For every relation a node carries a [`RelationSlot`]. Its
//! [`RelationState`] makes the fold-cache invariant structural: a relation
//! is never "expanded and folded at the same time" because both states own
//! the id list exclusively.
//!
//! - `NotFetched`: never loaded, a toggle must fetch
//! - `Folded(ids)`: loaded before, subtree folded away, a toggle restores
//!   it without any network round trip
//! - `Expanded(ids)`: subtree currently visible

use crate::models::Relation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one node instance within the active tree.
///
/// Distinct from the backend entity id: two instances of the same entity
/// have different tree ids.
pub type TreeId = String;

/// Expansion state of one relation on one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "state", content = "treeIds")]
pub enum RelationState {
    #[default]
    NotFetched,
    /// Fetched earlier, subtree currently folded away. The ids stay alive in
    /// the arena so re-expansion needs no fetch.
    Folded(Vec<TreeId>),
    /// Subtree currently present. For children/parents the list is the
    /// nested level below this node; for siblings/spouses it is a view of
    /// the run spliced into the owning list.
    Expanded(Vec<TreeId>),
}

impl RelationState {
    pub fn is_not_fetched(&self) -> bool {
        matches!(self, RelationState::NotFetched)
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, RelationState::Expanded(_))
    }

    pub fn is_folded(&self) -> bool {
        matches!(self, RelationState::Folded(_))
    }

    /// The expanded id list, if any.
    pub fn expanded_ids(&self) -> Option<&[TreeId]> {
        match self {
            RelationState::Expanded(ids) => Some(ids),
            _ => None,
        }
    }
}

/// Per-relation slot: expansion state plus the in-flight marker the
/// presentation layer renders spinners from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelationSlot {
    pub state: RelationState,
    /// Set synchronously when a fetch starts, cleared on success and failure.
    pub loading: bool,
}

/// Back-link from a node to the list that holds it.
///
/// `holder` is the node whose `relation` list (children or parents) contains
/// this node. Sibling and spouse runs are spliced into the holder's list, so
/// splice bookkeeping starts from here instead of a tree walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub holder: TreeId,
    pub relation: Relation,
}

/// One position of the active visualization tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Unique within the tree, even when two instances share an entity id
    pub tree_id: TreeId,

    /// Reference into the shared entity store
    pub entity_id: String,

    /// Set only on the single root instance. Members of the root's own
    /// sibling/spouse runs are not roots; like the root they have no owner
    /// (see [`TreeNode::is_detached`]).
    pub is_root: bool,

    /// Member of a spliced sibling run
    pub is_sibling: bool,

    /// Member of a spliced spouse run
    pub is_spouse: bool,

    /// The list holding this node (None only for the root and for members
    /// of the root's own sibling/spouse runs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,

    pub children: RelationSlot,
    pub parents: RelationSlot,
    pub siblings: RelationSlot,
    pub spouses: RelationSlot,
}

impl TreeNode {
    /// Create the root instance for an entity.
    pub fn new_root(entity_id: impl Into<String>) -> Self {
        let mut node = Self::new(entity_id, None);
        node.is_root = true;
        node
    }

    /// Create a non-root instance. `owner` is `None` for members of the
    /// root's own sibling/spouse runs, which belong to no list.
    pub fn new(entity_id: impl Into<String>, owner: Option<Owner>) -> Self {
        Self {
            tree_id: Uuid::new_v4().to_string(),
            entity_id: entity_id.into(),
            is_root: false,
            is_sibling: false,
            is_spouse: false,
            owner,
            children: RelationSlot::default(),
            parents: RelationSlot::default(),
            siblings: RelationSlot::default(),
            spouses: RelationSlot::default(),
        }
    }

    /// Whether this node belongs to no owning list: the root itself and
    /// members of the root's own sibling/spouse runs. Detached nodes store
    /// their sibling/spouse runs on their own slots instead of splicing.
    pub fn is_detached(&self) -> bool {
        self.owner.is_none()
    }

    pub fn slot(&self, relation: Relation) -> &RelationSlot {
        match relation {
            Relation::Children => &self.children,
            Relation::Parents => &self.parents,
            Relation::Siblings => &self.siblings,
            Relation::Spouses => &self.spouses,
        }
    }

    pub fn slot_mut(&mut self, relation: Relation) -> &mut RelationSlot {
        match relation {
            Relation::Children => &mut self.children,
            Relation::Parents => &mut self.parents,
            Relation::Siblings => &mut self.siblings,
            Relation::Spouses => &mut self.spouses,
        }
    }
}
