//! Node Arena and Locator
//!
//! `TreeArena` owns every node instance of the active tree, keyed by
//! `tree_id`, together with the entity store shared by reference across
//! positions. Relation lists hold tree ids rather than embedded payloads, so
//! the same entity can appear at several positions without duplication.
//!
//! The arena provides the three structural primitives the relation mutators
//! are built from:
//!
//! - **Locate**: O(1) id lookup combined with a reachability check through
//!   the expanded lists of one view. A node folded away by a concurrent
//!   collapse is reported as "not found", which callers treat as a no-op.
//! - **Materialize**: instance creation from fetched entities, wiring the
//!   owner back-link splice bookkeeping needs.
//! - **Run splicing**: insertion and boundary-scanned removal of contiguous
//!   sibling/spouse runs inside an owning list.

use crate::models::{Entity, Owner, Relation, RelationState, TreeId, TreeNode, TreeView};
use std::collections::HashMap;
use thiserror::Error;

/// Structural failures inside the arena.
///
/// These indicate an inconsistent tree shape around one mutation target;
/// they abort that mutation only and leave unrelated subtrees untouched.
#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("no node instance {tree_id} in the arena")]
    UnknownNode { tree_id: String },

    #[error("node {holder} has no expanded {relation} list")]
    ListMissing { holder: String, relation: Relation },

    #[error("anchor {anchor} is not in the {relation} list of {holder}")]
    AnchorNotInList {
        anchor: String,
        holder: String,
        relation: Relation,
    },

    #[error("{relation} run at {anchor} has an inconsistent boundary: scanned {scanned} tagged neighbors, cache holds {cached}")]
    RunMismatch {
        anchor: String,
        relation: Relation,
        scanned: usize,
        cached: usize,
    },

    #[error("insert index {index} out of bounds for {relation} list of {holder} (len {len})")]
    IndexOutOfBounds {
        holder: String,
        relation: Relation,
        index: usize,
        len: usize,
    },
}

/// Location of a contiguous sibling/spouse run inside an owning list,
/// computed by a boundary scan and validated against the anchor's cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunBounds {
    pub holder: TreeId,
    pub relation: Relation,
    pub start: usize,
    pub len: usize,
}

/// Arena of node instances plus the shared entity store.
#[derive(Debug, Default)]
pub struct TreeArena {
    nodes: HashMap<TreeId, TreeNode>,
    entities: HashMap<String, Entity>,
    root: Option<TreeId>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the whole tree and install a fresh root for `entity`.
    ///
    /// Every node instance, fold cache, and the previous entity store are
    /// dropped; the session starts over.
    pub fn reset(&mut self, entity: Entity) -> TreeId {
        self.nodes.clear();
        self.entities.clear();

        let root = TreeNode::new_root(entity.id.clone());
        let root_id = root.tree_id.clone();
        self.entities.insert(entity.id.clone(), entity);
        self.nodes.insert(root_id.clone(), root);
        self.root = Some(root_id.clone());
        root_id
    }

    pub fn root_id(&self) -> Option<&TreeId> {
        self.root.as_ref()
    }

    pub fn node(&self, tree_id: &str) -> Option<&TreeNode> {
        self.nodes.get(tree_id)
    }

    pub fn node_mut(&mut self, tree_id: &str) -> Option<&mut TreeNode> {
        self.nodes.get_mut(tree_id)
    }

    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.get(entity_id)
    }

    /// The entity payload behind a node instance.
    pub fn entity_of(&self, node: &TreeNode) -> Option<&Entity> {
        self.entities.get(&node.entity_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Resolve a node by id within one view.
    ///
    /// Performs the O(1) arena lookup, then verifies the instance is still
    /// reachable from the root through *expanded* lists of the view's nested
    /// relation. Returns `None` when the node never existed, or when it has
    /// been folded away or removed since the caller last saw it. A miss is a
    /// defined no-op for mutation entry points, not an error.
    ///
    /// Re-run at every mutation entry and at every fetch resumption; results
    /// are never cached across mutations.
    pub fn locate(&self, view: TreeView, tree_id: &str) -> Option<&TreeNode> {
        let target = self.nodes.get(tree_id)?;
        let root = self.root.as_deref()?;
        let nested = view.nested_relation();
        // Non-root runs are spliced into nested lists already; following the
        // run slot as well makes the root's own runs reachable.
        let run = view.run_relation();

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if current == tree_id {
                return Some(target);
            }
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for relation in [nested, run] {
                if let RelationState::Expanded(ids) = &node.slot(relation).state {
                    stack.extend(ids.iter().map(|id| id.as_str()));
                }
            }
        }
        None
    }

    /// Store `entity` and create one node instance for it.
    ///
    /// An already known entity id overwrites the shared payload; the
    /// instance is always new.
    pub fn materialize(&mut self, entity: Entity, owner: Option<Owner>) -> TreeId {
        let node = TreeNode::new(entity.id.clone(), owner);
        let tree_id = node.tree_id.clone();
        self.entities.insert(entity.id.clone(), entity);
        self.nodes.insert(tree_id.clone(), node);
        tree_id
    }

    /// Materialize a fetched run for `relation`, tagging sibling/spouse
    /// members. Returns the new tree ids in fetch order.
    pub fn materialize_run(
        &mut self,
        entities: Vec<Entity>,
        owner: Option<Owner>,
        relation: Relation,
    ) -> Vec<TreeId> {
        entities
            .into_iter()
            .map(|entity| {
                let tree_id = self.materialize(entity, owner.clone());
                let node = self
                    .nodes
                    .get_mut(&tree_id)
                    .expect("just inserted instance");
                match relation {
                    Relation::Siblings => node.is_sibling = true,
                    Relation::Spouses => node.is_spouse = true,
                    Relation::Children | Relation::Parents => {}
                }
                tree_id
            })
            .collect()
    }

    /// Index of `target` in the expanded `relation` list of `holder`.
    pub fn index_in_list(
        &self,
        holder: &str,
        relation: Relation,
        target: &str,
    ) -> Result<usize, ArenaError> {
        let list = self.expanded_list(holder, relation)?;
        list.iter()
            .position(|id| id == target)
            .ok_or_else(|| ArenaError::AnchorNotInList {
                anchor: target.to_string(),
                holder: holder.to_string(),
                relation,
            })
    }

    /// Insert `run` into the expanded `relation` list of `holder` at `index`,
    /// pushing the element currently at `index` (and everything after it) to
    /// the right.
    pub fn insert_run(
        &mut self,
        holder: &str,
        relation: Relation,
        index: usize,
        run: &[TreeId],
    ) -> Result<(), ArenaError> {
        let holder_id = holder.to_string();
        let node = self
            .nodes
            .get_mut(holder)
            .ok_or(ArenaError::UnknownNode { tree_id: holder_id })?;
        let RelationState::Expanded(list) = &mut node.slot_mut(relation).state else {
            return Err(ArenaError::ListMissing {
                holder: holder.to_string(),
                relation,
            });
        };
        if index > list.len() {
            return Err(ArenaError::IndexOutOfBounds {
                holder: holder.to_string(),
                relation,
                index,
                len: list.len(),
            });
        }
        list.splice(index..index, run.iter().cloned());
        Ok(())
    }

    /// Find the sibling run of `anchor` inside its owning list.
    ///
    /// Scans backward from the position before the anchor while neighbors
    /// are sibling-tagged; the whole tagged stretch is the run to fold. The
    /// stretch may be longer than the anchor's own cache when a run member
    /// expanded siblings of its own — those inner runs sit inside the
    /// stretch and travel with it, so re-expansion restores them in place.
    /// The anchor's cached ids cross-check the boundary: all of them must
    /// be inside the stretch, otherwise the shape around the anchor is
    /// inconsistent and the fold is refused.
    pub fn sibling_run_bounds(&self, anchor: &str) -> Result<RunBounds, ArenaError> {
        self.run_bounds(anchor, Relation::Siblings)
    }

    /// Find the spouse run of `anchor`: same contract as
    /// [`Self::sibling_run_bounds`], scanning forward from the position
    /// after the anchor over spouse-tagged neighbors.
    pub fn spouse_run_bounds(&self, anchor: &str) -> Result<RunBounds, ArenaError> {
        self.run_bounds(anchor, Relation::Spouses)
    }

    /// Remove a previously computed run from its owning list as a whole.
    /// Returns the removed ids in list order. Runs are never removed
    /// partially; the bounds come validated from the scan.
    pub fn remove_run(&mut self, bounds: &RunBounds) -> Result<Vec<TreeId>, ArenaError> {
        let node = self
            .nodes
            .get_mut(&bounds.holder)
            .ok_or_else(|| ArenaError::UnknownNode {
                tree_id: bounds.holder.clone(),
            })?;
        let RelationState::Expanded(list) = &mut node.slot_mut(bounds.relation).state else {
            return Err(ArenaError::ListMissing {
                holder: bounds.holder.clone(),
                relation: bounds.relation,
            });
        };
        Ok(list
            .splice(bounds.start..bounds.start + bounds.len, std::iter::empty())
            .collect())
    }

    fn expanded_list(&self, holder: &str, relation: Relation) -> Result<&[TreeId], ArenaError> {
        let node = self.nodes.get(holder).ok_or_else(|| ArenaError::UnknownNode {
            tree_id: holder.to_string(),
        })?;
        match &node.slot(relation).state {
            RelationState::Expanded(ids) => Ok(ids),
            _ => Err(ArenaError::ListMissing {
                holder: holder.to_string(),
                relation,
            }),
        }
    }

    fn run_bounds(&self, anchor: &str, relation: Relation) -> Result<RunBounds, ArenaError> {
        let anchor_node = self.nodes.get(anchor).ok_or_else(|| ArenaError::UnknownNode {
            tree_id: anchor.to_string(),
        })?;
        let owner = anchor_node
            .owner
            .clone()
            .ok_or_else(|| ArenaError::AnchorNotInList {
                anchor: anchor.to_string(),
                holder: "<root>".to_string(),
                relation,
            })?;
        let cached: &[TreeId] = match &anchor_node.slot(relation).state {
            RelationState::Expanded(ids) => ids,
            _ => &[],
        };

        let list = self.expanded_list(&owner.holder, owner.relation)?;
        let anchor_index =
            list.iter()
                .position(|id| id == anchor)
                .ok_or_else(|| ArenaError::AnchorNotInList {
                    anchor: anchor.to_string(),
                    holder: owner.holder.clone(),
                    relation: owner.relation,
                })?;

        let tagged = |id: &TreeId| {
            self.nodes.get(id).is_some_and(|n| match relation {
                Relation::Siblings => n.is_sibling,
                Relation::Spouses => n.is_spouse,
                _ => false,
            })
        };

        let (start, scanned) = match relation {
            Relation::Siblings => {
                // Scan backward over the tagged stretch before the anchor
                let mut start = anchor_index;
                while start > 0 && tagged(&list[start - 1]) {
                    start -= 1;
                }
                (start, anchor_index - start)
            }
            Relation::Spouses => {
                // Scan forward over the tagged stretch after the anchor
                let mut end = anchor_index + 1;
                while end < list.len() && tagged(&list[end]) {
                    end += 1;
                }
                (anchor_index + 1, end - anchor_index - 1)
            }
            _ => (anchor_index, 0),
        };

        // The whole tagged stretch folds, inner runs of run members
        // included. The anchor's cache must be contained in it; a cached id
        // outside the stretch means the shape around the anchor is broken.
        let block = &list[start..start + scanned];
        if scanned < cached.len() || !cached.iter().all(|id| block.contains(id)) {
            return Err(ArenaError::RunMismatch {
                anchor: anchor.to_string(),
                relation,
                scanned,
                cached: cached.len(),
            });
        }

        Ok(RunBounds {
            holder: owner.holder,
            relation: owner.relation,
            start,
            len: scanned,
        })
    }
}
