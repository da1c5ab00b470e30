//! Tree Service - Expansion and Collapse Engine
//!
//! `TreeService` owns the session state (arena + fit + settings) and exposes
//! the only mutation entry points of the engine:
//!
//! - `reset` - discard the tree and install a new root
//! - `toggle` (and the four per-relation wrappers) - expand or collapse one
//!   relation at one node, following the decision table below
//! - `preload_*` - speculative background population of the fold cache
//!
//! # Decision Table
//!
//! For a toggle of relation R at a node:
//!
//! | Slot state   | Action                                                  |
//! |--------------|---------------------------------------------------------|
//! | `Expanded`   | Collapse: fold to cache (recursively for children and   |
//! |              | parents, whole-run removal for siblings and spouses)    |
//! | `Folded`     | Unfold from cache, no fetch                             |
//! | `NotFetched` | Fetch from the entity service, then expand              |
//!
//! # Concurrency
//!
//! All mutations run on one logical thread. A fetch suspends only its own
//! toggle: the state lock is released while the request is in flight and
//! reacquired at the resumption point, where the target is re-located.
//! A result arriving for a node that was collapsed or removed in the
//! meantime is silently discarded; a result arriving after a preload
//! already filled the fold cache yields to that cache so no duplicate
//! instances are created. In-flight fetches are never cancelled.

use crate::models::{
    Entity, Fit, Owner, Relation, RelationState, TreeId, TreeNode, TreeView,
};
use crate::services::bookmark_service::BookmarkSink;
use crate::services::entity_service::{
    EntityFetcher, FetchOptions, PartnerKind, SessionSettings,
};
use crate::services::error::TreeServiceError;
use crate::tree::TreeArena;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Result of a toggle entry point.
///
/// `Ignored` is the defined no-op for a locator miss: the target was
/// collapsed or removed before the mutation (or its fetch result) arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded,
    Collapsed,
    Ignored,
}

/// Session state guarded by the service lock.
#[derive(Debug, Default)]
pub struct TreeState {
    arena: TreeArena,
    fit: Option<Fit>,
    settings: SessionSettings,
}

impl TreeState {
    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    /// Fit hint of the last mutation, if not yet consumed.
    pub fn fit(&self) -> Option<&Fit> {
        self.fit.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}

/// The expansion/collapse engine for one visualization session.
pub struct TreeService {
    state: Arc<RwLock<TreeState>>,
    fetcher: Arc<dyn EntityFetcher>,
    bookmarks: Arc<dyn BookmarkSink>,
}

impl TreeService {
    pub fn new(fetcher: Arc<dyn EntityFetcher>, bookmarks: Arc<dyn BookmarkSink>) -> Self {
        Self::with_settings(fetcher, bookmarks, SessionSettings::default())
    }

    pub fn with_settings(
        fetcher: Arc<dyn EntityFetcher>,
        bookmarks: Arc<dyn BookmarkSink>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(TreeState {
                arena: TreeArena::new(),
                fit: None,
                settings,
            })),
            fetcher,
            bookmarks,
        }
    }

    /// Discard the current tree and start a session on a new root entity.
    /// Returns the root's tree id.
    pub async fn reset(&self, root: Entity) -> TreeId {
        let mut state = self.state.write().await;
        state.fit = None;
        let root_id = state.arena.reset(root);
        tracing::debug!("session reset, new root instance {}", root_id);
        root_id
    }

    /// Read access for the presentation layer.
    pub async fn read(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().await
    }

    /// Consume the fit hint of the last mutation.
    pub async fn take_fit(&self) -> Option<Fit> {
        self.state.write().await.fit.take()
    }

    pub async fn set_settings(&self, settings: SessionSettings) {
        self.state.write().await.settings = settings;
    }

    /// Whether a fetch for `relation` at `tree_id` is in flight.
    pub async fn is_loading(&self, tree_id: &str, relation: Relation) -> bool {
        let state = self.state.read().await;
        state
            .arena
            .node(tree_id)
            .is_some_and(|node| node.slot(relation).loading)
    }

    pub async fn toggle_children(&self, tree_id: &str) -> Result<ToggleOutcome, TreeServiceError> {
        self.toggle(tree_id, Relation::Children).await
    }

    pub async fn toggle_parents(&self, tree_id: &str) -> Result<ToggleOutcome, TreeServiceError> {
        self.toggle(tree_id, Relation::Parents).await
    }

    pub async fn toggle_siblings(&self, tree_id: &str) -> Result<ToggleOutcome, TreeServiceError> {
        self.toggle(tree_id, Relation::Siblings).await
    }

    pub async fn toggle_spouses(&self, tree_id: &str) -> Result<ToggleOutcome, TreeServiceError> {
        self.toggle(tree_id, Relation::Spouses).await
    }

    /// Expand or collapse `relation` at the node instance `tree_id`.
    ///
    /// Collapse and unfold complete synchronously under the state lock.
    /// A fetch releases the lock while the backend call is in flight and
    /// re-locates the target when it resolves.
    pub async fn toggle(
        &self,
        tree_id: &str,
        relation: Relation,
    ) -> Result<ToggleOutcome, TreeServiceError> {
        // Decision phase
        let (entity, settings) = {
            let mut state = self.state.write().await;
            let Some(node) = state.arena.locate(relation.view(), tree_id) else {
                tracing::debug!("toggle {} target {} not reachable, ignoring", relation, tree_id);
                return Ok(ToggleOutcome::Ignored);
            };
            let slot = node.slot(relation);
            let slot_state = slot.state.clone();
            let in_flight = slot.loading;
            let entity = state.arena.entity_of(node).cloned();

            match slot_state {
                RelationState::Expanded(_) => {
                    return self.collapse(&mut state, tree_id, relation);
                }
                RelationState::Folded(run) => {
                    return self.finish_expand(&mut state, tree_id, relation, run);
                }
                RelationState::NotFetched => {
                    if in_flight {
                        tracing::debug!(
                            "toggle {} for {} already in flight, ignoring",
                            relation,
                            tree_id
                        );
                        return Ok(ToggleOutcome::Ignored);
                    }
                    let Some(entity) = entity else {
                        tracing::warn!("node {} has no entity payload, ignoring toggle", tree_id);
                        return Ok(ToggleOutcome::Ignored);
                    };
                    if let Some(node) = state.arena.node_mut(tree_id) {
                        node.slot_mut(relation).loading = true;
                    }
                    (entity, state.settings.clone())
                }
            }
        };

        // Fetch phase, lock released
        let result = self.fetch_relation(relation, &entity, &settings).await;

        // Resumption phase: re-locate, the tree may have changed
        let mut state = self.state.write().await;
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(source) => {
                clear_loading(&mut state.arena, tree_id, relation);
                tracing::warn!("fetching {} of {} failed: {}", relation, tree_id, source);
                return Err(TreeServiceError::fetch_failed(tree_id, relation, source));
            }
        };

        if state.arena.locate(relation.view(), tree_id).is_none() {
            clear_loading(&mut state.arena, tree_id, relation);
            tracing::debug!(
                "discarding {} fetch for {}: no longer reachable",
                relation,
                tree_id
            );
            return Ok(ToggleOutcome::Ignored);
        }

        let current = state
            .arena
            .node(tree_id)
            .map(|node| node.slot(relation).state.clone());
        match current {
            Some(RelationState::NotFetched) => {
                let owner = run_owner(&state.arena, tree_id, relation);
                let run = state.arena.materialize_run(fetched, owner, relation);
                self.finish_expand(&mut state, tree_id, relation, run)
            }
            Some(RelationState::Folded(run)) => {
                // A preload landed while this fetch was in flight; its cache
                // wins so no duplicate instances enter the arena.
                tracing::debug!(
                    "{} fetch for {} raced a preload, expanding from cache",
                    relation,
                    tree_id
                );
                self.finish_expand(&mut state, tree_id, relation, run)
            }
            _ => {
                clear_loading(&mut state.arena, tree_id, relation);
                tracing::debug!(
                    "discarding stale {} fetch for {}: state changed in flight",
                    relation,
                    tree_id
                );
                Ok(ToggleOutcome::Ignored)
            }
        }
    }

    pub async fn preload_children(&self, tree_id: &str) -> Result<(), TreeServiceError> {
        self.preload(tree_id, Relation::Children).await
    }

    pub async fn preload_parents(&self, tree_id: &str) -> Result<(), TreeServiceError> {
        self.preload(tree_id, Relation::Parents).await
    }

    pub async fn preload_siblings(&self, tree_id: &str) -> Result<(), TreeServiceError> {
        self.preload(tree_id, Relation::Siblings).await
    }

    pub async fn preload_spouses(&self, tree_id: &str) -> Result<(), TreeServiceError> {
        self.preload(tree_id, Relation::Spouses).await
    }

    /// Speculatively fetch `relation` at `tree_id` into the fold cache.
    ///
    /// Runs only when the slot has never been fetched, no fetch is in
    /// flight, and the relation's prerequisite id list is known on the
    /// entity. The result stays invisible: no fit update, no bookmark, the
    /// visible tree is untouched until a real toggle unfolds the cache.
    async fn preload(&self, tree_id: &str, relation: Relation) -> Result<(), TreeServiceError> {
        let (entity, settings) = {
            let state = self.state.read().await;
            let Some(node) = state.arena.node(tree_id) else {
                return Ok(());
            };
            let slot = node.slot(relation);
            if !slot.state.is_not_fetched() || slot.loading {
                return Ok(());
            }
            let Some(entity) = state.arena.entity_of(node) else {
                return Ok(());
            };
            if prerequisite_ids(entity, relation).is_none() {
                return Ok(());
            }
            (entity.clone(), state.settings.clone())
        };

        let fetched = match self.fetch_relation(relation, &entity, &settings).await {
            Ok(fetched) => fetched,
            Err(source) => {
                tracing::debug!("preload of {} for {} failed: {}", relation, tree_id, source);
                return Err(TreeServiceError::fetch_failed(tree_id, relation, source));
            }
        };

        let mut state = self.state.write().await;
        // Apply as long as the slot is still unfetched. A toggle fetch may
        // be in flight for it; that toggle finds the fold cache at its
        // resumption and expands from it instead of its own result.
        let still_pending = state
            .arena
            .node(tree_id)
            .is_some_and(|node| node.slot(relation).state.is_not_fetched());
        if !still_pending {
            tracing::debug!(
                "discarding {} preload for {}: state changed in flight",
                relation,
                tree_id
            );
            return Ok(());
        }

        let owner = run_owner(&state.arena, tree_id, relation);
        let run = state.arena.materialize_run(fetched, owner, relation);
        if let Some(node) = state.arena.node_mut(tree_id) {
            node.slot_mut(relation).state = RelationState::Folded(run);
        }
        Ok(())
    }

    /// Dispatch one backend fetch and apply the spouse filter where needed.
    async fn fetch_relation(
        &self,
        relation: Relation,
        anchor: &Entity,
        settings: &SessionSettings,
    ) -> anyhow::Result<Vec<Entity>> {
        match relation {
            Relation::Children => {
                let options = FetchOptions::for_children(settings, anchor);
                self.fetcher.fetch_children(anchor, &options).await
            }
            Relation::Parents => {
                let options = FetchOptions::for_parents(settings);
                self.fetcher.fetch_parents(anchor, &options).await
            }
            Relation::Siblings => {
                let options = FetchOptions::for_siblings(settings);
                self.fetcher.fetch_siblings(anchor, &options).await
            }
            Relation::Spouses => {
                let options = FetchOptions::for_spouses(settings);
                let fetched = self.fetcher.fetch_spouses(anchor, &options).await?;
                Ok(filter_spouses(settings, anchor, fetched))
            }
        }
    }

    /// Collapse `relation` at `tree_id` and publish the fit.
    fn collapse(
        &self,
        state: &mut TreeState,
        tree_id: &str,
        relation: Relation,
    ) -> Result<ToggleOutcome, TreeServiceError> {
        if relation.is_nested() {
            self.collapse_nested_recursive(&mut state.arena, tree_id, relation);
        } else {
            let (is_root, detached) = match state.arena.node(tree_id) {
                Some(node) => (node.is_root, node.is_detached()),
                None => return Ok(ToggleOutcome::Ignored),
            };
            if detached {
                // Detached runs live on the node's own slot; nothing is
                // spliced anywhere
                if let Some(node) = state.arena.node_mut(tree_id) {
                    fold_slot(node, relation);
                }
            } else {
                let bounds = match relation {
                    Relation::Siblings => state.arena.sibling_run_bounds(tree_id)?,
                    Relation::Spouses => state.arena.spouse_run_bounds(tree_id)?,
                    _ => unreachable!("nested relations are handled above"),
                };
                let removed = state.arena.remove_run(&bounds)?;
                if let Some(node) = state.arena.node_mut(tree_id) {
                    let slot = node.slot_mut(relation);
                    slot.state = RelationState::Folded(removed);
                    slot.loading = false;
                }
            }
            if !is_root {
                self.bookmarks.remove_bookmark(tree_id, relation);
            }
        }

        state.fit = Some(Fit::collapsed(tree_id));
        Ok(ToggleOutcome::Collapsed)
    }

    /// Fold an expanded children/parents list, then every expanded
    /// descendant reachable through the same relation. Descendants must be
    /// folded too; otherwise their subtrees would be unreachable with no
    /// way to re-collapse them individually after re-expansion.
    fn collapse_nested_recursive(&self, arena: &mut TreeArena, tree_id: &str, relation: Relation) {
        let Some(node) = arena.node_mut(tree_id) else {
            return;
        };
        let is_root = node.is_root;
        let Some(ids) = fold_slot(node, relation) else {
            return;
        };
        if !is_root {
            self.bookmarks.remove_bookmark(tree_id, relation);
        }
        for id in &ids {
            self.collapse_nested_recursive(arena, id, relation);
        }
    }

    /// Make `run` the expanded state of `relation` at `tree_id`: splice it
    /// into the owning list for owned sibling/spouse anchors, set the
    /// slot, clear loading, publish fit and bookmark.
    ///
    /// Used by unfold, by fetch resolution, and by the preload-raced path;
    /// the run is either the fold cache or freshly materialized ids.
    fn finish_expand(
        &self,
        state: &mut TreeState,
        tree_id: &str,
        relation: Relation,
        run: Vec<TreeId>,
    ) -> Result<ToggleOutcome, TreeServiceError> {
        let Some(node) = state.arena.node(tree_id) else {
            return Ok(ToggleOutcome::Ignored);
        };
        let is_root = node.is_root;
        let owner = node.owner.clone();

        if !relation.is_nested() {
            // Detached anchors (the root and its run members) keep their
            // runs on their own slot; everything else splices
            if let Some(owner) = owner {
                let index = state
                    .arena
                    .index_in_list(&owner.holder, owner.relation, tree_id)?;
                // Siblings go immediately before the anchor, spouses after
                let at = if relation == Relation::Siblings {
                    index
                } else {
                    index + 1
                };
                state.arena.insert_run(&owner.holder, owner.relation, at, &run)?;
            }
        }

        if let Some(node) = state.arena.node_mut(tree_id) {
            let slot = node.slot_mut(relation);
            slot.state = RelationState::Expanded(run.clone());
            slot.loading = false;
        }
        if !is_root {
            self.bookmarks.add_bookmark(tree_id, relation);
        }
        state.fit = Some(Fit::after_expand(relation, tree_id, &run));
        Ok(ToggleOutcome::Expanded)
    }
}

/// The owner back-link new run members are created with.
fn run_owner(arena: &TreeArena, anchor: &str, relation: Relation) -> Option<Owner> {
    if relation.is_nested() {
        Some(Owner {
            holder: anchor.to_string(),
            relation,
        })
    } else {
        // Spliced runs join the anchor's own list; root runs join none
        arena.node(anchor).and_then(|node| node.owner.clone())
    }
}

/// Move an expanded slot to its folded state. Returns the folded ids, or
/// `None` when the slot was not expanded (state left untouched).
fn fold_slot(node: &mut TreeNode, relation: Relation) -> Option<Vec<TreeId>> {
    let slot = node.slot_mut(relation);
    match std::mem::take(&mut slot.state) {
        RelationState::Expanded(ids) => {
            slot.state = RelationState::Folded(ids.clone());
            slot.loading = false;
            Some(ids)
        }
        other => {
            slot.state = other;
            None
        }
    }
}

fn clear_loading(arena: &mut TreeArena, tree_id: &str, relation: Relation) {
    if let Some(node) = arena.node_mut(tree_id) {
        node.slot_mut(relation).loading = false;
    }
}

/// Prerequisite id list preload needs before it may fetch `relation`.
fn prerequisite_ids(entity: &Entity, relation: Relation) -> Option<&Vec<String>> {
    match relation {
        Relation::Children => entity.child_ids.as_ref(),
        Relation::Parents => entity.parent_ids.as_ref(),
        Relation::Siblings => entity.next_before_ids.as_ref(),
        Relation::Spouses => entity.next_after_ids.as_ref(),
    }
}

/// Keep only fetched spouses matching the configured partner kinds.
///
/// An anchor with neither spouse nor partner id lists carries no information
/// to filter on; the fetched list passes through unchanged.
fn filter_spouses(settings: &SessionSettings, anchor: &Entity, fetched: Vec<Entity>) -> Vec<Entity> {
    let spouse_ids = anchor.spouse_ids.as_deref();
    let partner_ids = anchor.partner_ids.as_deref();
    if spouse_ids.is_none() && partner_ids.is_none() {
        return fetched;
    }

    let keep_spouses = settings.partner_kinds.contains(&PartnerKind::Spouse);
    let keep_partners = settings.partner_kinds.contains(&PartnerKind::Partner);

    fetched
        .into_iter()
        .filter(|candidate| {
            (keep_spouses && spouse_ids.is_some_and(|ids| ids.contains(&candidate.id)))
                || (keep_partners && partner_ids.is_some_and(|ids| ids.contains(&candidate.id)))
        })
        .collect()
}
