//! Shared test doubles for the engine integration tests.

use anyhow::Result;
use async_trait::async_trait;
use kintree_core::models::{Entity, Relation};
use kintree_core::services::{BookmarkSink, EntityFetcher, FetchOptions, NoopBookmarks, TreeService};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn entity(id: &str) -> Entity {
    Entity::new(id, id)
}

/// In-memory fetcher scripted per anchor entity id.
///
/// Counts every fetch call, can be switched into a failing mode, and can be
/// gated: while the gate is closed every fetch suspends until
/// [`ScriptedFetcher::release`] is called, which lets tests interleave other
/// mutations with an in-flight fetch.
#[derive(Default)]
pub struct ScriptedFetcher {
    children: HashMap<String, Vec<Entity>>,
    parents: HashMap<String, Vec<Entity>>,
    siblings: HashMap<String, Vec<Entity>>,
    spouses: HashMap<String, Vec<Entity>>,
    calls: AtomicUsize,
    fail: AtomicBool,
    gated: AtomicBool,
    gate: Notify,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, anchor: &str, entities: Vec<Entity>) -> Self {
        self.children.insert(anchor.to_string(), entities);
        self
    }

    pub fn with_parents(mut self, anchor: &str, entities: Vec<Entity>) -> Self {
        self.parents.insert(anchor.to_string(), entities);
        self
    }

    pub fn with_siblings(mut self, anchor: &str, entities: Vec<Entity>) -> Self {
        self.siblings.insert(anchor.to_string(), entities);
        self
    }

    pub fn with_spouses(mut self, anchor: &str, entities: Vec<Entity>) -> Self {
        self.spouses.insert(anchor.to_string(), entities);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Close the gate: subsequent fetches suspend until released.
    pub fn close_gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Open the gate and wake every suspended fetch.
    pub fn release(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.notify_waiters();
    }

    async fn answer(&self, map: &HashMap<String, Vec<Entity>>, anchor: &Entity) -> Result<Vec<Entity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        while self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("backend unreachable");
        }
        Ok(map.get(&anchor.id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl EntityFetcher for ScriptedFetcher {
    async fn fetch_children(&self, anchor: &Entity, _options: &FetchOptions) -> Result<Vec<Entity>> {
        self.answer(&self.children, anchor).await
    }

    async fn fetch_parents(&self, anchor: &Entity, _options: &FetchOptions) -> Result<Vec<Entity>> {
        self.answer(&self.parents, anchor).await
    }

    async fn fetch_siblings(&self, anchor: &Entity, _options: &FetchOptions) -> Result<Vec<Entity>> {
        self.answer(&self.siblings, anchor).await
    }

    async fn fetch_spouses(&self, anchor: &Entity, _options: &FetchOptions) -> Result<Vec<Entity>> {
        self.answer(&self.spouses, anchor).await
    }
}

/// Bookmark sink recording every call for assertions.
#[derive(Default)]
pub struct RecordingBookmarks {
    calls: Mutex<Vec<(String, Relation, bool)>>,
}

impl RecordingBookmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls as (tree_id, relation, added).
    pub fn calls(&self) -> Vec<(String, Relation, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

impl BookmarkSink for RecordingBookmarks {
    fn add_bookmark(&self, tree_id: &str, relation: Relation) {
        self.calls
            .lock()
            .unwrap()
            .push((tree_id.to_string(), relation, true));
    }

    fn remove_bookmark(&self, tree_id: &str, relation: Relation) {
        self.calls
            .lock()
            .unwrap()
            .push((tree_id.to_string(), relation, false));
    }
}

pub fn service(fetcher: Arc<ScriptedFetcher>) -> TreeService {
    TreeService::new(fetcher, Arc::new(NoopBookmarks))
}

pub fn service_with_bookmarks(
    fetcher: Arc<ScriptedFetcher>,
    bookmarks: Arc<RecordingBookmarks>,
) -> TreeService {
    TreeService::new(fetcher, bookmarks)
}
