//! Bookmark Contract
//!
//! Successful expand/collapse of a non-root node notifies the bookmark
//! collaborator (the URL synchronizer in the full application) so the
//! expansion state can be restored from a shared link. Calls are
//! fire-and-forget: exactly one per successful non-root expand or collapse,
//! never for the root, never from preload.

use crate::models::Relation;

/// Fire-and-forget sink for expansion markers.
pub trait BookmarkSink: Send + Sync {
    /// A non-root node was expanded along `relation`.
    fn add_bookmark(&self, tree_id: &str, relation: Relation);

    /// A non-root node was collapsed along `relation`.
    fn remove_bookmark(&self, tree_id: &str, relation: Relation);
}

/// Sink that drops every marker, for sessions without URL synchronization
/// and for tests.
#[derive(Debug, Default)]
pub struct NoopBookmarks;

impl BookmarkSink for NoopBookmarks {
    fn add_bookmark(&self, _tree_id: &str, _relation: Relation) {}

    fn remove_bookmark(&self, _tree_id: &str, _relation: Relation) {}
}
