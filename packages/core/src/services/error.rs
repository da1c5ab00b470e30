//! Service Layer Error Types
//!
//! Error kinds of the toggle/preload entry points. A locator miss is
//! deliberately not represented here: a mutation whose target is gone is a
//! defined no-op (`ToggleOutcome::Ignored`), not a failure.

use crate::models::Relation;
use crate::tree::ArenaError;
use thiserror::Error;

/// Failures of tree mutations and preloads.
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// The entity backend failed or returned a malformed response. The node
    /// reverts to "never fetched" with its loading flag cleared, so the user
    /// can retry by toggling again; nothing is retried automatically.
    #[error("fetching {relation} of node {tree_id} failed: {source}")]
    FetchFailed {
        tree_id: String,
        relation: Relation,
        #[source]
        source: anyhow::Error,
    },

    /// The tree shape around the mutation target is inconsistent (e.g. a run
    /// scan found a bad boundary). Fatal for this mutation only; unrelated
    /// subtrees are untouched.
    #[error("structural invariant violated: {0}")]
    StructuralViolation(#[from] ArenaError),
}

impl TreeServiceError {
    /// Create a fetch failure for one relation of one node.
    pub fn fetch_failed(
        tree_id: impl Into<String>,
        relation: Relation,
        source: anyhow::Error,
    ) -> Self {
        Self::FetchFailed {
            tree_id: tree_id.into(),
            relation,
            source,
        }
    }
}
