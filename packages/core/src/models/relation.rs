//! Traversal Relations
//!
//! The engine traverses entities along four relations. Children and parents
//! form nested sub-trees; siblings and spouses are spliced into an existing
//! list next to their anchor instead of opening a new level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four traversal relations of the visualization tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    Children,
    Parents,
    Siblings,
    Spouses,
}

/// Which rooted view a relation is searched and rendered in.
///
/// The session keeps two recursive views over one shared root: the
/// descendant view (root + children recursion) and the ancestor view
/// (root + parents recursion). Spouses are spliced into children lists,
/// siblings into parents lists, so each maps onto one of the two views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeView {
    Descendants,
    Ancestors,
}

impl TreeView {
    /// The relation whose expanded lists this view recurses through.
    pub fn nested_relation(&self) -> Relation {
        match self {
            TreeView::Descendants => Relation::Children,
            TreeView::Ancestors => Relation::Parents,
        }
    }

    /// The spliced-run relation rendered inside this view.
    pub fn run_relation(&self) -> Relation {
        match self {
            TreeView::Descendants => Relation::Spouses,
            TreeView::Ancestors => Relation::Siblings,
        }
    }
}

impl Relation {
    /// The view a node must be located in before this relation can be toggled.
    pub fn view(&self) -> TreeView {
        match self {
            Relation::Children | Relation::Spouses => TreeView::Descendants,
            Relation::Parents | Relation::Siblings => TreeView::Ancestors,
        }
    }

    /// True for relations that open a nested level (and therefore collapse
    /// recursively). Siblings and spouses splice into an existing list and
    /// never recurse.
    pub fn is_nested(&self) -> bool {
        matches!(self, Relation::Children | Relation::Parents)
    }

    /// One-character marker used by the bookmark collaborator.
    pub fn bookmark_symbol(&self) -> char {
        match self {
            Relation::Children => 'c',
            Relation::Parents => 'p',
            Relation::Siblings => 's',
            Relation::Spouses => 'm',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Relation::Children => "children",
            Relation::Parents => "parents",
            Relation::Siblings => "siblings",
            Relation::Spouses => "spouses",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
