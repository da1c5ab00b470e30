//! Viewport Fit
//!
//! After every mutation the engine derives a `Fit`: four anchor references
//! describing the bounding extent of the change. The presentation layer uses
//! them to scroll/zoom the viewport onto the affected area. Fit is derived
//! data, recomputed from the post-mutation tree only, never merged; it must
//! never reference a node a mutation just removed.

use crate::models::{Relation, TreeId};
use serde::{Deserialize, Serialize};

/// Bounding anchors of the last mutation, as tree ids of nodes that are
/// present in the post-mutation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fit {
    pub left: TreeId,
    pub right: TreeId,
    pub top: TreeId,
    pub bottom: TreeId,
}

impl Fit {
    /// Fit after a collapse: everything folds back onto the anchor.
    pub fn collapsed(anchor: &str) -> Self {
        Self {
            left: anchor.to_string(),
            right: anchor.to_string(),
            top: anchor.to_string(),
            bottom: anchor.to_string(),
        }
    }

    /// Fit after expanding `relation` at `anchor` with the inserted `run`.
    ///
    /// Horizontal extent is always the run itself; the vertical anchors
    /// depend on where the relation places the run:
    ///
    /// - children open a level below the anchor
    /// - parents open a level above the anchor
    /// - siblings land on the anchor's own row, left of it
    /// - spouses land on the anchor's own row, right of it
    ///
    /// An empty run degenerates to the anchor on all four sides.
    pub fn after_expand(relation: Relation, anchor: &str, run: &[TreeId]) -> Self {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            return Self::collapsed(anchor);
        };

        match relation {
            Relation::Children => Self {
                left: first.clone(),
                right: last.clone(),
                top: anchor.to_string(),
                bottom: first.clone(),
            },
            Relation::Parents => Self {
                left: first.clone(),
                right: last.clone(),
                top: first.clone(),
                bottom: anchor.to_string(),
            },
            Relation::Siblings => Self {
                left: first.clone(),
                right: last.clone(),
                top: first.clone(),
                bottom: first.clone(),
            },
            Relation::Spouses => Self {
                left: first.clone(),
                right: last.clone(),
                top: anchor.to_string(),
                bottom: anchor.to_string(),
            },
        }
    }

    /// Every tree id this fit references.
    pub fn referenced_ids(&self) -> [&TreeId; 4] {
        [&self.left, &self.right, &self.top, &self.bottom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<TreeId> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_collapse_fit_is_anchor_everywhere() {
        let fit = Fit::collapsed("a");
        assert!(fit.referenced_ids().iter().all(|id| *id == "a"));
    }

    #[test]
    fn test_children_fit() {
        let run = ids(&["c1", "c2", "c3"]);
        let fit = Fit::after_expand(Relation::Children, "a", &run);
        assert_eq!(fit.left, "c1");
        assert_eq!(fit.right, "c3");
        assert_eq!(fit.top, "a");
        assert_eq!(fit.bottom, "c1");
    }

    #[test]
    fn test_parents_fit() {
        let run = ids(&["p1", "p2"]);
        let fit = Fit::after_expand(Relation::Parents, "a", &run);
        assert_eq!(fit.top, "p1");
        assert_eq!(fit.bottom, "a");
    }

    #[test]
    fn test_sibling_and_spouse_fit_rows() {
        let run = ids(&["s1", "s2"]);

        let sib = Fit::after_expand(Relation::Siblings, "a", &run);
        assert_eq!(sib.top, "s1");
        assert_eq!(sib.bottom, "s1");

        let sp = Fit::after_expand(Relation::Spouses, "a", &run);
        assert_eq!(sp.top, "a");
        assert_eq!(sp.bottom, "a");
    }

    #[test]
    fn test_empty_run_degenerates_to_anchor() {
        let fit = Fit::after_expand(Relation::Children, "a", &[]);
        assert_eq!(fit, Fit::collapsed("a"));
    }
}
