//! Entity Record
//!
//! This module defines the `Entity` struct: the backend payload for one
//! person/item fetched from a knowledge-base service. Entities are shared by
//! reference across the tree; the same backend id may be shown at several
//! tree positions, each position being a separate [`crate::models::TreeNode`].
//!
//! Besides display fields, an entity carries the auxiliary id lists the
//! preload controller needs for its guard conditions:
//!
//! - `child_ids` / `parent_ids`: targets reachable down/up from this entity
//! - `next_before_ids` / `next_after_ids`: candidates to the left (siblings)
//!   and to the right (spouses) of this entity
//! - `spouse_ids` / `partner_ids`: which right-hand candidates are married
//!   spouses vs unmarried partners (used for spouse filtering)
//!
//! A list that is `None` is *unknown* (preload must not run); a list that is
//! `Some(vec![])` is known to be empty.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Backend entity payload, shared by reference across tree positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Backend entity id (stable across sessions and tree positions)
    pub id: String,

    /// Resolved label in the session language
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,

    /// Display year when only the year is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_year: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wikipedia_slug: Option<String>,

    /// Ids reachable through the children relation (None = unknown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_ids: Option<Vec<String>>,

    /// Ids reachable through the parents relation (None = unknown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ids: Option<Vec<String>>,

    /// Sibling candidates placed before this entity (None = unknown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_before_ids: Option<Vec<String>>,

    /// Spouse/partner candidates placed after this entity (None = unknown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_after_ids: Option<Vec<String>>,

    /// Right-hand candidates that are married spouses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spouse_ids: Option<Vec<String>>,

    /// Right-hand candidates that are unmarried partners
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_ids: Option<Vec<String>>,

    /// Child count hint rendered on the collapsed toggle button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_count: Option<u32>,

    /// Whether `child_ids` already arrived in display order from the backend
    #[serde(default)]
    pub child_ids_sorted: bool,
}

impl Entity {
    /// Create a minimal entity with only id and label set.
    ///
    /// All auxiliary id lists start unknown (`None`), which keeps preload
    /// disabled until a fetch attaches them.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
            description: None,
            birth_date: None,
            death_date: None,
            birth_year: None,
            death_year: None,
            gender: None,
            image_url: None,
            wikipedia_slug: None,
            child_ids: None,
            parent_ids: None,
            next_before_ids: None,
            next_after_ids: None,
            spouse_ids: None,
            partner_ids: None,
            children_count: None,
            child_ids_sorted: false,
        }
    }

    /// Lifespan string for display, e.g. "1822-1884".
    pub fn life_span(&self) -> Option<String> {
        let birth = self
            .birth_date
            .map(|d| d.format("%Y").to_string())
            .or_else(|| self.birth_year.clone());
        let death = self
            .death_date
            .map(|d| d.format("%Y").to_string())
            .or_else(|| self.death_year.clone());

        match (birth, death) {
            (Some(b), Some(d)) => Some(format!("{}-{}", b, d)),
            (Some(b), None) => Some(format!("{}-", b)),
            (None, Some(d)) => Some(format!("-{}", d)),
            (None, None) => None,
        }
    }
}
