//! Entity Fetch Contract
//!
//! The engine never talks to a knowledge-base backend directly. It calls
//! through [`EntityFetcher`], one async method per relation, and forwards a
//! [`FetchOptions`] built from the session settings. Which auxiliary id
//! lists a fetch attaches to its results is controlled by the option flags;
//! the preload controller depends on those lists being present.
//!
//! Failures surface as a rejected operation; the engine does not retry.

use crate::models::Entity;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Property id of the default child relation on the primary data source.
/// When another property is selected (e.g. "doctoral student"), sibling and
/// spouse candidates are not requested alongside children/parents.
pub const CHILD_PROP: &str = "P40";

/// Kinds of right-hand partners a spouse expansion may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartnerKind {
    /// Married spouse
    Spouse,
    /// Unmarried partner
    Partner,
}

/// Session settings forwarded into every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    /// Language the backend should resolve labels in
    pub language_code: String,

    /// Active backend/data source identifier
    pub data_source: String,

    /// Currently selected relation property (None = default child relation)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_prop_id: Option<String>,

    /// Which partner kinds spouse expansion keeps
    pub partner_kinds: Vec<PartnerKind>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language_code: "en".to_string(),
            data_source: "wikidata".to_string(),
            current_prop_id: Some(CHILD_PROP.to_string()),
            partner_kinds: vec![PartnerKind::Spouse],
        }
    }
}

impl SessionSettings {
    /// Whether the selected relation property is the default child relation.
    pub fn on_child_prop(&self) -> bool {
        self.current_prop_id.as_deref() == Some(CHILD_PROP)
    }
}

/// Options forwarded to one fetch call.
///
/// The `add_*` flags ask the backend to attach the corresponding auxiliary
/// id lists to the fetched entities, which arms preload for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOptions {
    pub language_code: String,
    pub data_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_prop_id: Option<String>,
    pub add_target_ids: bool,
    pub add_source_ids: bool,
    pub add_next_before_ids: bool,
    pub add_next_after_ids: bool,
    /// Whether the anchor's child ids already arrived sorted
    pub target_ids_sorted: bool,
}

impl FetchOptions {
    fn base(settings: &SessionSettings) -> Self {
        Self {
            language_code: settings.language_code.clone(),
            data_source: settings.data_source.clone(),
            current_prop_id: settings.current_prop_id.clone(),
            add_target_ids: false,
            add_source_ids: false,
            add_next_before_ids: false,
            add_next_after_ids: false,
            target_ids_sorted: false,
        }
    }

    /// Options for a children fetch at `anchor`.
    pub fn for_children(settings: &SessionSettings, anchor: &Entity) -> Self {
        Self {
            add_target_ids: true,
            add_next_after_ids: settings.on_child_prop(),
            target_ids_sorted: anchor.child_ids_sorted,
            ..Self::base(settings)
        }
    }

    /// Options for a parents fetch.
    pub fn for_parents(settings: &SessionSettings) -> Self {
        Self {
            add_source_ids: true,
            add_next_before_ids: settings.on_child_prop(),
            ..Self::base(settings)
        }
    }

    /// Options for a siblings fetch.
    pub fn for_siblings(settings: &SessionSettings) -> Self {
        Self::base(settings)
    }

    /// Options for a spouses fetch.
    pub fn for_spouses(settings: &SessionSettings) -> Self {
        Self::base(settings)
    }
}

/// Narrow contract to the knowledge-base backends, one method per relation.
///
/// Implementations must be `Send + Sync`; the engine holds one behind an
/// `Arc` and may have several fetches in flight against it.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    /// Entities below `anchor`, in display order.
    async fn fetch_children(&self, anchor: &Entity, options: &FetchOptions)
        -> Result<Vec<Entity>>;

    /// Entities above `anchor`, in display order.
    async fn fetch_parents(&self, anchor: &Entity, options: &FetchOptions) -> Result<Vec<Entity>>;

    /// Sibling candidates placed before `anchor`.
    async fn fetch_siblings(&self, anchor: &Entity, options: &FetchOptions)
        -> Result<Vec<Entity>>;

    /// Spouse/partner candidates placed after `anchor` (unfiltered; the
    /// engine applies the partner-kind filter).
    async fn fetch_spouses(&self, anchor: &Entity, options: &FetchOptions) -> Result<Vec<Entity>>;
}
