//! Engine Services
//!
//! - `TreeService` - the session controller: toggles, preloads, reset, fit
//! - `EntityFetcher` - narrow contract to the knowledge-base backends
//! - `BookmarkSink` - fire-and-forget expansion markers
//!
//! The service owns the shared session state; external collaborators are
//! reached only through the trait seams in this module.

pub mod bookmark_service;
pub mod entity_service;
pub mod error;
pub mod tree_service;

pub use bookmark_service::{BookmarkSink, NoopBookmarks};
pub use entity_service::{EntityFetcher, FetchOptions, PartnerKind, SessionSettings, CHILD_PROP};
pub use error::TreeServiceError;
pub use tree_service::{ToggleOutcome, TreeService, TreeState};
