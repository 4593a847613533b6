//! sniphub - data layer for a shared snippet manager
//!
//! Keeps a client's view of remotely stored, shared snippets continuously
//! current, and layers the interesting behavior on top of that view:
//!
//! - Live mirrors of predicate-filtered collections, replaced wholesale on
//!   every change rather than merged delta by delta
//! - Dashboard statistics recomputed from each mirror snapshot
//! - Immutable per-snippet version history with line-level diffing
//! - Like/view counters mutated through commutative operations so that
//!   concurrent clients converge without locking
//! - JSON and plain-text backup export, and JSON import
//!
//! The remote store itself is out of scope: everything goes through the
//! [`store::DocumentStore`] trait, with [`store::InMemoryStore`] standing in
//! for tests and local development. Rendering, routing and authentication
//! live in the surrounding application.

pub mod diff;
pub mod engagement;
pub mod error;
pub mod export;
pub mod models;
pub mod search;
pub mod session;
pub mod snippets;
pub mod stats;
pub mod store;
pub mod sync;
pub mod versions;

pub use diff::{DiffKind, DiffSegment, diff_lines};
pub use engagement::{EngagementTracker, resolve_favorites};
pub use error::StoreError;
pub use export::{ExportData, ImportReport};
pub use models::{Favorite, Folder, Snippet, SnippetDraft, Version};
pub use search::{SnippetQuery, filter_snippets};
pub use session::Session;
pub use snippets::SnippetManager;
pub use stats::{DashboardStats, compute_stats};
pub use store::{DocumentStore, InMemoryStore, Predicate, SortOrder, Update};
pub use sync::Mirror;
pub use versions::VersionManager;
