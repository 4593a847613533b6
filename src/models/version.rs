use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Snippet, SnippetDraft};

/// An immutable copy of a snippet's content fields at one point in time.
///
/// Versions are append-only and live in the per-snippet `versions`
/// sub-collection. `version_number` starts at 1 and grows by exactly one per
/// save; numbers are never reused, even if old versions are pruned later.
/// Visibility and counters are live state, not content, and are not
/// captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: Uuid,
    pub snippet_id: Uuid,
    pub version_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Capture `snippet`'s current content as version `number`.
    pub fn snapshot_of(snippet: &Snippet, number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            snippet_id: snippet.id,
            version_number: number,
            title: snippet.title.clone(),
            description: snippet.description.clone(),
            code: snippet.code.clone(),
            language: snippet.language.clone(),
            tags: snippet.tags.clone(),
            sub_category: snippet.sub_category.clone(),
            created_at: Utc::now(),
        }
    }

    /// The stored content as an editable draft, keeping `current`'s
    /// visibility and folder (neither is versioned). Restoring never
    /// rewrites history; committing the draft through a normal save is what
    /// appends the next version.
    pub fn restore_onto(&self, current: &Snippet) -> SnippetDraft {
        SnippetDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            code: self.code.clone(),
            language: self.language.clone(),
            tags: self.tags.clone(),
            sub_category: self.sub_category.clone(),
            is_public: current.is_public,
            folder_id: current.folder_id,
        }
    }
}
