use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Languages offered by the snippet editor. Free-form values are still
/// accepted on import; this list only drives selection UIs.
pub const LANGUAGES: &[&str] = &[
    "JavaScript",
    "Python",
    "Java",
    "C++",
    "Ruby",
    "Go",
    "PHP",
    "Swift",
    "Rust",
    "TypeScript",
    "HTML",
    "CSS",
    "SQL",
    "Shell",
    "Other",
];

/// A stored code snippet. Field names on the wire follow the remote
/// collection schema (`ownerId`, `likedBy`, ...).
///
/// `folder_id` is a weak reference: the folder may have been deleted out
/// from under it. `likes` tracks `liked_by` eventually, not instantaneously,
/// because both are mutated through relative operations from concurrently
/// running clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// Build a fresh snippet from a draft, owned by `owner_id`, with zeroed
    /// counters and both timestamps stamped now.
    pub fn from_draft(owner_id: &str, draft: SnippetDraft) -> Self {
        let draft = draft.trimmed();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            title: draft.title,
            description: draft.description,
            code: draft.code,
            language: draft.language,
            tags: draft.tags,
            sub_category: draft.sub_category,
            is_public: draft.is_public,
            folder_id: draft.folder_id,
            likes: 0,
            liked_by: Vec::new(),
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.liked_by.iter().any(|u| u == user_id)
    }

    /// Editable fields as a draft, e.g. to prefill an edit form.
    pub fn to_draft(&self) -> SnippetDraft {
        SnippetDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            code: self.code.clone(),
            language: self.language.clone(),
            tags: self.tags.clone(),
            sub_category: self.sub_category.clone(),
            is_public: self.is_public,
            folder_id: self.folder_id,
        }
    }
}

/// Uncommitted snippet content, as collected by the editor form or produced
/// by restoring a historical version. Committing a draft through
/// [`crate::snippets::SnippetManager`] is what actually writes anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

impl SnippetDraft {
    /// Required-field check, run before any remote call.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Validation("title is required".into()));
        }
        if self.code.trim().is_empty() {
            return Err(StoreError::Validation("code is required".into()));
        }
        if self.language.trim().is_empty() {
            return Err(StoreError::Validation("language is required".into()));
        }
        Ok(())
    }

    pub(crate) fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.code = self.code.trim().to_string();
        self.language = self.language.trim().to_string();
        self
    }
}
