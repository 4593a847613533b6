use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Folder, Snippet, SnippetDraft};
use crate::session::Session;
use crate::store::{DocumentStore, Predicate, SortOrder, Update};
use crate::versions::VersionManager;

/// Lifecycle operations on snippets and folders, on behalf of one signed-in
/// user. Reads of shared state go through mirrors; this type only issues
/// writes and point reads.
pub struct SnippetManager {
    store: Arc<dyn DocumentStore>,
    versions: VersionManager,
    session: Session,
}

impl SnippetManager {
    pub fn new(store: Arc<dyn DocumentStore>, session: Session) -> Self {
        Self {
            versions: VersionManager::new(store.clone()),
            store,
            session,
        }
    }

    pub fn versions(&self) -> &VersionManager {
        &self.versions
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create a snippet together with Version 1. The draft is validated
    /// before anything is sent to the store.
    pub fn create(&self, draft: SnippetDraft) -> Result<Snippet, StoreError> {
        draft.validate()?;
        let snippet = Snippet::from_draft(&self.session.user_id, draft);
        self.store.insert(
            "snippets",
            &snippet.id.to_string(),
            serde_json::to_value(&snippet)?,
        )?;
        self.versions.create_initial(&snippet)?;
        info!(snippet = %snippet.id, "created snippet");
        Ok(snippet)
    }

    /// Save an edit. The pre-update state is captured as a new version
    /// first, and the edit is applied only if that write succeeded. The two
    /// writes are not one transaction: an interruption between them leaves
    /// an extra version and no live change.
    pub fn update(&self, id: Uuid, draft: SnippetDraft) -> Result<(), StoreError> {
        draft.validate()?;
        let current = self.fetch_owned(id)?;
        self.versions.snapshot_before_update(&current)?;

        let draft = draft.trimmed();
        let update = Update::new()
            .set("title", json!(draft.title))
            .set("description", json!(draft.description))
            .set("code", json!(draft.code))
            .set("language", json!(draft.language))
            .set("tags", json!(draft.tags))
            .set("subCategory", json!(draft.sub_category))
            .set("isPublic", json!(draft.is_public))
            .set("folderId", json!(draft.folder_id))
            .set("updatedAt", json!(Utc::now()));
        self.store.update("snippets", &id.to_string(), update)?;
        debug!(snippet = %id, "updated snippet");
        Ok(())
    }

    /// Delete a snippet and its version history. Favorites pointing at it
    /// are left dangling; resolvers skip them.
    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.fetch_owned(id)?;
        self.versions.delete_all(id)?;
        self.store.delete("snippets", &id.to_string())?;
        info!(snippet = %id, "deleted snippet");
        Ok(())
    }

    /// Point read with visibility enforcement: a private snippet is only
    /// readable by its owner.
    pub fn get(&self, id: Uuid) -> Result<Snippet, StoreError> {
        let snippet = self.fetch(id)?;
        if !snippet.is_public && snippet.owner_id != self.session.user_id {
            return Err(StoreError::PermissionDenied(
                "this snippet is private".into(),
            ));
        }
        Ok(snippet)
    }

    /// All of the current user's snippets, newest first.
    pub fn list_mine(&self) -> Result<Vec<Snippet>, StoreError> {
        let documents = self.store.query(
            "snippets",
            &Predicate::field("ownerId", self.session.user_id.as_str()),
            Some(&SortOrder::descending("createdAt")),
        )?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    pub fn create_folder(&self, name: &str) -> Result<Folder, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation("folder name is required".into()));
        }
        let folder = Folder::new(&self.session.user_id, name);
        self.store.insert(
            "folders",
            &folder.id.to_string(),
            serde_json::to_value(&folder)?,
        )?;
        Ok(folder)
    }

    pub fn rename_folder(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation("folder name is required".into()));
        }
        self.fetch_owned_folder(id)?;
        self.store.update(
            "folders",
            &id.to_string(),
            Update::new()
                .set("name", json!(name.trim()))
                .set("updatedAt", json!(Utc::now())),
        )
    }

    /// No cascade: snippets referencing the folder keep their dangling
    /// `folderId`.
    pub fn delete_folder(&self, id: Uuid) -> Result<(), StoreError> {
        self.fetch_owned_folder(id)?;
        self.store.delete("folders", &id.to_string())
    }

    fn fetch(&self, id: Uuid) -> Result<Snippet, StoreError> {
        let document = self
            .store
            .get("snippets", &id.to_string())?
            .ok_or_else(|| StoreError::not_found("snippets", &id.to_string()))?;
        serde_json::from_value(document).map_err(StoreError::from)
    }

    fn fetch_owned(&self, id: Uuid) -> Result<Snippet, StoreError> {
        let snippet = self.fetch(id)?;
        if snippet.owner_id != self.session.user_id {
            return Err(StoreError::PermissionDenied(
                "only the owner may modify a snippet".into(),
            ));
        }
        Ok(snippet)
    }

    fn fetch_owned_folder(&self, id: Uuid) -> Result<Folder, StoreError> {
        let document = self
            .store
            .get("folders", &id.to_string())?
            .ok_or_else(|| StoreError::not_found("folders", &id.to_string()))?;
        let folder: Folder = serde_json::from_value(document)?;
        if folder.owner_id != self.session.user_id {
            return Err(StoreError::PermissionDenied(
                "only the owner may modify a folder".into(),
            ));
        }
        Ok(folder)
    }
}
