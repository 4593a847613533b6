use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Snippet, Version};
use crate::store::{DocumentStore, Predicate, SortOrder};

/// Append-only version history, one sub-collection per snippet.
///
/// Numbering starts at 1 and grows by exactly one per save; a number is
/// never reused even if intermediate history is pruned by some later
/// policy, because the next number is always derived from the current
/// maximum.
pub struct VersionManager {
    store: Arc<dyn DocumentStore>,
}

impl VersionManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(snippet_id: Uuid) -> String {
        format!("snippets/{snippet_id}/versions")
    }

    /// Version 1, written at snippet creation.
    pub fn create_initial(&self, snippet: &Snippet) -> Result<Version, StoreError> {
        self.append(Version::snapshot_of(snippet, 1))
    }

    /// Capture `current` as the next version. Callers apply their edit only
    /// after this returns Ok; the version write and the live update are two
    /// separate writes with no transaction spanning them.
    pub fn snapshot_before_update(&self, current: &Snippet) -> Result<Version, StoreError> {
        let next = self.latest_number(current.id)? + 1;
        self.append(Version::snapshot_of(current, next))
    }

    /// Full history, newest first. Restartable: just a query, no cursor
    /// state.
    pub fn list(&self, snippet_id: Uuid) -> Result<Vec<Version>, StoreError> {
        let documents = self.store.query(
            &Self::collection(snippet_id),
            &Predicate::any(),
            Some(&SortOrder::descending("versionNumber")),
        )?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    /// Remove the whole history, used when its snippet is deleted.
    pub fn delete_all(&self, snippet_id: Uuid) -> Result<(), StoreError> {
        let collection = Self::collection(snippet_id);
        for version in self.list(snippet_id)? {
            self.store.delete(&collection, &version.id.to_string())?;
        }
        Ok(())
    }

    /// Re-home an exported history onto a freshly imported snippet,
    /// renumbering densely from 1 in original order. An empty history gets
    /// a fresh Version 1 instead.
    pub fn import_history(
        &self,
        snippet: &Snippet,
        mut history: Vec<Version>,
    ) -> Result<(), StoreError> {
        if history.is_empty() {
            self.create_initial(snippet)?;
            return Ok(());
        }
        history.sort_by_key(|v| v.version_number);
        for (index, old) in history.into_iter().enumerate() {
            self.append(Version {
                id: Uuid::new_v4(),
                snippet_id: snippet.id,
                version_number: index as u32 + 1,
                created_at: Utc::now(),
                ..old
            })?;
        }
        Ok(())
    }

    fn latest_number(&self, snippet_id: Uuid) -> Result<u32, StoreError> {
        Ok(self
            .list(snippet_id)?
            .first()
            .map(|v| v.version_number)
            .unwrap_or(0))
    }

    fn append(&self, version: Version) -> Result<Version, StoreError> {
        debug!(
            snippet = %version.snippet_id,
            number = version.version_number,
            "append version"
        );
        self.store.insert(
            &Self::collection(version.snippet_id),
            &version.id.to_string(),
            serde_json::to_value(&version)?,
        )?;
        Ok(version)
    }
}
