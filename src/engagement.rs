use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Favorite, Snippet};
use crate::session::Session;
use crate::store::{DocumentStore, Update};

/// Likes, view counts and favorites: mutations shared across concurrently
/// running clients, applied without any central lock.
///
/// Like toggles are expressed as relative operations (increment plus
/// set-add/set-remove), so toggles from different users commute and neither
/// is lost regardless of arrival order. The toggle direction is derived
/// from the caller's own mirror of `likedBy`, which may lag; `likes` and
/// `likedBy` converge once every mirror has caught up, but may transiently
/// disagree. That drift is accepted, not worked around.
pub struct EngagementTracker {
    store: Arc<dyn DocumentStore>,
    session: Session,
    viewed: HashSet<Uuid>,
}

impl EngagementTracker {
    pub fn new(store: Arc<dyn DocumentStore>, session: Session) -> Self {
        Self {
            store,
            session,
            viewed: HashSet::new(),
        }
    }

    /// Like the snippet if this user has not, unlike it if they have, as
    /// judged from the passed-in (possibly stale) mirror copy. Returns
    /// whether the user now likes it. A concurrently deleted snippet
    /// surfaces as `NotFound`; nothing is retried.
    pub fn toggle_like(&self, snippet: &Snippet) -> Result<bool, StoreError> {
        let user = json!(self.session.user_id);
        let liked = snippet.is_liked_by(&self.session.user_id);
        let update = if liked {
            Update::new()
                .increment("likes", -1)
                .array_remove("likedBy", user)
        } else {
            Update::new()
                .increment("likes", 1)
                .array_union("likedBy", user)
        };
        debug!(snippet = %snippet.id, unlike = liked, "toggle like");
        self.store
            .update("snippets", &snippet.id.to_string(), update)?;
        Ok(!liked)
    }

    /// Count one view, at most once per snippet in this session. Purely
    /// session-local dedup: distinct sessions of the same user each count.
    /// Returns whether a view was recorded.
    pub fn record_view(&mut self, snippet_id: Uuid) -> Result<bool, StoreError> {
        if self.viewed.contains(&snippet_id) {
            return Ok(false);
        }
        self.store.update(
            "snippets",
            &snippet_id.to_string(),
            Update::new().increment("views", 1),
        )?;
        self.viewed.insert(snippet_id);
        Ok(true)
    }

    pub fn add_favorite(&self, snippet_id: Uuid) -> Result<Favorite, StoreError> {
        let favorite = Favorite::new(&self.session.user_id, snippet_id);
        self.store.insert(
            "favorites",
            &favorite.id.to_string(),
            serde_json::to_value(&favorite)?,
        )?;
        Ok(favorite)
    }

    pub fn remove_favorite(&self, favorite_id: Uuid) -> Result<(), StoreError> {
        self.store.delete("favorites", &favorite_id.to_string())
    }
}

/// Join favorites against a snippet snapshot. A favorite whose snippet is
/// missing (deleted, or simply not mirrored yet) is skipped, not an error.
pub fn resolve_favorites(favorites: &[Favorite], snippets: &[Snippet]) -> Vec<Snippet> {
    let by_id: HashMap<Uuid, &Snippet> = snippets.iter().map(|s| (s.id, s)).collect();
    favorites
        .iter()
        .filter_map(|favorite| by_id.get(&favorite.snippet_id).map(|s| (*s).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnippetDraft;
    use crate::store::InMemoryStore;

    fn setup(user: &str) -> (Arc<InMemoryStore>, EngagementTracker) {
        let store = Arc::new(InMemoryStore::new());
        let tracker = EngagementTracker::new(store.clone(), Session::new(user));
        (store, tracker)
    }

    fn insert_snippet(store: &InMemoryStore) -> Snippet {
        let snippet = Snippet::from_draft(
            "author",
            SnippetDraft {
                title: "Shared".into(),
                code: "x".into(),
                language: "Go".into(),
                is_public: true,
                ..SnippetDraft::default()
            },
        );
        store
            .insert(
                "snippets",
                &snippet.id.to_string(),
                serde_json::to_value(&snippet).unwrap(),
            )
            .unwrap();
        snippet
    }

    fn fetch(store: &InMemoryStore, id: Uuid) -> Snippet {
        serde_json::from_value(store.get("snippets", &id.to_string()).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let (store, tracker) = setup("u1");
        let snippet = insert_snippet(&store);

        assert!(tracker.toggle_like(&snippet).unwrap());
        let liked = fetch(&store, snippet.id);
        assert_eq!(liked.likes, 1);
        assert_eq!(liked.liked_by, vec!["u1".to_string()]);

        assert!(!tracker.toggle_like(&liked).unwrap());
        let unliked = fetch(&store, snippet.id);
        assert_eq!(unliked.likes, 0);
        assert!(unliked.liked_by.is_empty());
    }

    /// Apply both users' toggles in each order; the outcome must agree.
    fn run_toggles(order: [&str; 2]) -> Snippet {
        let store = Arc::new(InMemoryStore::new());
        let snippet = insert_snippet(&store);
        for user in order {
            // Each client decides from the same stale pre-toggle view.
            let tracker = EngagementTracker::new(store.clone(), Session::new(user));
            tracker.toggle_like(&snippet).unwrap();
        }
        fetch(&store, snippet.id)
    }

    #[test]
    fn toggles_commute_across_users() {
        let forward = run_toggles(["u1", "u2"]);
        let backward = run_toggles(["u2", "u1"]);

        assert_eq!(forward.likes, 2);
        assert_eq!(backward.likes, 2);
        let mut f: Vec<String> = forward.liked_by.clone();
        let mut b: Vec<String> = backward.liked_by.clone();
        f.sort();
        b.sort();
        assert_eq!(f, b);
        assert_eq!(f, vec!["u1".to_string(), "u2".to_string()]);
    }

    #[test]
    fn stale_view_can_leave_counter_ahead_of_membership() {
        let (store, tracker) = setup("u1");
        let snippet = insert_snippet(&store);

        // Two toggles issued from the same stale view both read as "like":
        // likedBy deduplicates, the counter does not. This is the accepted
        // drift; it converges only once the client re-reads before toggling.
        tracker.toggle_like(&snippet).unwrap();
        tracker.toggle_like(&snippet).unwrap();

        let observed = fetch(&store, snippet.id);
        assert_eq!(observed.likes, 2);
        assert_eq!(observed.liked_by, vec!["u1".to_string()]);
    }

    #[test]
    fn views_count_once_per_session() {
        let (store, mut tracker) = setup("u1");
        let snippet = insert_snippet(&store);

        assert!(tracker.record_view(snippet.id).unwrap());
        assert!(!tracker.record_view(snippet.id).unwrap());
        assert_eq!(fetch(&store, snippet.id).views, 1);

        // A second session contributes its own view.
        let mut other = EngagementTracker::new(store.clone(), Session::new("u1"));
        assert!(other.record_view(snippet.id).unwrap());
        assert_eq!(fetch(&store, snippet.id).views, 2);
    }

    #[test]
    fn mutating_a_deleted_snippet_is_not_found() {
        let (store, mut tracker) = setup("u1");
        let snippet = insert_snippet(&store);
        store.delete("snippets", &snippet.id.to_string()).unwrap();

        let err = tracker.toggle_like(&snippet).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        let err = tracker.record_view(snippet.id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        // The failed view is not remembered as seen.
        store
            .insert(
                "snippets",
                &snippet.id.to_string(),
                serde_json::to_value(&snippet).unwrap(),
            )
            .unwrap();
        assert!(tracker.record_view(snippet.id).unwrap());
    }

    #[test]
    fn favorites_round_trip_and_tolerate_dangles() {
        let (store, tracker) = setup("u1");
        let kept = insert_snippet(&store);
        let deleted = insert_snippet(&store);

        let fav_kept = tracker.add_favorite(kept.id).unwrap();
        let fav_dangling = tracker.add_favorite(deleted.id).unwrap();
        store.delete("snippets", &deleted.id.to_string()).unwrap();

        let snapshot = vec![kept.clone()];
        let resolved = resolve_favorites(&[fav_kept.clone(), fav_dangling], &snapshot);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, kept.id);

        tracker.remove_favorite(fav_kept.id).unwrap();
        assert!(
            store
                .get("favorites", &fav_kept.id.to_string())
                .unwrap()
                .is_none()
        );
    }
}
