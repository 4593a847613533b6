//! End-to-end flows over the in-memory store: mutations loop back through
//! mirror subscriptions, statistics and filters derive from mirror
//! snapshots, history and counters behave under concurrent edits.

use std::sync::Arc;

use sniphub::diff::{DiffKind, diff_lines};
use sniphub::engagement::{EngagementTracker, resolve_favorites};
use sniphub::models::{Favorite, Snippet, SnippetDraft};
use sniphub::search::{SnippetQuery, filter_snippets};
use sniphub::stats::compute_stats;
use sniphub::store::{DocumentStore, InMemoryStore, Predicate, SortOrder};
use sniphub::sync::Mirror;
use sniphub::{Session, SnippetManager, StoreError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn client(store: &Arc<InMemoryStore>, user: &str) -> SnippetManager {
    SnippetManager::new(store.clone(), Session::new(user))
}

fn my_snippets_mirror(store: &Arc<InMemoryStore>, user: &str) -> Mirror<Snippet> {
    Mirror::open(
        store.clone(),
        "snippets",
        Predicate::field("ownerId", user),
        Some(SortOrder::descending("createdAt")),
    )
    .unwrap()
}

fn draft(title: &str, code: &str, language: &str) -> SnippetDraft {
    SnippetDraft {
        title: title.into(),
        description: String::new(),
        code: code.into(),
        language: language.into(),
        ..SnippetDraft::default()
    }
}

#[test]
fn created_snippet_flows_back_through_mirror_into_stats() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let manager = client(&store, "u1");
    let mut mirror = my_snippets_mirror(&store, "u1");
    assert_eq!(compute_stats(mirror.snapshot()).total_snippets, 0);

    let snippet = manager.create(draft("foo", "x", "JS")).unwrap();

    assert!(mirror.poll());
    let stats = compute_stats(mirror.snapshot());
    assert_eq!(stats.total_snippets, 1);
    assert_eq!(stats.language_distribution["JS"], 1);

    let history = manager.versions().list(snippet.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version_number, 1);
}

#[test]
fn editing_creates_a_version_holding_the_previous_code() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let manager = client(&store, "u1");

    let snippet = manager.create(draft("foo", "x", "JS")).unwrap();
    manager.update(snippet.id, draft("foo", "y", "JS")).unwrap();

    let history = manager.versions().list(snippet.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].version_number, 2);
    assert_eq!(history[0].code, "x");

    let segments = diff_lines("x", "y");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].kind, DiffKind::Delete);
    assert_eq!(segments[0].text, "x");
    assert_eq!(segments[1].kind, DiffKind::Insert);
    assert_eq!(segments[1].text, "y");
}

#[test]
fn restore_then_save_appends_without_rewriting_history() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let manager = client(&store, "u1");

    let snippet = manager.create(draft("foo", "x", "JS")).unwrap();
    manager.update(snippet.id, draft("foo", "y", "JS")).unwrap();

    // Restore the original code; committing the draft is a normal save.
    let history = manager.versions().list(snippet.id).unwrap();
    let original = history.last().unwrap();
    assert_eq!(original.version_number, 1);
    let live = manager.get(snippet.id).unwrap();
    let restored = original.restore_onto(&live);
    manager.update(snippet.id, restored.clone()).unwrap();

    // Live state equals the restored fields; history gained exactly one
    // version, numbered previous-max + 1, and nothing earlier changed.
    let live = manager.get(snippet.id).unwrap();
    assert_eq!(live.code, restored.code);
    let after = manager.versions().list(snippet.id).unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0].version_number, 3);
    assert_eq!(after[2].code, "x");
}

#[test]
fn concurrent_likes_converge_through_the_public_mirror() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let author = client(&store, "author");
    let mut public_draft = draft("shared", "x", "Go");
    public_draft.is_public = true;
    let snippet = author.create(public_draft).unwrap();

    let mut public_mirror: Mirror<Snippet> = Mirror::open(
        store.clone(),
        "snippets",
        Predicate::field("isPublic", true),
        Some(SortOrder::descending("createdAt")),
    )
    .unwrap();
    assert_eq!(public_mirror.len(), 1);

    // Two users toggle from whatever view their own mirror had.
    let u1 = EngagementTracker::new(store.clone(), Session::new("u1"));
    let u2 = EngagementTracker::new(store.clone(), Session::new("u2"));
    let stale = public_mirror.snapshot()[0].clone();
    u1.toggle_like(&stale).unwrap();
    u2.toggle_like(&stale).unwrap();

    assert!(public_mirror.poll());
    let converged = &public_mirror.snapshot()[0];
    assert_eq!(converged.likes, 2);
    let mut liked_by = converged.liked_by.clone();
    liked_by.sort();
    assert_eq!(liked_by, vec!["u1".to_string(), "u2".to_string()]);
}

#[test]
fn tag_filter_requires_every_tag() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let manager = client(&store, "u1");

    let mut both = draft("both", "x", "JS");
    both.tags = vec!["react".into(), "api".into(), "hooks".into()];
    manager.create(both).unwrap();
    let mut one = draft("one", "x", "JS");
    one.tags = vec!["react".into()];
    manager.create(one).unwrap();

    let mut mirror = my_snippets_mirror(&store, "u1");
    mirror.poll();

    let query = SnippetQuery {
        tags: vec!["react".into(), "api".into()],
        ..SnippetQuery::default()
    };
    let result = filter_snippets(mirror.snapshot(), &query);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].title, "both");
}

#[test]
fn deleting_a_folder_leaves_the_snippet_with_a_dangling_reference() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let manager = client(&store, "u1");

    let folder = manager.create_folder("React bits").unwrap();
    let mut d = draft("hook", "x", "JS");
    d.folder_id = Some(folder.id);
    let snippet = manager.create(d).unwrap();

    let mut folder_mirror: Mirror<sniphub::Folder> = Mirror::open(
        store.clone(),
        "folders",
        Predicate::field("ownerId", "u1"),
        None,
    )
    .unwrap();
    let mut snippet_mirror = my_snippets_mirror(&store, "u1");
    snippet_mirror.poll();
    assert_eq!(folder_mirror.len(), 1);

    manager.delete_folder(folder.id).unwrap();
    folder_mirror.poll();
    snippet_mirror.poll();

    // The folder is gone from every folder-scoped view; the snippet stays
    // in the unfiltered mirror, still pointing at the deleted folder.
    assert!(folder_mirror.is_empty());
    assert_eq!(snippet_mirror.len(), 1);
    assert_eq!(snippet_mirror.snapshot()[0].folder_id, Some(folder.id));
    assert_eq!(snippet_mirror.snapshot()[0].id, snippet.id);
}

#[test]
fn favorites_tolerate_not_yet_mirrored_snippets() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let author = client(&store, "author");
    let mut d = draft("shared", "x", "Go");
    d.is_public = true;
    let snippet = author.create(d).unwrap();

    let reader = EngagementTracker::new(store.clone(), Session::new("u1"));
    reader.add_favorite(snippet.id).unwrap();

    let mut favorites_mirror: Mirror<Favorite> = Mirror::open(
        store.clone(),
        "favorites",
        Predicate::field("ownerId", "u1"),
        None,
    )
    .unwrap();
    assert_eq!(favorites_mirror.len(), 1);

    // Before the snippet mirror catches up the favorite resolves to
    // nothing; afterwards it resolves to the snippet.
    assert!(resolve_favorites(favorites_mirror.snapshot(), &[]).is_empty());

    let mut public_mirror: Mirror<Snippet> = Mirror::open(
        store.clone(),
        "snippets",
        Predicate::field("isPublic", true),
        None,
    )
    .unwrap();
    let resolved = resolve_favorites(favorites_mirror.snapshot(), public_mirror.snapshot());
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, snippet.id);

    // Deleting the snippet leaves the favorite dangling, skipped again.
    author.delete(snippet.id).unwrap();
    public_mirror.poll();
    favorites_mirror.poll();
    assert_eq!(favorites_mirror.len(), 1);
    assert!(resolve_favorites(favorites_mirror.snapshot(), public_mirror.snapshot()).is_empty());
}

#[test]
fn view_counts_deduplicate_per_session_not_per_user() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let author = client(&store, "author");
    let mut d = draft("shared", "x", "Go");
    d.is_public = true;
    let snippet = author.create(d).unwrap();

    let mut first = EngagementTracker::new(store.clone(), Session::new("reader"));
    let mut second = EngagementTracker::new(store.clone(), Session::new("reader"));
    assert!(first.record_view(snippet.id).unwrap());
    assert!(!first.record_view(snippet.id).unwrap());
    assert!(second.record_view(snippet.id).unwrap());

    let doc = store
        .get("snippets", &snippet.id.to_string())
        .unwrap()
        .unwrap();
    assert_eq!(doc["views"], 2);
}

#[test]
fn liking_a_concurrently_deleted_snippet_surfaces_not_found() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let author = client(&store, "author");
    let mut d = draft("shared", "x", "Go");
    d.is_public = true;
    let snippet = author.create(d).unwrap();

    let mut public_mirror: Mirror<Snippet> =
        Mirror::open(store.clone(), "snippets", Predicate::field("isPublic", true), None).unwrap();
    let stale = public_mirror.snapshot()[0].clone();

    author.delete(snippet.id).unwrap();

    let reader = EngagementTracker::new(store.clone(), Session::new("u1"));
    let err = reader.toggle_like(&stale).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    let _ = public_mirror.poll();
}

#[tokio::test(flavor = "current_thread")]
async fn mirror_wakes_once_per_batch_of_changes() {
    init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let manager = client(&store, "u1");
    let mut mirror = my_snippets_mirror(&store, "u1");

    manager.create(draft("a", "x", "JS")).unwrap();
    manager.create(draft("b", "x", "JS")).unwrap();

    // One wakeup drains everything pending; only the newest emission is
    // materialized.
    assert!(mirror.changed().await);
    assert_eq!(mirror.len(), 2);

    mirror.close();
    manager.create(draft("c", "x", "JS")).unwrap();
    assert!(!mirror.changed().await);
    assert_eq!(mirror.len(), 2);
}
