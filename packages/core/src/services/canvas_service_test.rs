//! Integration tests for `CanvasService` over the real embedded database
//! and the in-memory remote gateway.
//!
//! Persistence and remote mirroring are fire-and-forget, so assertions
//! against the store or the gateway poll with [`eventually`] instead of
//! sleeping a fixed amount.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_test::assert_ok;

use crate::db::{DatabaseService, LocalStore, TursoStore};
use crate::models::{now_millis, NoteDraft, NoteUpdate};
use crate::services::canvas_service::CanvasService;
use crate::services::error::ImportError;
use crate::sync::{InMemoryGateway, RemoteGateway};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn service() -> (CanvasService, Arc<TursoStore>, Arc<InMemoryGateway>) {
    init_tracing();
    let db = Arc::new(DatabaseService::new_in_memory().await.unwrap());
    let store = Arc::new(TursoStore::new(db));
    let gateway = Arc::new(InMemoryGateway::new());
    let mut svc = CanvasService::new(store.clone());
    svc.set_gateway(gateway.clone());
    (svc, store, gateway)
}

fn draft(title: &str, x: f64, y: f64) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        x,
        y,
        ..Default::default()
    }
}

/// Poll until `probe` reports true or the timeout elapses.
async fn eventually<F, Fut>(mut probe: F, what: &str)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if probe().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for: {what}");
}

//
// REFERENCES AND LINKS
//

#[tokio::test]
async fn typing_a_reference_creates_link_and_reciprocal_entries() {
    let (mut svc, _store, gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 100.0, 0.0));

    svc.update_note(&a, NoteUpdate::content("see [[Banana]]"));

    assert_eq!(svc.links().len(), 1);
    let link = svc.links().values().next().unwrap();
    assert!(link.connects(&a, &b));
    assert_eq!(svc.get_note(&a).unwrap().references, vec![b.clone()]);
    assert_eq!(svc.get_note(&b).unwrap().references, vec![a.clone()]);

    // Both the link and the touched endpoint reach the remote store
    eventually(
        || async { gateway.remote_links().len() == 1 },
        "link mirrored to remote",
    )
    .await;
}

#[tokio::test]
async fn removing_the_reference_deletes_link_and_reciprocal_entries() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 100.0, 0.0));

    svc.update_note(&a, NoteUpdate::content("see [[Banana]]"));
    svc.update_note(&a, NoteUpdate::content("no more fruit"));

    assert!(svc.links().is_empty());
    assert!(svc.get_note(&a).unwrap().references.is_empty());
    assert!(svc.get_note(&b).unwrap().references.is_empty());
}

#[tokio::test]
async fn reference_reconciliation_is_idempotent() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let _b = svc.add_note(draft("Banana", 100.0, 0.0));

    svc.update_note(&a, NoteUpdate::content("see [[Banana]]"));
    let link_id = svc.links().keys().next().unwrap().clone();

    // Re-saving equivalent content keeps the same link object
    svc.update_note(&a, NoteUpdate::content("see [[Banana]] again"));
    assert_eq!(svc.links().len(), 1);
    assert!(svc.links().contains_key(&link_id));
}

#[tokio::test]
async fn self_reference_never_creates_a_link() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));

    svc.update_note(&a, NoteUpdate::content("I am [[Apple]]"));

    assert!(svc.links().is_empty());
    assert!(svc.get_note(&a).unwrap().references.is_empty());
}

#[tokio::test]
async fn unresolved_and_case_insensitive_references() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 100.0, 0.0));

    svc.update_note(&a, NoteUpdate::content("[[bAnAnA]] and [[Nobody Home]]"));

    assert_eq!(svc.get_note(&a).unwrap().references, vec![b]);
    assert_eq!(svc.links().len(), 1);
}

#[tokio::test]
async fn duplicate_titles_resolve_to_exactly_one_note() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let dup1 = svc.add_note(draft("Twin", 100.0, 0.0));
    let dup2 = svc.add_note(draft("Twin", 200.0, 0.0));

    svc.update_note(&a, NoteUpdate::content("[[Twin]]"));

    let refs = &svc.get_note(&a).unwrap().references;
    assert_eq!(refs.len(), 1);
    assert!(refs[0] == dup1 || refs[0] == dup2);
    assert_eq!(svc.links().len(), 1);
}

#[tokio::test]
async fn explicit_link_maintains_the_same_invariant() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 100.0, 0.0));

    let link_id = svc.add_link(&a, &b).unwrap();
    assert_eq!(svc.get_note(&a).unwrap().references, vec![b.clone()]);
    assert_eq!(svc.get_note(&b).unwrap().references, vec![a.clone()]);

    // Duplicate and self-links are rejected
    assert!(svc.add_link(&b, &a).is_none());
    assert!(svc.add_link(&a, &a).is_none());

    svc.delete_link(&link_id);
    assert!(svc.links().is_empty());
    assert!(svc.get_note(&a).unwrap().references.is_empty());
    assert!(svc.get_note(&b).unwrap().references.is_empty());
}

#[tokio::test]
async fn backlinks_reflect_incoming_references() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 100.0, 0.0));

    svc.update_note(&a, NoteUpdate::content("[[Banana]]"));

    let backlinks = svc.backlinks(&b);
    assert_eq!(backlinks.len(), 1);
    assert_eq!(backlinks[0].id, a);
}

//
// DELETE CASCADE
//

#[tokio::test]
async fn deleting_a_note_leaves_no_dangling_state() {
    let (mut svc, store, gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 100.0, 0.0));
    let c = svc.add_note(draft("Cherry", 200.0, 0.0));
    svc.update_note(&b, NoteUpdate::content("[[Apple]]")); // link b-a
    svc.update_note(&c, NoteUpdate::content("[[Apple]]")); // link c-a
    let cluster_id = svc
        .create_cluster("Fruit", &[a.clone(), b.clone()], "#fca")
        .unwrap();

    svc.delete_note(&a);

    assert!(svc.get_note(&a).is_none());
    assert!(svc.links().is_empty());
    assert!(svc.get_note(&b).unwrap().references.is_empty());
    assert!(svc.get_note(&c).unwrap().references.is_empty());
    let cluster = svc.get_cluster(&cluster_id).unwrap();
    assert_eq!(cluster.children, vec![b.clone()]);

    eventually(
        || async {
            let notes = store.all_notes().await.unwrap();
            let links = store.all_links().await.unwrap();
            !notes.contains_key(&a) && links.is_empty()
        },
        "delete cascade persisted",
    )
    .await;
    eventually(
        || async { !gateway.remote_notes().contains_key(&a) && gateway.remote_links().is_empty() },
        "delete cascade mirrored to remote",
    )
    .await;
}

#[tokio::test]
async fn deleting_an_unknown_note_is_a_no_op() {
    let (mut svc, _store, _gateway) = service().await;
    svc.add_note(draft("Apple", 0.0, 0.0));
    svc.delete_note("no-such-id");
    assert_eq!(svc.notes().len(), 1);
}

//
// CLUSTERS AND CENTROIDS
//

#[tokio::test]
async fn cluster_centroid_is_the_mean_of_its_children() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    let b = svc.add_note(draft("B", 10.0, 20.0));

    let cluster_id = svc
        .create_cluster("Pair", &[a.clone(), b.clone()], "#abc")
        .unwrap();
    let cluster = svc.get_cluster(&cluster_id).unwrap();
    assert_eq!((cluster.x, cluster.y), (5.0, 10.0));

    // Moving a member recomputes the centroid
    svc.update_note_position(&a, 20.0, 40.0);
    let cluster = svc.get_cluster(&cluster_id).unwrap();
    assert_eq!((cluster.x, cluster.y), (15.0, 30.0));
}

#[tokio::test]
async fn create_cluster_dedupes_member_ids() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 10.0, 0.0));
    let b = svc.add_note(draft("B", 20.0, 0.0));

    let cluster_id = svc
        .create_cluster("Dup", &[a.clone(), a.clone(), b.clone()], "#abc")
        .unwrap();

    let cluster = svc.get_cluster(&cluster_id).unwrap();
    assert_eq!(cluster.children, vec![a.clone(), b.clone()]);
    // A repeated ID must not skew the centroid towards that note
    assert_eq!((cluster.x, cluster.y), (15.0, 0.0));
}

#[tokio::test]
async fn create_cluster_emits_updates_for_reparented_members() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    let b = svc.add_note(draft("B", 10.0, 0.0));
    let mut rx = svc.subscribe_to_events();

    svc.create_cluster("Pair", &[a.clone(), b.clone()], "#abc");

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event.event_type().to_string());
    }
    assert!(seen.contains(&"cluster:created".to_string()));
    assert_eq!(seen.iter().filter(|t| *t == "note:updated").count(), 2);
}

#[tokio::test]
async fn cluster_reposition_translates_children_rigidly() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    let b = svc.add_note(draft("B", 10.0, 0.0));
    let cluster_id = svc
        .create_cluster("Pair", &[a.clone(), b.clone()], "#abc")
        .unwrap();

    // Centroid starts at (5, 0); move it to (105, 50)
    svc.update_cluster_position(&cluster_id, 105.0, 50.0);

    let na = svc.get_note(&a).unwrap();
    let nb = svc.get_note(&b).unwrap();
    assert_eq!((na.x, na.y), (100.0, 50.0));
    assert_eq!((nb.x, nb.y), (110.0, 50.0));
    // Invariant re-established by construction
    let cluster = svc.get_cluster(&cluster_id).unwrap();
    assert_eq!((cluster.x, cluster.y), (105.0, 50.0));
}

#[tokio::test]
async fn membership_is_exclusive_and_empty_clusters_survive() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    let first = svc.create_cluster("First", &[a.clone()], "#abc").unwrap();
    let second = svc.create_cluster("Second", &[a.clone()], "#def").unwrap();

    assert!(svc.get_cluster(&first).unwrap().children.is_empty());
    assert_eq!(svc.get_cluster(&second).unwrap().children, vec![a.clone()]);
    assert_eq!(
        svc.get_note(&a).unwrap().cluster_id.as_deref(),
        Some(second.as_str())
    );

    // The emptied cluster keeps its last position
    let stub = svc.get_cluster(&first).unwrap();
    assert_eq!((stub.x, stub.y), (0.0, 0.0));
}

#[tokio::test]
async fn deleting_a_cluster_frees_its_notes() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    let cluster_id = svc.create_cluster("Solo", &[a.clone()], "#abc").unwrap();

    svc.delete_cluster(&cluster_id);

    assert!(svc.get_cluster(&cluster_id).is_none());
    let note = svc.get_note(&a).unwrap();
    assert!(note.cluster_id.is_none());
}

#[tokio::test]
async fn create_cluster_with_no_valid_members_is_a_no_op() {
    let (mut svc, _store, _gateway) = service().await;
    assert!(svc.create_cluster("Empty", &[], "#abc").is_none());
    assert!(svc
        .create_cluster("Ghost", &["nope".to_string()], "#abc")
        .is_none());
    assert!(svc.clusters().is_empty());
}

//
// DRAG LIFECYCLE
//

#[tokio::test]
async fn drag_frames_are_transient_until_commit() {
    let (mut svc, store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    eventually(
        || async { store.all_notes().await.unwrap().contains_key(&a) },
        "initial note persisted",
    )
    .await;
    let modified_before = svc.get_note(&a).unwrap().modified;

    svc.begin_drag(&a);
    svc.drag_to(30.0, 40.0);

    // Optimistic position, untouched timestamp, untouched store
    let note = svc.get_note(&a).unwrap();
    assert_eq!((note.x, note.y), (30.0, 40.0));
    assert_eq!(note.modified, modified_before);
    tokio::time::sleep(Duration::from_millis(30)).await;
    let persisted = &store.all_notes().await.unwrap()[&a];
    assert_eq!((persisted.x, persisted.y), (0.0, 0.0));

    svc.end_drag(50.0, 60.0);
    let note = svc.get_note(&a).unwrap();
    assert_eq!((note.x, note.y), (50.0, 60.0));
    assert!(note.modified >= modified_before);
    eventually(
        || async {
            let persisted = &store.all_notes().await.unwrap()[&a];
            (persisted.x, persisted.y) == (50.0, 60.0)
        },
        "final drag position persisted",
    )
    .await;
}

#[tokio::test]
async fn dragging_a_selected_note_moves_the_whole_selection() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    let b = svc.add_note(draft("B", 10.0, 10.0));
    let c = svc.add_note(draft("C", 500.0, 500.0));
    svc.set_selection([a.clone(), b.clone()]);

    svc.begin_drag(&a);
    svc.end_drag(100.0, 0.0);

    assert_eq!(
        (svc.get_note(&a).unwrap().x, svc.get_note(&a).unwrap().y),
        (100.0, 0.0)
    );
    // Relative layout preserved
    assert_eq!(
        (svc.get_note(&b).unwrap().x, svc.get_note(&b).unwrap().y),
        (110.0, 10.0)
    );
    // Unselected note untouched
    assert_eq!(
        (svc.get_note(&c).unwrap().x, svc.get_note(&c).unwrap().y),
        (500.0, 500.0)
    );
}

#[tokio::test]
async fn dragging_an_unselected_note_moves_only_that_note() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 0.0, 0.0));
    let b = svc.add_note(draft("B", 10.0, 10.0));
    svc.set_selection([b.clone()]);

    svc.begin_drag(&a);
    svc.end_drag(50.0, 50.0);

    assert_eq!((svc.get_note(&a).unwrap().x), 50.0);
    assert_eq!((svc.get_note(&b).unwrap().x), 10.0);
}

//
// SELECTION
//

#[tokio::test]
async fn rect_selection_hits_contained_notes() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("A", 5.0, 5.0));
    let _b = svc.add_note(draft("B", 200.0, 200.0));

    // Dragged from bottom-right to top-left
    svc.select_in_rect(10.0, 10.0, 0.0, 0.0);
    assert_eq!(svc.selection().len(), 1);
    assert!(svc.selection().contains(&a));

    svc.clear_selection();
    assert!(svc.selection().is_empty());
}

//
// PERSISTENCE
//

#[tokio::test]
async fn state_survives_a_reload_from_the_local_store() {
    let db = Arc::new(DatabaseService::new_in_memory().await.unwrap());
    let store = Arc::new(TursoStore::new(db));

    let mut svc = CanvasService::new(store.clone());
    let a = svc.add_note(draft("Apple", 1.0, 2.0));
    let b = svc.add_note(draft("Banana", 3.0, 4.0));
    svc.update_note(&a, NoteUpdate::content("[[Banana]]"));
    let cluster_id = svc
        .create_cluster("Fruit", &[a.clone(), b.clone()], "#fca")
        .unwrap();

    eventually(
        || async {
            store.all_notes().await.unwrap().len() == 2
                && store.all_links().await.unwrap().len() == 1
                && store.all_clusters().await.unwrap().len() == 1
        },
        "full state persisted",
    )
    .await;

    let reloaded = CanvasService::load(store.clone()).await.unwrap();
    assert_eq!(reloaded.notes().len(), 2);
    assert_eq!(reloaded.get_note(&a).unwrap().references, vec![b.clone()]);
    assert_eq!(reloaded.links().len(), 1);
    assert!(reloaded.get_cluster(&cluster_id).is_some());
}

//
// REMOTE SYNC
//

#[tokio::test]
async fn first_sync_migrates_local_data_to_an_untouched_remote() {
    let (mut svc, _store, gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));

    assert_ok!(svc.initialize_sync("user-1").await);

    let remote = gateway.remote_notes();
    assert!(remote.contains_key(&a));
    assert!(gateway.has_remote_data().await.unwrap().sentinel);
}

#[tokio::test]
async fn sync_against_a_used_remote_skips_migration() {
    let (mut svc, _store, gateway) = service().await;
    gateway.seed_sentinel_only();
    svc.add_note(draft("Apple", 0.0, 0.0));

    svc.initialize_sync("user-1").await.unwrap();

    // Intentionally emptied account: nothing is re-uploaded
    assert!(gateway.remote_notes().is_empty());
}

#[tokio::test]
async fn sync_without_a_gateway_fails_explicitly() {
    let db = Arc::new(DatabaseService::new_in_memory().await.unwrap());
    let svc = CanvasService::new(Arc::new(TursoStore::new(db)));
    assert!(svc.initialize_sync("user-1").await.is_err());
}

#[tokio::test]
async fn remote_snapshot_merge_is_last_writer_wins_with_remote_ties() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 0.0, 0.0));

    // Remote copy of a is newer, remote copy of b is older
    let mut remote_a = svc.get_note(&a).unwrap().clone();
    remote_a.title = "Remote Apple".to_string();
    remote_a.modified = now_millis() + 10_000;
    let mut remote_b = svc.get_note(&b).unwrap().clone();
    remote_b.title = "Stale Banana".to_string();
    remote_b.modified -= 10_000;

    let snapshot = HashMap::from([(a.clone(), remote_a), (b.clone(), remote_b)]);
    svc.apply_remote_notes(snapshot);

    assert_eq!(svc.get_note(&a).unwrap().title, "Remote Apple");
    assert_eq!(svc.get_note(&b).unwrap().title, "Banana");
}

#[tokio::test]
async fn remote_snapshot_membership_drops_local_notes() {
    let (mut svc, store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 0.0, 0.0));
    svc.set_selection([b.clone()]);

    let snapshot = HashMap::from([(a.clone(), svc.get_note(&a).unwrap().clone())]);
    svc.apply_remote_notes(snapshot);

    assert!(svc.get_note(&a).is_some());
    assert!(svc.get_note(&b).is_none());
    assert!(svc.selection().is_empty());
    eventually(
        || async { !store.all_notes().await.unwrap().contains_key(&b) },
        "dropped note removed from local store",
    )
    .await;
}

#[tokio::test]
async fn empty_remote_snapshot_empties_the_canvas() {
    let (mut svc, _store, _gateway) = service().await;
    svc.add_note(draft("Apple", 0.0, 0.0));

    svc.apply_remote_notes(HashMap::new());
    svc.apply_remote_clusters(HashMap::new());
    svc.apply_remote_links(HashMap::new());

    assert!(svc.notes().is_empty());
    assert!(svc.clusters().is_empty());
    assert!(svc.links().is_empty());
}

#[tokio::test]
async fn force_push_uploads_every_entity() {
    let (mut svc, _store, gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 0.0, 0.0));
    svc.add_link(&a, &b);

    let summary = svc.force_push_all().await.unwrap();
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(gateway.remote_notes().len(), 2);
    assert_eq!(gateway.remote_links().len(), 1);
}

//
// IMPORT / EXPORT
//

#[tokio::test]
async fn export_then_import_restores_state_wholesale() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    let b = svc.add_note(draft("Banana", 100.0, 0.0));
    svc.update_note(&a, NoteUpdate::content("[[Banana]]"));
    svc.create_cluster("Fruit", &[a.clone(), b.clone()], "#fca");

    let backup = serde_json::to_value(svc.export_data()).unwrap();

    // Import into a service that already holds unrelated data
    let (mut other, other_store, _gw) = service().await;
    other.add_note(draft("Doomed", 0.0, 0.0));

    let summary = other.import_data(backup).unwrap();
    assert_eq!(summary.notes, 2);
    assert_eq!(summary.clusters, 1);
    assert_eq!(summary.links, 1);

    // Restore, not merge: pre-existing data is gone
    assert!(other.notes().values().all(|n| n.title != "Doomed"));
    assert_eq!(other.get_note(&a).unwrap().references, vec![b.clone()]);

    eventually(
        || async {
            let notes = other_store.all_notes().await.unwrap();
            notes.len() == 2 && !notes.values().any(|n| n.title == "Doomed")
        },
        "imported state written through",
    )
    .await;
}

#[tokio::test]
async fn import_rejects_malformed_backups() {
    let (mut svc, _store, _gateway) = service().await;

    let err = svc.import_data(json!({"version": 1})).unwrap_err();
    assert!(matches!(err, ImportError::InvalidFormat(_)));

    let err = svc.import_data(json!({"data": {"clusters": {}}})).unwrap_err();
    assert!(matches!(err, ImportError::MissingNotes));

    let err = svc
        .import_data(json!({"data": {"notes": "not a map"}}))
        .unwrap_err();
    assert!(matches!(err, ImportError::InvalidFormat(_)));
}

//
// EVENTS
//

#[tokio::test]
async fn mutations_emit_domain_events() {
    let (mut svc, _store, _gateway) = service().await;
    let mut rx = svc.subscribe_to_events();

    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    svc.update_note(&a, NoteUpdate::title("Apfel"));
    svc.delete_note(&a);

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event.event_type().to_string());
    }
    assert_eq!(seen, vec!["note:created", "note:updated", "note:deleted"]);
}

#[tokio::test]
async fn editing_follows_note_lifecycle() {
    let (mut svc, _store, _gateway) = service().await;
    let a = svc.add_note(draft("Apple", 0.0, 0.0));
    assert_eq!(svc.editing(), Some(a.as_str()));

    svc.set_editing(None);
    assert_eq!(svc.editing(), None);

    svc.set_editing(Some(a.clone()));
    svc.delete_note(&a);
    assert_eq!(svc.editing(), None);
}
