//! End-to-end engine tests over the in-memory store: chain policy, the
//! materializer, WIP lifecycle, cancellation, and failure modes.

use std::sync::Arc;

use assert_matches::assert_matches;
use mxvault_core::chain::{CHAIN_SAFETY_LIMIT, MAX_CHAIN_DEPTH};
use mxvault_core::diff::compute_patch;
use mxvault_core::version::WIP_VERSION;
use mxvault_core::CoreError;
use mxvault_engine::memory::InMemoryVersionStore;
use mxvault_engine::{
    EngineError, NewVersion, SaveVersionOptions, VersionManager, VersionStore,
};
use mxvault_events::{topics, EventBus};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn document(revision: usize) -> String {
    let cells: String = (0..=revision)
        .map(|i| format!("    <mxCell id=\"cell-{i}\"/>\n"))
        .collect();
    format!(
        "<mxfile>\n  <diagram id=\"main\" name=\"Main\">\n{cells}  </diagram>\n</mxfile>\n"
    )
}

fn manager() -> (VersionManager, Arc<EventBus>, Arc<InMemoryVersionStore>) {
    let store = Arc::new(InMemoryVersionStore::new());
    let events = Arc::new(EventBus::default());
    let manager = VersionManager::new(store.clone(), events.clone());
    (manager, events, store)
}

#[tokio::test]
async fn first_save_is_a_keyframe_with_default_version() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    let saved = manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();

    assert!(saved.is_keyframe);
    assert_eq!(saved.diff_chain_depth, 0);
    assert_eq!(saved.semantic_version, "1.0.0");
    assert!(saved.source_version_id.is_none());
}

#[tokio::test]
async fn saved_versions_materialize_back_to_their_document() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    let mut ids = Vec::new();
    for revision in 0..5 {
        let saved = manager
            .save_version(project, &document(revision), SaveVersionOptions::default())
            .await
            .unwrap();
        ids.push(saved.id);
    }

    for (revision, id) in ids.iter().enumerate() {
        let materialized = manager.export_version(*id, &cancel).await.unwrap();
        assert_eq!(materialized, document(revision));
    }
}

#[tokio::test]
async fn consecutive_saves_store_diffs_with_increasing_depth() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    let first = manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();
    let second = manager
        .save_version(project, &document(1), SaveVersionOptions::default())
        .await
        .unwrap();
    let third = manager
        .save_version(project, &document(2), SaveVersionOptions::default())
        .await
        .unwrap();

    assert!(!second.is_keyframe);
    assert_eq!(second.diff_chain_depth, 1);
    assert_eq!(second.source_version_id, Some(first.id));
    assert_eq!(third.diff_chain_depth, 2);
    assert_eq!(third.source_version_id, Some(second.id));
    // A diff's content is a patch blob, never the document itself.
    assert_ne!(second.content, document(1));
}

#[tokio::test]
async fn keyframe_is_promoted_after_max_chain_depth_diffs() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    let total_saves = MAX_CHAIN_DEPTH as usize + 2;
    let mut saved = Vec::new();
    for revision in 0..total_saves {
        saved.push(
            manager
                .save_version(project, &document(revision), SaveVersionOptions::default())
                .await
                .unwrap(),
        );
    }

    // Depths: keyframe 0, then diffs 1..=MAX_CHAIN_DEPTH-1, then a forced
    // keyframe at depth 0 again.
    assert!(saved[0].is_keyframe);
    for (index, version) in saved.iter().enumerate().take(MAX_CHAIN_DEPTH as usize).skip(1) {
        assert!(!version.is_keyframe, "save {index} should be a diff");
        assert_eq!(version.diff_chain_depth, index as i32);
    }
    let promoted = &saved[MAX_CHAIN_DEPTH as usize];
    assert!(promoted.is_keyframe, "save at the bound must be promoted");
    assert_eq!(promoted.diff_chain_depth, 0);
    assert!(!saved[MAX_CHAIN_DEPTH as usize + 1].is_keyframe);

    // Every version along the way still materializes to its document.
    for (revision, version) in saved.iter().enumerate() {
        assert_eq!(
            manager.export_version(version.id, &cancel).await.unwrap(),
            document(revision)
        );
    }
}

#[tokio::test]
async fn chain_depth_never_exceeds_the_bound() {
    let (manager, _, store) = manager();
    let project = Uuid::now_v7();

    for revision in 0..(MAX_CHAIN_DEPTH as usize * 2 + 3) {
        manager
            .save_version(project, &document(revision), SaveVersionOptions::default())
            .await
            .unwrap();
    }

    for row in store.list_by_project(project).await.unwrap() {
        assert!(row.diff_chain_depth < MAX_CHAIN_DEPTH);
        assert!(row.diff_chain_depth >= 0);
    }
}

#[tokio::test]
async fn autosave_maintains_a_single_wip_row() {
    let (manager, _, store) = manager();
    let project = Uuid::now_v7();

    let first = manager.autosave(project, &document(0)).await.unwrap();
    for revision in 1..6 {
        manager.autosave(project, &document(revision)).await.unwrap();
    }

    let wip_rows: Vec<_> = store
        .list_by_project(project)
        .await
        .unwrap()
        .into_iter()
        .filter(|row| row.semantic_version == WIP_VERSION)
        .collect();
    assert_eq!(wip_rows.len(), 1);
    assert_eq!(wip_rows[0].id, first.id, "WIP id must stay stable");
    assert_eq!(wip_rows[0].content, document(5));
    assert!(wip_rows[0].is_keyframe, "WIP content is always stored whole");
}

#[tokio::test]
async fn concurrent_autosaves_never_duplicate_the_wip_row() {
    let (manager, _, store) = manager();
    let manager = Arc::new(manager);
    let project = Uuid::now_v7();

    let mut handles = Vec::new();
    for revision in 0..10 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.autosave(project, &document(revision)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let wip_rows = store
        .list_by_project(project)
        .await
        .unwrap()
        .into_iter()
        .filter(|row| row.semantic_version == WIP_VERSION)
        .count();
    assert_eq!(wip_rows, 1);
}

#[tokio::test]
async fn wip_rows_are_never_used_as_diff_parents() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    manager.autosave(project, &document(0)).await.unwrap();
    let saved = manager
        .save_version(project, &document(1), SaveVersionOptions::default())
        .await
        .unwrap();

    // With only a WIP row present, the historical save has no parent.
    assert!(saved.is_keyframe);
    assert!(saved.source_version_id.is_none());
}

#[tokio::test]
async fn restore_overwrites_the_live_buffer() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    let saved = manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();
    manager.autosave(project, &document(7)).await.unwrap();

    let restored = manager
        .restore_version(project, saved.id, &cancel)
        .await
        .unwrap();
    assert_eq!(restored, document(0));

    let wip = manager.get_wip(project).await.unwrap().unwrap();
    assert_eq!(wip.content, document(0));
}

#[tokio::test]
async fn failed_restore_leaves_the_live_buffer_untouched() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    manager.autosave(project, &document(3)).await.unwrap();

    let err = manager.restore_version(project, 9999, &cancel).await.unwrap_err();
    assert_matches!(err, EngineError::VersionNotFound { version_id: 9999 });

    let wip = manager.get_wip(project).await.unwrap().unwrap();
    assert_eq!(wip.content, document(3));
}

#[tokio::test]
async fn export_does_not_touch_the_live_buffer() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    let saved = manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();
    manager.autosave(project, &document(9)).await.unwrap();

    let exported = manager.export_version(saved.id, &cancel).await.unwrap();
    assert_eq!(exported, document(0));

    let wip = manager.get_wip(project).await.unwrap().unwrap();
    assert_eq!(wip.content, document(9));
}

#[tokio::test]
async fn deleting_an_ancestor_breaks_dependent_chains_detectably() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    let keyframe = manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();
    let diff = manager
        .save_version(project, &document(1), SaveVersionOptions::default())
        .await
        .unwrap();
    assert!(!diff.is_keyframe);

    manager.delete_version(project, keyframe.id).await.unwrap();

    let err = manager.export_version(diff.id, &cancel).await.unwrap_err();
    assert_matches!(
        err,
        EngineError::ChainBroken { version_id, ref walked }
            if version_id == diff.id && walked.contains(&diff.id)
    );
}

#[tokio::test]
async fn patch_against_the_wrong_base_is_detected() {
    let (manager, _, store) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    let keyframe = manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();

    // Hand-craft a diff row whose patch was computed against a different
    // base than the keyframe it claims as its source.
    let wrong_base = document(4);
    let patch = compute_patch(&wrong_base, &document(5));
    let forged = store
        .create(NewVersion {
            project_id: project,
            semantic_version: "1.1.0".to_string(),
            is_keyframe: false,
            content: patch.encode(),
            source_version_id: Some(keyframe.id),
            diff_chain_depth: 1,
            page_count: 1,
            page_names: vec!["Page 1".to_string()],
            name: None,
            description: None,
        })
        .await
        .unwrap();

    let err = manager.export_version(forged.id, &cancel).await.unwrap_err();
    assert_matches!(
        err,
        EngineError::PatchMismatch { version_id, position: 0, .. } if version_id == forged.id
    );
}

#[tokio::test]
async fn diff_without_a_source_is_a_broken_chain() {
    let (manager, _, store) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    // A diff row with a null source can only come from store corruption.
    let orphan = store
        .create(NewVersion {
            project_id: project,
            semantic_version: "1.0.0".to_string(),
            is_keyframe: false,
            content: compute_patch(&document(0), &document(1)).encode(),
            source_version_id: None,
            diff_chain_depth: 1,
            page_count: 1,
            page_names: vec!["Page 1".to_string()],
            name: None,
            description: None,
        })
        .await
        .unwrap();

    let err = manager.export_version(orphan.id, &cancel).await.unwrap_err();
    assert_matches!(err, EngineError::ChainBroken { .. });
}

#[tokio::test]
async fn runaway_chains_hit_the_safety_bound() {
    let (manager, _, store) = manager();
    let project = Uuid::now_v7();
    let cancel = CancellationToken::new();

    // Hand-craft a diff chain longer than the safety bound, something the
    // chain policy can never produce.
    let patch_blob = compute_patch(&document(0), &document(1)).encode();
    let mut previous: Option<i64> = None;
    let mut last_id = 0;
    for depth in 0..(CHAIN_SAFETY_LIMIT + 5) {
        let row = store
            .create(NewVersion {
                project_id: project,
                semantic_version: format!("1.{depth}.0"),
                is_keyframe: false,
                content: patch_blob.clone(),
                source_version_id: previous,
                diff_chain_depth: depth as i32,
                page_count: 1,
                page_names: vec!["Page 1".to_string()],
                name: None,
                description: None,
            })
            .await
            .unwrap();
        previous = Some(row.id);
        last_id = row.id;
    }

    let err = manager.export_version(last_id, &cancel).await.unwrap_err();
    assert_matches!(
        err,
        EngineError::ChainTooLong { limit, .. } if limit == CHAIN_SAFETY_LIMIT
    );
}

#[tokio::test]
async fn cancelled_materialization_returns_promptly() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();
    let diff = manager
        .save_version(project, &document(1), SaveVersionOptions::default())
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = manager.export_version(diff.id, &cancel).await.unwrap_err();
    assert_matches!(err, EngineError::Cancelled);
}

#[tokio::test]
async fn wip_row_cannot_be_deleted() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    let wip = manager.autosave(project, &document(0)).await.unwrap();
    let err = manager.delete_version(project, wip.id).await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn versions_are_scoped_to_their_project() {
    let (manager, _, _) = manager();
    let project_a = Uuid::now_v7();
    let project_b = Uuid::now_v7();

    let saved = manager
        .save_version(project_a, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();

    let err = manager.delete_version(project_b, saved.id).await.unwrap_err();
    assert_matches!(err, EngineError::VersionNotFound { .. });
}

#[tokio::test]
async fn caller_supplied_metadata_is_validated() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    let err = manager
        .save_version(
            project,
            &document(0),
            SaveVersionOptions {
                page_count: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::InvalidPageCount(_)));

    let err = manager
        .save_version(
            project,
            &document(0),
            SaveVersionOptions {
                semantic_version: Some(WIP_VERSION.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn page_metadata_is_captured_at_save_time() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    let xml = "<mxfile><diagram id=\"a\" name=\"Overview\"/><diagram id=\"b\" name=\"Detail\"/></mxfile>";
    let saved = manager
        .save_version(project, xml, SaveVersionOptions::default())
        .await
        .unwrap();

    assert_eq!(saved.page_count, 2);
    assert_eq!(saved.page_names, vec!["Overview", "Detail"]);
}

#[tokio::test]
async fn mutations_publish_domain_events() {
    let (manager, events, _) = manager();
    let project = Uuid::now_v7();
    let mut rx = events.subscribe();

    let saved = manager
        .save_version(project, &document(0), SaveVersionOptions::default())
        .await
        .unwrap();
    manager.autosave(project, &document(1)).await.unwrap();
    manager.delete_version(project, saved.id).await.unwrap();

    let created = rx.recv().await.unwrap();
    assert_eq!(created.event_type, topics::VERSION_CREATED);
    assert_eq!(created.project_id, Some(project));
    assert_eq!(created.version_id, Some(saved.id));

    let wip_updated = rx.recv().await.unwrap();
    assert_eq!(wip_updated.event_type, topics::WIP_UPDATED);

    let deleted = rx.recv().await.unwrap();
    assert_eq!(deleted.event_type, topics::VERSION_DELETED);
    assert_eq!(deleted.version_id, Some(saved.id));
}

#[tokio::test]
async fn explicit_labels_and_descriptions_are_stored() {
    let (manager, _, _) = manager();
    let project = Uuid::now_v7();

    let saved = manager
        .save_version(
            project,
            &document(0),
            SaveVersionOptions {
                name: Some("Before the refactor".to_string()),
                description: Some("Snapshot taken before moving the gateway".to_string()),
                semantic_version: Some("2.0.0".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(saved.semantic_version, "2.0.0");
    assert_eq!(saved.name.as_deref(), Some("Before the refactor"));

    let next = manager
        .save_version(project, &document(1), SaveVersionOptions::default())
        .await
        .unwrap();
    assert_eq!(next.semantic_version, "2.1.0");
}
