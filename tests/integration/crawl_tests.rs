//! End-to-end crawl runs through a scripted fetcher and an on-disk store

use crate::common::{create_test_config, story_page, ScriptedFetcher};
use id_sweep::crawler::Coordinator;
use id_sweep::output::{export_documents, generate_summary, load_export};
use id_sweep::storage::{RunStatus, SqliteStorage, Storage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn coordinator(
    dir: &Path,
    start: i64,
    end: i64,
    workers: u32,
    fetcher: Arc<ScriptedFetcher>,
) -> Coordinator {
    let config = create_test_config(dir, start, end, workers);
    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    Coordinator::new(config, storage, fetcher)
        .unwrap()
        .with_config_hash("test-hash")
}

#[tokio::test]
async fn test_single_story_is_stored() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new(HashMap::from([(1, story_page("Test", 150))])));
    let coordinator = coordinator(dir.path(), 1, 1, 1, fetcher);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stats.attempted, 1);
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.stats.empty, 0);

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    let document = storage.get_document(1).unwrap();
    assert_eq!(document.title, "Test");
    assert_eq!(document.word_count, 150);
    assert_eq!(document.url, "https://stories.example.com/story?id=1");
}

#[tokio::test]
async fn test_short_page_is_empty() {
    let dir = tempdir().unwrap();
    let body = format!(
        "<html><body><h1>Short</h1><p>{}</p></body></html>",
        "y".repeat(30)
    );
    let fetcher = Arc::new(ScriptedFetcher::new(HashMap::from([(1, body)])));
    let coordinator = coordinator(dir.path(), 1, 1, 1, fetcher);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stats.empty, 1);
    assert_eq!(report.stats.succeeded, 0);
    let storage = coordinator.storage();
    assert_eq!(storage.lock().unwrap().count_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_fetch_failure_is_failed() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new(HashMap::new()));
    let coordinator = coordinator(dir.path(), 1, 1, 1, fetcher);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.attempted, 1);
    let storage = coordinator.storage();
    assert_eq!(storage.lock().unwrap().count_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_range_stores_every_id() {
    let dir = tempdir().unwrap();
    let pages = (1..=5)
        .map(|id| (id, story_page(&format!("Story {}", id), 100 + id as usize * 10)))
        .collect();
    let fetcher = Arc::new(ScriptedFetcher::new(pages).with_delay(Duration::from_millis(20)));
    let coordinator = coordinator(dir.path(), 1, 5, 3, Arc::clone(&fetcher));

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stats.attempted, 5);
    assert_eq!(report.stats.succeeded, 5);
    assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 3);

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    let ids: Vec<i64> = storage
        .list_documents()
        .unwrap()
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_recrawl_updates_in_place() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new(HashMap::from([(1, story_page("Test", 150))])));
    let coordinator = coordinator(dir.path(), 1, 1, 1, Arc::clone(&fetcher));
    coordinator.run().await.unwrap();

    fetcher.set_page(1, story_page("Test2", 200));
    let report = coordinator.run().await.unwrap();
    assert_eq!(report.stats.succeeded, 1);

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_documents().unwrap(), 1);
    let document = storage.get_document(1).unwrap();
    assert_eq!(document.title, "Test2");
    assert_eq!(document.word_count, 200);
}

#[tokio::test]
async fn test_every_id_is_accounted_for() {
    let dir = tempdir().unwrap();
    let mut pages: HashMap<i64, String> = (1..=20)
        .filter(|id| id % 4 != 0)
        .map(|id| (id, story_page("Story", 120)))
        .collect();
    for id in [3, 7] {
        pages.insert(id, "<html><body><h1>Stub</h1></body></html>".to_string());
    }
    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let coordinator = coordinator(dir.path(), 1, 20, 4, fetcher);

    let report = coordinator.run().await.unwrap();
    let stats = report.stats;

    assert_eq!(stats.succeeded, 13);
    assert_eq!(stats.empty, 2);
    assert_eq!(stats.failed, 5);
    assert!(stats.is_conserved());
    assert_eq!(
        stats.succeeded + stats.empty + stats.failed + stats.skipped + report.not_attempted,
        report.total_targets()
    );
}

#[tokio::test]
async fn test_cancellation_stops_scheduling() {
    let dir = tempdir().unwrap();
    let pages = (1..=30).map(|id| (id, story_page("Story", 120))).collect();
    let fetcher = Arc::new(ScriptedFetcher::new(pages).with_delay(Duration::from_millis(40)));
    let coordinator = coordinator(dir.path(), 1, 30, 1, Arc::clone(&fetcher));

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.store(true, Ordering::SeqCst);
    });

    let report = coordinator.run().await.unwrap();

    assert!(report.cancelled);
    assert!(report.stats.attempted < 30);
    assert!(report.not_attempted > 0);
    assert_eq!(report.stats.attempted + report.not_attempted, 30);
    assert_eq!(fetcher.calls() as u64, report.stats.attempted);

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    let run = storage.get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);
    assert_eq!(run.not_attempted, report.not_attempted);
}

#[tokio::test]
async fn test_resume_after_partial_run() {
    let dir = tempdir().unwrap();
    let pages = (1..=6).map(|id| (id, story_page("Story", 120))).collect();
    let fetcher = Arc::new(ScriptedFetcher::new(pages));

    coordinator(dir.path(), 1, 3, 2, Arc::clone(&fetcher))
        .run()
        .await
        .unwrap();

    let resumed = coordinator(dir.path(), 1, 6, 2, Arc::clone(&fetcher)).with_resume(true);
    let report = resumed.run().await.unwrap();

    assert_eq!(report.stats.skipped, 3);
    assert_eq!(report.stats.succeeded, 3);
    assert_eq!(fetcher.calls(), 6);
}

#[tokio::test]
async fn test_store_survives_reopen_and_exports() {
    let dir = tempdir().unwrap();
    let pages = HashMap::from([
        (1, story_page("A love letter", 150)),
        (2, story_page("The fox and the crow", 150)),
        (3, story_page("Untitled", 150)),
    ]);
    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let config = create_test_config(dir.path(), 1, 3, 2);
    let db_path = config.output.database_path.clone();
    let export_path = dir.path().join("out").join("stories.json");

    let report = coordinator(dir.path(), 1, 3, 2, fetcher).run().await.unwrap();
    assert_eq!(report.distinct_categories, 3);

    let storage = SqliteStorage::new(Path::new(&db_path)).unwrap();
    let documents = storage.list_documents().unwrap();
    assert_eq!(documents.len(), 3);
    assert_eq!(documents[0].category, "love");
    assert_eq!(documents[1].category, "fable");
    assert_eq!(documents[2].category, "other");

    let written = export_documents(&storage, &export_path, Some(2)).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(load_export(&written).unwrap(), documents);

    let summary = generate_summary(&storage).unwrap();
    assert_eq!(summary.run_id, report.run_id);
    assert_eq!(summary.config_hash, "test-hash");
    assert_eq!(summary.total_documents, 3);
    assert!(summary.is_fully_accounted());
}

#[tokio::test]
async fn test_rejected_writes_count_as_failed() {
    let dir = tempdir().unwrap();
    let pages = (1..=4).map(|id| (id, story_page("Story", 120))).collect();
    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let coordinator = coordinator(dir.path(), 1, 4, 2, fetcher);

    // Every document insert aborts; the rest of the schema stays usable
    let conn = rusqlite::Connection::open(dir.path().join("sweep.db")).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_documents BEFORE INSERT ON documents
         BEGIN SELECT RAISE(ABORT, 'documents are read-only'); END;",
    )
    .unwrap();

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stats.attempted, 4);
    assert_eq!(report.stats.failed, 4);
    assert_eq!(report.stats.succeeded, 0);
    assert!(report.stats.is_conserved());
    assert!(!report.cancelled);

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_documents().unwrap(), 0);
    assert_eq!(
        storage.get_run(report.run_id).unwrap().status,
        RunStatus::Completed
    );
}

#[tokio::test]
async fn test_run_error_marks_run_failed() {
    let dir = tempdir().unwrap();
    let pages = (1..=3).map(|id| (id, story_page("Story", 120))).collect();
    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let coordinator = coordinator(dir.path(), 1, 3, 2, fetcher);

    // The category rebuild at the end of the run has nowhere to write
    let conn = rusqlite::Connection::open(dir.path().join("sweep.db")).unwrap();
    conn.execute_batch("DROP TABLE categories;").unwrap();

    assert!(coordinator.run().await.is_err());

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.finished_at.is_some());
    assert_eq!(run.succeeded, 3);
    assert_eq!(run.not_attempted, 0);
}

#[tokio::test]
async fn test_coordinator_runs_again_after_cancel() {
    let dir = tempdir().unwrap();
    let pages = (1..=5).map(|id| (id, story_page("Story", 120))).collect();
    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let coordinator = coordinator(dir.path(), 1, 5, 2, Arc::clone(&fetcher));

    coordinator.cancel_handle().store(true, Ordering::SeqCst);
    let cancelled = coordinator.run().await.unwrap();
    assert!(cancelled.cancelled);
    assert_eq!(cancelled.not_attempted, 5);

    let report = coordinator.run().await.unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.stats.succeeded, 5);
    assert_eq!(report.not_attempted, 0);
    assert_eq!(fetcher.calls(), 5);
}
