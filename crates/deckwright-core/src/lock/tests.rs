use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use deckwright_config::LockTimings;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

struct Workspace {
    dir: TempDir,
    document: PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("temp dir");
    let document = dir.path().join("deck.json");
    fs::write(&document, "{}").expect("document");
    Workspace { dir, document }
}

fn quick_lock() -> FileLock {
    FileLock::new(LockTimings::from_millis(150, 60_000, 10))
}

fn write_marker(document: &Path, owner: &str, acquired_at: SystemTime) {
    let record = LockRecord::new(String::from(owner), 4242, acquired_at);
    let payload = serde_json::to_vec(&record).expect("serialise record");
    fs::write(marker_path(document), payload).expect("write marker");
}

#[rstest]
fn acquire_creates_marker_and_release_removes_it(workspace: Workspace) {
    let mut handle = quick_lock().acquire(&workspace.document).expect("acquire");
    assert!(handle.marker().exists());
    assert!(handle.reclaimed().is_none());

    handle.release().expect("release");
    assert!(!marker_path(&workspace.document).exists());
    assert!(handle.is_released());
}

#[rstest]
fn release_is_idempotent(workspace: Workspace) {
    let mut handle = quick_lock().acquire(&workspace.document).expect("acquire");
    handle.release().expect("first release");
    handle.release().expect("second release");
    drop(handle);
    assert!(!marker_path(&workspace.document).exists());
}

#[rstest]
fn drop_releases_the_lock(workspace: Workspace) {
    {
        let _handle = quick_lock().acquire(&workspace.document).expect("acquire");
        assert!(marker_path(&workspace.document).exists());
    }
    assert!(!marker_path(&workspace.document).exists());
}

#[rstest]
fn second_acquirer_times_out_with_contention(workspace: Workspace) {
    let _held = quick_lock().acquire(&workspace.document).expect("first acquire");

    let started = Instant::now();
    let error = quick_lock()
        .acquire(&workspace.document)
        .expect_err("second acquire must fail");
    assert!(error.is_retryable());
    match error {
        LockError::Contention { waited, holder, .. } => {
            assert!(waited >= Duration::from_millis(150));
            assert!(holder.starts_with("deckwright:"), "holder was {holder}");
        }
        other => panic!("expected contention, got {other}"),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[rstest]
fn stale_marker_is_reclaimed(workspace: Workspace) {
    let long_ago = UNIX_EPOCH + Duration::from_secs(1_000);
    write_marker(&workspace.document, "crashed-agent", long_ago);

    let handle = quick_lock().acquire(&workspace.document).expect("reclaim");
    let reclaimed = handle.reclaimed().expect("reclaim recorded");
    assert_eq!(reclaimed.previous_owner, "crashed-agent");
    assert!(reclaimed.age >= Duration::from_secs(60));
    assert_ne!(handle.owner(), "crashed-agent");
}

#[rstest]
fn fresh_foreign_marker_is_respected(workspace: Workspace) {
    write_marker(&workspace.document, "live-agent", SystemTime::now());
    let error = quick_lock()
        .acquire(&workspace.document)
        .expect_err("live holder keeps the lock");
    assert!(matches!(error, LockError::Contention { ref holder, .. } if holder == "live-agent"));
    assert!(marker_path(&workspace.document).exists());
}

#[rstest]
fn unreadable_marker_ages_by_modification_time(workspace: Workspace) {
    fs::write(marker_path(&workspace.document), b"").expect("empty marker");
    let lock = FileLock::new(LockTimings::from_millis(100, 1, 10));
    thread::sleep(Duration::from_millis(5));
    let handle = lock.acquire(&workspace.document).expect("reclaimed by mtime");
    assert_eq!(
        handle.reclaimed().map(|r| r.previous_owner.as_str()),
        Some("unknown")
    );
}

#[rstest]
fn release_leaves_a_marker_it_no_longer_owns(workspace: Workspace) {
    let mut handle = quick_lock().acquire(&workspace.document).expect("acquire");
    write_marker(&workspace.document, "usurper", SystemTime::now());
    handle.release().expect("release succeeds");
    assert!(marker_path(&workspace.document).exists());
}

#[rstest]
fn concurrent_acquirers_are_mutually_exclusive(workspace: Workspace) {
    let barrier = Arc::new(Barrier::new(2));
    let document = Arc::new(workspace.document.clone());

    let spawn = |barrier: Arc<Barrier>, document: Arc<PathBuf>| {
        thread::spawn(move || {
            let lock = FileLock::new(LockTimings::from_millis(50, 60_000, 5));
            barrier.wait();
            let result = lock.acquire(&document);
            if result.is_ok() {
                thread::sleep(Duration::from_millis(200));
            }
            result.map(|mut handle| handle.release().is_ok())
        })
    };

    let first = spawn(Arc::clone(&barrier), Arc::clone(&document));
    let second = spawn(barrier, document);
    let outcomes = [
        first.join().expect("first thread"),
        second.join().expect("second thread"),
    ];

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1, "exactly one acquirer should win");
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        Err(LockError::Contention { .. })
    )));
    drop(workspace.dir);
}

#[rstest]
fn waiting_acquirer_succeeds_after_release(workspace: Workspace) {
    let held = quick_lock().acquire(&workspace.document).expect("first");
    let document = workspace.document.clone();
    let waiter = thread::spawn(move || {
        FileLock::new(LockTimings::from_millis(2_000, 60_000, 10)).acquire(&document)
    });
    thread::sleep(Duration::from_millis(100));
    drop(held);
    let handle = waiter.join().expect("waiter thread").expect("acquired after release");
    assert!(handle.reclaimed().is_none());
}

#[rstest]
fn racing_reclaimers_leave_exactly_one_holder(workspace: Workspace) {
    const CONTENDERS: usize = 8;
    let document = Arc::new(workspace.document.clone());

    for trial in 0..40 {
        write_marker(&document, "crashed-agent", UNIX_EPOCH + Duration::from_secs(1));
        let start = Arc::new(Barrier::new(CONTENDERS));
        let finish = Arc::new(Barrier::new(CONTENDERS));

        let contenders: Vec<_> = (0..CONTENDERS)
            .map(|_| {
                let (start, finish, document) =
                    (Arc::clone(&start), Arc::clone(&finish), Arc::clone(&document));
                thread::spawn(move || {
                    let lock = FileLock::new(LockTimings::from_millis(100, 60_000, 2));
                    start.wait();
                    let result = lock.acquire(&document);
                    // Every handle stays alive until all contenders are done.
                    finish.wait();
                    result
                })
            })
            .collect();
        let results: Vec<_> = contenders
            .into_iter()
            .map(|contender| contender.join().expect("contender thread"))
            .collect();

        let holders = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(holders, 1, "trial {trial} had {holders} simultaneous holders");
        assert!(
            results
                .iter()
                .filter_map(|result| result.as_ref().err())
                .all(LockError::is_retryable)
        );
        drop(results);

        let leftovers: Vec<_> = fs::read_dir(workspace.dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .filter(|name| name != "deck.json")
            .collect();
        assert!(leftovers.is_empty(), "trial {trial} left {leftovers:?}");
    }
}
