use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use filetime::{set_file_mtime, FileTime};
use gistify_core::{store, Mapping, SnippetId, SnippetRecord};
use gistify_sync::{
    reconcile, Credential, Engine, Outcome, ReconcileOptions, RemoteError, RemoteSnippet,
    SnippetClient, SyncConfig, SyncError,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Recording client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Create {
        filename: String,
        content: String,
        is_public: bool,
    },
    Update {
        id: String,
        filename: String,
        content: String,
    },
}

#[derive(Default)]
struct RecordingClient {
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u32>,
    /// Ids for which `update` reports not-found.
    deleted: Vec<String>,
    /// `update` fails with a server error.
    update_fails: bool,
    /// `create` fails with a server error for this filename.
    create_fails_for: Option<String>,
}

impl RecordingClient {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl SnippetClient for RecordingClient {
    fn create(
        &self,
        filename: &str,
        content: &str,
        is_public: bool,
    ) -> Result<RemoteSnippet, RemoteError> {
        self.calls.borrow_mut().push(Call::Create {
            filename: filename.to_string(),
            content: content.to_string(),
            is_public,
        });
        if self.create_fails_for.as_deref() == Some(filename) {
            return Err(RemoteError::Status {
                status: 500,
                message: "boom".to_string(),
            });
        }
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        Ok(RemoteSnippet {
            id: SnippetId::from(format!("new{n}")),
            url: format!("https://gist.example/new{n}"),
        })
    }

    fn update(
        &self,
        id: &SnippetId,
        filename: &str,
        content: &str,
    ) -> Result<RemoteSnippet, RemoteError> {
        self.calls.borrow_mut().push(Call::Update {
            id: id.to_string(),
            filename: filename.to_string(),
            content: content.to_string(),
        });
        if self.deleted.contains(&id.0) {
            return Err(RemoteError::NotFound { id: id.clone() });
        }
        if self.update_fails {
            return Err(RemoteError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(RemoteSnippet {
            id: id.clone(),
            url: format!("https://gist.example/{id}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_file(dir: &Path, name: &str, content: &str, mtime: i64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write file");
    set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).expect("set mtime");
    path
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn prior_with(path: &Path, id: &str, mtime: i64) -> Mapping {
    let mut mapping = Mapping::new();
    mapping.insert(
        key(path),
        SnippetRecord::new(
            SnippetId::from(id),
            format!("https://gist.example/{id}"),
            key(path),
            mtime,
            false,
        ),
    );
    mapping
}

fn private() -> ReconcileOptions {
    ReconcileOptions::default()
}

fn token() -> Option<Credential> {
    Credential::new("test-token")
}

// ---------------------------------------------------------------------------
// reconcile — decisions and dispatch
// ---------------------------------------------------------------------------

#[test]
fn new_file_is_created_once() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "hi", 100);
    let client = RecordingClient::default();

    let result = reconcile(&[a.clone()], Mapping::new(), private(), &client, |_| {}).unwrap();

    assert_eq!(
        client.calls(),
        vec![Call::Create {
            filename: "a.txt".to_string(),
            content: "hi".to_string(),
            is_public: false,
        }]
    );
    assert_eq!(result.mapping.len(), 1);
    let record = result.mapping.get(&key(&a)).expect("record for a.txt");
    assert_eq!(record.last_modified_at, 100);
    assert_eq!(record.remote_id, SnippetId::from("new1"));
    assert_eq!(record.remote_url, "https://gist.example/new1");
    assert_eq!(record.source_path, key(&a));
    assert_eq!(result.report[0].outcome, Outcome::Created);
}

#[test]
fn unchanged_file_makes_no_remote_call() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "hi", 100);
    let prior = prior_with(&a, "X", 100);
    let client = RecordingClient::default();

    let result = reconcile(&[a.clone()], prior.clone(), private(), &client, |_| {}).unwrap();

    assert!(client.calls().is_empty());
    assert_eq!(result.mapping, prior);
    assert_eq!(result.report[0].outcome, Outcome::SkippedUnchanged);
    assert_eq!(
        result.report[0].url.as_deref(),
        Some("https://gist.example/X")
    );
}

#[test]
fn modified_file_updates_stored_snippet() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "hello again", 200);
    let client = RecordingClient::default();

    let result =
        reconcile(&[a.clone()], prior_with(&a, "X", 100), private(), &client, |_| {}).unwrap();

    assert_eq!(
        client.calls(),
        vec![Call::Update {
            id: "X".to_string(),
            filename: "a.txt".to_string(),
            content: "hello again".to_string(),
        }]
    );
    let record = &result.mapping[&key(&a)];
    assert_eq!(record.remote_id, SnippetId::from("X"));
    assert_eq!(record.last_modified_at, 200);
    assert_eq!(result.report[0].outcome, Outcome::Updated);
}

#[test]
fn update_keeps_recorded_visibility() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "v2", 200);
    let client = RecordingClient::default();

    let result = reconcile(
        &[a.clone()],
        prior_with(&a, "X", 100),
        ReconcileOptions {
            is_public: true,
            dry_run: false,
        },
        &client,
        |_| {},
    )
    .unwrap();

    assert_eq!(result.report[0].outcome, Outcome::Updated);
    assert!(!result.mapping[&key(&a)].is_public, "secret gist stays secret");
}

#[test]
fn deleted_remote_snippet_is_recreated() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "hi", 200);
    let client = RecordingClient {
        deleted: vec!["X".to_string()],
        ..Default::default()
    };

    let result = reconcile(
        &[a.clone()],
        prior_with(&a, "X", 100),
        ReconcileOptions {
            is_public: true,
            dry_run: false,
        },
        &client,
        |_| {},
    )
    .unwrap();

    assert_eq!(
        client.calls(),
        vec![
            Call::Update {
                id: "X".to_string(),
                filename: "a.txt".to_string(),
                content: "hi".to_string(),
            },
            Call::Create {
                filename: "a.txt".to_string(),
                content: "hi".to_string(),
                is_public: true,
            },
        ]
    );
    let record = &result.mapping[&key(&a)];
    assert_eq!(record.remote_id, SnippetId::from("new1"));
    assert_eq!(record.last_modified_at, 200);
    assert!(record.is_public);
    assert_eq!(result.report[0].outcome, Outcome::Recreated);
}

#[test]
fn other_update_failure_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "hi", 200);
    let client = RecordingClient {
        update_fails: true,
        ..Default::default()
    };

    let err = reconcile(&[a.clone()], prior_with(&a, "X", 100), private(), &client, |_| {})
        .unwrap_err();

    assert!(
        matches!(
            err,
            SyncError::Remote {
                source: RemoteError::Status { status: 502, .. },
                ..
            }
        ),
        "got: {err}"
    );
    // No create after a non-not-found failure.
    assert_eq!(client.calls().len(), 1);
}

#[test]
fn create_failure_stops_processing_remaining_files() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "a", 100);
    let b = write_file(tmp.path(), "b.txt", "b", 100);
    let c = write_file(tmp.path(), "c.txt", "c", 100);
    let client = RecordingClient {
        create_fails_for: Some("b.txt".to_string()),
        ..Default::default()
    };
    let mut seen = Vec::new();

    let err = reconcile(&[a, b, c], Mapping::new(), private(), &client, |e| {
        seen.push(e.outcome)
    })
    .unwrap_err();

    assert!(matches!(err, SyncError::Remote { .. }), "got: {err}");
    assert_eq!(client.calls().len(), 2, "c.txt must not be attempted");
    assert_eq!(seen, vec![Outcome::Created]);
}

// ---------------------------------------------------------------------------
// reconcile — skip conditions
// ---------------------------------------------------------------------------

#[test]
fn empty_file_is_skipped_and_not_added() {
    let tmp = TempDir::new().unwrap();
    let empty = write_file(tmp.path(), "empty.txt", "", 100);
    let client = RecordingClient::default();

    let result = reconcile(&[empty], Mapping::new(), private(), &client, |_| {}).unwrap();

    assert!(client.calls().is_empty());
    assert!(result.mapping.is_empty());
    assert_eq!(result.report[0].outcome, Outcome::SkippedEmpty);
}

#[test]
fn emptied_file_keeps_prior_record() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "", 300);
    let prior = prior_with(&a, "X", 100);
    let client = RecordingClient::default();

    let result = reconcile(&[a], prior.clone(), private(), &client, |_| {}).unwrap();

    assert!(client.calls().is_empty());
    assert_eq!(result.mapping, prior);
}

#[test]
fn vanished_file_is_skipped_silently() {
    let tmp = TempDir::new().unwrap();
    let gone = tmp.path().join("gone.txt");
    let prior = prior_with(&gone, "X", 100);
    let client = RecordingClient::default();

    let result = reconcile(&[gone], prior.clone(), private(), &client, |_| {}).unwrap();

    assert!(client.calls().is_empty());
    assert!(result.report.is_empty());
    assert_eq!(result.mapping, prior);
}

#[test]
fn statable_but_unreadable_candidate_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("subdir");
    fs::create_dir_all(&dir).unwrap();
    let client = RecordingClient::default();

    let err = reconcile(&[dir], Mapping::new(), private(), &client, |_| {}).unwrap_err();
    assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
    assert!(client.calls().is_empty());
}

#[test]
fn non_utf8_content_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("blob.bin");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();
    let client = RecordingClient::default();

    let err = reconcile(&[path], Mapping::new(), private(), &client, |_| {}).unwrap_err();
    assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
}

#[test]
fn files_are_reported_in_candidate_order() {
    let tmp = TempDir::new().unwrap();
    let z = write_file(tmp.path(), "z.txt", "z", 100);
    let a = write_file(tmp.path(), "a.txt", "a", 100);
    let e = write_file(tmp.path(), "e.txt", "", 100);
    let client = RecordingClient::default();
    let mut seen = Vec::new();

    let result = reconcile(
        &[z.clone(), e.clone(), a.clone()],
        Mapping::new(),
        private(),
        &client,
        |entry| seen.push(entry.path.clone()),
    )
    .unwrap();

    assert_eq!(seen, vec![key(&z), key(&e), key(&a)]);
    let reported: Vec<_> = result.report.iter().map(|e| e.path.clone()).collect();
    assert_eq!(reported, seen);
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_decides_without_remote_calls() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "a", 200);
    let b = write_file(tmp.path(), "b.txt", "b", 100);
    let prior = prior_with(&a, "X", 100);
    let client = RecordingClient::default();

    let result = reconcile(
        &[a, b],
        prior.clone(),
        ReconcileOptions {
            is_public: false,
            dry_run: true,
        },
        &client,
        |_| {},
    )
    .unwrap();

    assert!(client.calls().is_empty());
    assert_eq!(result.mapping, prior);
    let outcomes: Vec<_> = result.report.iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::WouldUpdate, Outcome::WouldCreate]);
}

// ---------------------------------------------------------------------------
// Engine — store round trip
// ---------------------------------------------------------------------------

#[test]
fn engine_requires_credential() {
    let tmp = TempDir::new().unwrap();
    let client = RecordingClient::default();
    let config = SyncConfig::new(store::store_path_at(tmp.path()), false);

    let err = Engine::new(config, &client).err().expect("precondition error");
    assert!(matches!(err, SyncError::Precondition(_)), "got: {err}");
}

#[test]
fn second_run_without_changes_skips_everything_and_keeps_store_bytes() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "a", 100);
    let b = write_file(tmp.path(), "b.txt", "b", 150);
    let store_path = store::store_path_at(tmp.path());
    let client = RecordingClient::default();
    let config = SyncConfig::new(&store_path, false).with_credential(token());
    let engine = Engine::new(config, &client).unwrap();

    engine.run(&[a.clone(), b.clone()], |_| {}).unwrap();
    let first_bytes = fs::read(&store_path).unwrap();
    let calls_after_first = client.calls().len();

    let second = engine.run(&[a, b], |_| {}).unwrap();
    let second_bytes = fs::read(&store_path).unwrap();

    assert_eq!(calls_after_first, 2);
    assert_eq!(client.calls().len(), 2, "second run must not call the remote");
    assert!(second
        .report
        .iter()
        .all(|e| e.outcome == Outcome::SkippedUnchanged));
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn touched_file_is_updated_on_next_run() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "v1", 100);
    let store_path = store::store_path_at(tmp.path());
    let client = RecordingClient::default();
    let config = SyncConfig::new(&store_path, false).with_credential(token());
    let engine = Engine::new(config, &client).unwrap();

    engine.run(&[a.clone()], |_| {}).unwrap();
    write_file(tmp.path(), "a.txt", "v2", 200);
    let result = engine.run(&[a.clone()], |_| {}).unwrap();

    assert_eq!(result.report[0].outcome, Outcome::Updated);
    let stored = store::load_at(&store_path).unwrap();
    assert_eq!(stored[&key(&a)].last_modified_at, 200);
    assert_eq!(stored[&key(&a)].remote_id, SnippetId::from("new1"));
}

#[test]
fn failed_run_does_not_touch_store() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "a", 100);
    let b = write_file(tmp.path(), "b.txt", "b", 100);
    let store_path = store::store_path_at(tmp.path());
    let client = RecordingClient {
        create_fails_for: Some("b.txt".to_string()),
        ..Default::default()
    };
    let config = SyncConfig::new(&store_path, false).with_credential(token());
    let engine = Engine::new(config, &client).unwrap();

    engine.run(&[a, b], |_| {}).unwrap_err();

    assert!(!store_path.exists(), "store must not be flushed after a fatal error");
}

#[test]
fn corrupt_store_aborts_before_any_remote_call() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "a", 100);
    let store_path = store::store_path_at(tmp.path());
    fs::write(&store_path, "{ not json").unwrap();
    let client = RecordingClient::default();
    let config = SyncConfig::new(&store_path, false).with_credential(token());
    let engine = Engine::new(config, &client).unwrap();

    let err = engine.run(&[a], |_| {}).unwrap_err();

    assert!(
        matches!(
            err,
            SyncError::Store(gistify_core::StoreError::CorruptState { .. })
        ),
        "got: {err}"
    );
    assert!(client.calls().is_empty());
}

#[test]
fn dry_run_engine_does_not_write_store() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(tmp.path(), "a.txt", "a", 100);
    let store_path = store::store_path_at(tmp.path());
    let client = RecordingClient::default();
    let config = SyncConfig::new(&store_path, false).with_dry_run(true);
    let engine = Engine::new(config, &client).unwrap();

    let result = engine.run(&[a], |_| {}).unwrap();

    assert_eq!(result.report[0].outcome, Outcome::WouldCreate);
    assert!(!store_path.exists());
}
