use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use xhtmlfix_edit::{
    BackupOptions, BackupSession, BackupState, CommitOutcome, DocumentStore, EditError,
    FsDocumentStore, RefusalError, commit_repair, sha256_hex,
};

const ORIGINAL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<body><p>Tom & Jerry</p></body>\n</html>\n";
const REPAIRED: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<body><p>Tom &amp; Jerry</p></body>\n</html>\n";

fn setup() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    fs::create_dir_all(root.join("text")).expect("mkdir");
    fs::write(root.join("text/ch1.xhtml"), ORIGINAL).expect("write");
    (temp, root)
}

/// Writes to the target are mangled the first `corrupt` times.
struct CorruptingStore {
    corrupt: AtomicUsize,
}

impl CorruptingStore {
    fn new(corrupt: usize) -> Self {
        Self {
            corrupt: AtomicUsize::new(corrupt),
        }
    }
}

impl DocumentStore for CorruptingStore {
    fn read(&self, path: &Utf8Path) -> anyhow::Result<Vec<u8>> {
        FsDocumentStore.read(path)
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        let left = self.corrupt.load(Ordering::SeqCst);
        if left > 0 {
            self.corrupt.store(left - 1, Ordering::SeqCst);
            let half = &contents[..contents.len() / 2];
            return FsDocumentStore.write(path, half);
        }
        FsDocumentStore.write(path, contents)
    }

    fn copy(&self, from: &Utf8Path, to: &Utf8Path) -> anyhow::Result<()> {
        FsDocumentStore.copy(from, to)
    }

    fn remove(&self, path: &Utf8Path) -> anyhow::Result<()> {
        FsDocumentStore.remove(path)
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        FsDocumentStore.exists(path)
    }
}

/// The first write fails outright.
struct FailingWriteStore {
    failed: AtomicUsize,
}

impl DocumentStore for FailingWriteStore {
    fn read(&self, path: &Utf8Path) -> anyhow::Result<Vec<u8>> {
        FsDocumentStore.read(path)
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if self.failed.fetch_add(1, Ordering::SeqCst) == 0 {
            anyhow::bail!("disk full writing {}", path);
        }
        FsDocumentStore.write(path, contents)
    }

    fn copy(&self, from: &Utf8Path, to: &Utf8Path) -> anyhow::Result<()> {
        FsDocumentStore.copy(from, to)
    }

    fn remove(&self, path: &Utf8Path) -> anyhow::Result<()> {
        FsDocumentStore.remove(path)
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        FsDocumentStore.exists(path)
    }
}

#[test]
fn verified_repair_is_committed_and_backup_removed() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = BackupOptions::default().path_for(&root, Utf8Path::new("text/ch1.xhtml"));

    let outcome =
        commit_repair(&FsDocumentStore, &target, &backup, ORIGINAL, REPAIRED).expect("commit");

    assert_eq!(
        outcome,
        CommitOutcome::Committed {
            sha256_after: sha256_hex(REPAIRED.as_bytes()),
            issues_remaining: vec![],
        }
    );
    assert_eq!(fs::read_to_string(&target).expect("read"), REPAIRED);
    assert!(!backup.exists());
}

#[test]
fn mirrored_backup_dir_is_created_and_cleaned() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let opts = BackupOptions {
        suffix: ".bak".to_string(),
        dir: Some(Utf8PathBuf::from("artifacts/backups")),
    };
    let backup = opts.path_for(&root, Utf8Path::new("text/ch1.xhtml"));

    commit_repair(&FsDocumentStore, &target, &backup, ORIGINAL, REPAIRED).expect("commit");

    assert!(root.join("artifacts/backups/text").is_dir());
    assert!(!backup.exists());
}

#[test]
fn corrupted_write_is_restored_from_backup() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = BackupOptions::default().path_for(&root, Utf8Path::new("text/ch1.xhtml"));

    let store = CorruptingStore::new(1);
    let outcome = commit_repair(&store, &target, &backup, ORIGINAL, REPAIRED).expect("commit");

    match outcome {
        CommitOutcome::Restored { reason } => {
            assert!(reason.contains("differs from what was written"), "{reason}");
        }
        other => panic!("expected restore, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&target).expect("read"), ORIGINAL);
    assert!(!backup.exists());
}

#[test]
fn fatal_content_is_restored_after_write() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = BackupOptions::default().path_for(&root, Utf8Path::new("text/ch1.xhtml"));
    let broken = ORIGINAL.replace("<p>Tom", "<div><p>Tom").replace("</p></body>", "</div></body>");

    let outcome = commit_repair(&FsDocumentStore, &target, &backup, ORIGINAL, &broken)
        .expect("commit");

    match outcome {
        CommitOutcome::Restored { reason } => {
            assert!(reason.contains("fix verification failed"), "{reason}");
        }
        other => panic!("expected restore, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&target).expect("read"), ORIGINAL);
}

#[test]
fn failed_write_restores_and_reports_runtime_error() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = BackupOptions::default().path_for(&root, Utf8Path::new("text/ch1.xhtml"));

    let store = FailingWriteStore {
        failed: AtomicUsize::new(0),
    };
    let err = commit_repair(&store, &target, &backup, ORIGINAL, REPAIRED).expect_err("fails");

    assert!(matches!(err, EditError::Runtime(_)));
    assert!(err.to_string().contains("disk full"));
    assert_eq!(fs::read_to_string(&target).expect("read"), ORIGINAL);
    assert!(!backup.exists());
}

#[test]
fn stale_backup_blocks_commit_and_leaves_file_untouched() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = BackupOptions::default().path_for(&root, Utf8Path::new("text/ch1.xhtml"));
    fs::write(&backup, "left over").expect("write backup");

    let err = commit_repair(&FsDocumentStore, &target, &backup, ORIGINAL, REPAIRED)
        .expect_err("stale backup");

    assert!(matches!(
        err,
        EditError::Refused(RefusalError::StaleBackup { .. })
    ));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(fs::read_to_string(&target).expect("read"), ORIGINAL);
    assert_eq!(fs::read_to_string(&backup).expect("read"), "left over");
}

#[test]
fn file_changed_since_analysis_is_refused() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = BackupOptions::default().path_for(&root, Utf8Path::new("text/ch1.xhtml"));
    fs::write(&target, "<p>edited elsewhere</p>").expect("write");

    let err = commit_repair(&FsDocumentStore, &target, &backup, ORIGINAL, REPAIRED)
        .expect_err("precondition");

    assert!(matches!(
        err,
        EditError::Refused(RefusalError::PreconditionMismatch { .. })
    ));
    assert!(!backup.exists());
}

#[test]
fn session_rejects_write_without_snapshot() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = root.join("text/ch1.xhtml.bak");

    let mut session = BackupSession::new(&FsDocumentStore, &target, &backup);
    let err = session.write(b"x").expect_err("illegal");
    assert!(matches!(
        err,
        EditError::Refused(RefusalError::IllegalTransition {
            from: BackupState::Untouched,
            to: BackupState::Written,
        })
    ));
    assert_eq!(session.state(), BackupState::Untouched);
    assert_eq!(fs::read_to_string(&target).expect("read"), ORIGINAL);
}

#[test]
fn session_rejects_commit_before_write() {
    let (_temp, root) = setup();
    let target = root.join("text/ch1.xhtml");
    let backup = root.join("text/ch1.xhtml.bak");

    let mut session = BackupSession::new(&FsDocumentStore, &target, &backup);
    session.snapshot().expect("snapshot");
    assert!(backup.exists());

    assert!(session.commit().is_err());
    assert_eq!(session.state(), BackupState::BackedUp);

    session.restore().expect("restore");
    assert_eq!(session.state(), BackupState::Restored);
    assert!(!backup.exists());
    assert!(session.snapshot().is_err());
}
