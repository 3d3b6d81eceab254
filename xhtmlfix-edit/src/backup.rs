//! Per-file backup state machine.
//!
//! ```text
//! Untouched -> BackedUp -> Written -> Committed
//!                  |          |
//!                  +----------+-----> Restored
//! ```
//!
//! `BackedUp -> Restored` covers a write that failed partway.

use crate::error::{EditResult, RefusalError};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::fmt;
use tracing::debug;

pub const DEFAULT_BACKUP_SUFFIX: &str = ".xhtmlfix.bak";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    Untouched,
    BackedUp,
    Written,
    Committed,
    Restored,
}

impl BackupState {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupState::Untouched => "untouched",
            BackupState::BackedUp => "backed_up",
            BackupState::Written => "written",
            BackupState::Committed => "committed",
            BackupState::Restored => "restored",
        }
    }

    pub fn can_move_to(self, next: BackupState) -> bool {
        use BackupState::*;
        matches!(
            (self, next),
            (Untouched, BackedUp)
                | (BackedUp, Written)
                | (BackedUp, Restored)
                | (Written, Committed)
                | (Written, Restored)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BackupState::Committed | BackupState::Restored)
    }
}

impl fmt::Display for BackupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage operations the coordinator needs. Paths are absolute.
pub trait DocumentStore: Send + Sync {
    fn read(&self, path: &Utf8Path) -> anyhow::Result<Vec<u8>>;
    fn write(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    /// Copy `from` to `to`, creating parent directories of `to`.
    fn copy(&self, from: &Utf8Path, to: &Utf8Path) -> anyhow::Result<()>;
    fn remove(&self, path: &Utf8Path) -> anyhow::Result<()>;
    fn exists(&self, path: &Utf8Path) -> bool;
}

/// Filesystem-backed [`DocumentStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentStore;

impl DocumentStore for FsDocumentStore {
    fn read(&self, path: &Utf8Path) -> anyhow::Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("read {}", path))
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn copy(&self, from: &Utf8Path, to: &Utf8Path) -> anyhow::Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent))?;
        }
        fs::copy(from, to).with_context(|| format!("copy {} -> {}", from, to))?;
        Ok(())
    }

    fn remove(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::remove_file(path).with_context(|| format!("remove {}", path))
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        path.exists()
    }
}

/// Where backups go.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub suffix: String,
    /// Mirror backups under this directory instead of next to the file.
    pub dir: Option<Utf8PathBuf>,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            dir: None,
        }
    }
}

impl BackupOptions {
    /// Backup location for `rel` (relative to `root`).
    pub fn path_for(&self, root: &Utf8Path, rel: &Utf8Path) -> Utf8PathBuf {
        let base = match &self.dir {
            Some(dir) if dir.is_absolute() => dir.join(rel),
            Some(dir) => root.join(dir).join(rel),
            None => root.join(rel),
        };
        Utf8PathBuf::from(format!("{}{}", base, self.suffix))
    }
}

/// Drives one file through the backup state machine.
///
/// Every step checks the transition first, so a caller can never write
/// without a snapshot or commit without having written.
pub struct BackupSession<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    target: Utf8PathBuf,
    backup: Utf8PathBuf,
    state: BackupState,
}

impl<'a, S: DocumentStore + ?Sized> BackupSession<'a, S> {
    pub fn new(
        store: &'a S,
        target: impl Into<Utf8PathBuf>,
        backup: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            store,
            target: target.into(),
            backup: backup.into(),
            state: BackupState::Untouched,
        }
    }

    pub fn state(&self) -> BackupState {
        self.state
    }

    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    pub fn backup_path(&self) -> &Utf8Path {
        &self.backup
    }

    fn enter(&mut self, next: BackupState) {
        debug!(path = %self.target, from = %self.state, to = %next, "backup transition");
        self.state = next;
    }

    fn check(&self, next: BackupState) -> EditResult<()> {
        if self.state.can_move_to(next) {
            Ok(())
        } else {
            Err(RefusalError::IllegalTransition {
                from: self.state,
                to: next,
            }
            .into())
        }
    }

    /// Copy the current file to the backup location. An existing backup is
    /// never overwritten.
    pub fn snapshot(&mut self) -> EditResult<()> {
        self.check(BackupState::BackedUp)?;
        if self.store.exists(&self.backup) {
            return Err(RefusalError::StaleBackup {
                path: self.backup.to_string(),
            }
            .into());
        }
        self.store.copy(&self.target, &self.backup)?;
        self.enter(BackupState::BackedUp);
        Ok(())
    }

    pub fn write(&mut self, contents: &[u8]) -> EditResult<()> {
        self.check(BackupState::Written)?;
        self.store.write(&self.target, contents)?;
        self.enter(BackupState::Written);
        Ok(())
    }

    /// Post-write verification passed: drop the snapshot.
    pub fn commit(&mut self) -> EditResult<()> {
        self.check(BackupState::Committed)?;
        self.store.remove(&self.backup)?;
        self.enter(BackupState::Committed);
        Ok(())
    }

    /// Put the snapshot back over the target and drop it.
    pub fn restore(&mut self) -> EditResult<()> {
        self.check(BackupState::Restored)?;
        let original = self.store.read(&self.backup)?;
        self.store.write(&self.target, &original)?;
        self.store.remove(&self.backup)?;
        self.enter(BackupState::Restored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn legal_transitions() {
        use BackupState::*;
        assert!(Untouched.can_move_to(BackedUp));
        assert!(BackedUp.can_move_to(Written));
        assert!(Written.can_move_to(Committed));
        assert!(Written.can_move_to(Restored));
        assert!(BackedUp.can_move_to(Restored));

        assert!(!Untouched.can_move_to(Written));
        assert!(!BackedUp.can_move_to(Committed));
        assert!(!Committed.can_move_to(Restored));
        assert!(!Restored.can_move_to(Written));
        assert!(Committed.is_terminal() && Restored.is_terminal());
    }

    #[test]
    fn sibling_backup_path() {
        let opts = BackupOptions::default();
        assert_eq!(
            opts.path_for(Utf8Path::new("/book"), Utf8Path::new("OEBPS/text/ch1.xhtml")),
            Utf8PathBuf::from("/book/OEBPS/text/ch1.xhtml.xhtmlfix.bak")
        );
    }

    #[test]
    fn mirrored_backup_path() {
        let opts = BackupOptions {
            suffix: ".bak".to_string(),
            dir: Some(Utf8PathBuf::from("artifacts/backups")),
        };
        assert_eq!(
            opts.path_for(Utf8Path::new("/book"), Utf8Path::new("text/ch1.xhtml")),
            Utf8PathBuf::from("/book/artifacts/backups/text/ch1.xhtml.bak")
        );
    }
}
