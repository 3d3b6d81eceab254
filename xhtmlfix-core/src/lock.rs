//! Exclusive run lock at the root of a document tree.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::io::{ErrorKind, Write};
use tracing::{debug, warn};

pub const LOCK_FILE_NAME: &str = ".xhtmlfix.lock";

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another xhtmlfix run holds {path}")]
    Held { path: String },
    #[error("{0:#}")]
    Io(#[from] anyhow::Error),
}

/// Held for the duration of a writing run; the file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: Utf8PathBuf,
}

impl RunLock {
    pub fn acquire(root: &Utf8Path) -> Result<Self, LockError> {
        let path = root.join(LOCK_FILE_NAME);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(LockError::Held {
                    path: path.to_string(),
                });
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("create lock {}", path))
                    .into());
            }
        };
        writeln!(file, "{}", std::process::id())
            .with_context(|| format!("write lock {}", path))?;
        debug!(path = %path, "acquired run lock");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path, error = %e, "failed to remove run lock");
        }
    }
}
