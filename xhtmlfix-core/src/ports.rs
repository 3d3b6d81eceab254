//! Port traits abstracting discovery and artifact output away from the pipeline.
//!
//! Document reads and writes go through [`xhtmlfix_edit::DocumentStore`] so
//! the backup coordinator and the pipeline share one view of storage.

use camino::{Utf8Path, Utf8PathBuf};

/// Lists the documents a run should process.
pub trait DocumentSource {
    /// Paths relative to the run root, sorted and free of duplicates.
    fn list_documents(&self) -> anyhow::Result<Vec<Utf8PathBuf>>;
}

/// File-system write operations for report artifacts.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
