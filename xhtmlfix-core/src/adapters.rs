//! Default filesystem-backed port implementations.

use crate::ports::{DocumentSource, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::{Pattern, glob};
use std::collections::BTreeSet;
use tracing::debug;

/// Discovers documents under `root` by glob patterns.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    pub root: Utf8PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl FsDocumentSource {
    pub fn new(root: Utf8PathBuf, include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            root,
            include,
            exclude,
        }
    }
}

impl DocumentSource for FsDocumentSource {
    fn list_documents(&self) -> anyhow::Result<Vec<Utf8PathBuf>> {
        let excludes = self
            .exclude
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("invalid exclude pattern {p:?}")))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut out = BTreeSet::new();
        for include in &self.include {
            let pattern = self.root.join(include);
            debug!(pattern = %pattern, "scanning for documents");

            for entry in glob(pattern.as_str()).with_context(|| format!("glob {}", include))? {
                let path = entry.map_err(|e| anyhow::anyhow!("glob error: {e}"))?;
                let path = Utf8PathBuf::from_path_buf(path)
                    .map_err(|p| anyhow::anyhow!("non-UTF-8 path {}", p.display()))?;
                if !path.is_file() {
                    continue;
                }
                let rel = path
                    .strip_prefix(&self.root)
                    .map(Utf8Path::to_path_buf)
                    .unwrap_or(path);
                if excludes.iter().any(|p| p.matches(rel.as_str())) {
                    debug!(path = %rel, "excluded");
                    continue;
                }
                out.insert(rel);
            }
        }

        // Deterministic order matters.
        Ok(out.into_iter().collect())
    }
}

/// Fixed document list for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentSource {
    paths: Vec<Utf8PathBuf>,
}

impl InMemoryDocumentSource {
    pub fn new(paths: impl IntoIterator<Item = Utf8PathBuf>) -> Self {
        let set: BTreeSet<Utf8PathBuf> = paths.into_iter().collect();
        Self {
            paths: set.into_iter().collect(),
        }
    }
}

impl DocumentSource for InMemoryDocumentSource {
    fn list_documents(&self) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.paths.clone())
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}
