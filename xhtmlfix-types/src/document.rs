use camino::{Utf8Path, Utf8PathBuf};

/// An immutable snapshot of one document taken at analysis time.
///
/// A `Document` belongs to exactly one validate/repair cycle. Repairs never
/// mutate it; they produce new content that is checked against a fresh scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: Utf8PathBuf,
    content: String,
}

impl Document {
    pub fn new(path: impl Into<Utf8PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}
