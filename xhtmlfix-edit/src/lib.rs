//! Edit engine for xhtmlfix repairs.
//!
//! Responsibilities:
//! - Gate repaired content on a fresh scan ([`verify`]).
//! - Persist a verified repair through a per-file backup state machine
//!   ([`commit_repair`]), restoring the original if post-write checks fail.
//! - Generate a unified diff preview for dry runs.

pub mod backup;
pub mod commit;
pub mod error;
pub mod verify;

pub use backup::{
    BackupOptions, BackupSession, BackupState, DEFAULT_BACKUP_SUFFIX, DocumentStore,
    FsDocumentStore,
};
pub use commit::{CommitOutcome, commit_repair};
pub use error::{EditError, EditResult, RefusalError};
pub use verify::verify;

use diffy::PatchFormatter;
use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Unified diff for one file, in `git diff` layout. Empty when unchanged.
pub fn render_patch(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

    let patch = diffy::create_patch(before, after);
    let formatter = PatchFormatter::new();
    let body = formatter.fmt_patch(&patch).to_string();
    // diffy emits its own ---/+++ header; keep only the hunks.
    let hunks = body
        .find("@@")
        .map(|start| &body[start..])
        .unwrap_or(body.as_str());
    out.push_str(hunks);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
