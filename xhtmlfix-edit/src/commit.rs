use crate::backup::{BackupSession, DocumentStore};
use crate::error::{EditResult, RefusalError};
use crate::sha256_hex;
use crate::verify::verify;
use camino::Utf8Path;
use tracing::{debug, warn};
use xhtmlfix_types::issue::Issue;

/// How a commit attempt ended when no fault interrupted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Written, re-read, verified; backup removed.
    Committed {
        sha256_after: String,
        /// Non-fatal issues in the content now on disk.
        issues_remaining: Vec<Issue>,
    },
    /// Post-write verification failed and the original was put back.
    Restored { reason: String },
}

/// Persist `repaired` over `target` through the backup state machine.
///
/// `original` is the content the repair was computed from; the file must
/// still hold exactly those bytes. On any error after the snapshot, the
/// file is restored before the error is returned, so the file on disk is
/// either the verified repair or the original.
pub fn commit_repair<S: DocumentStore + ?Sized>(
    store: &S,
    target: &Utf8Path,
    backup: &Utf8Path,
    original: &str,
    repaired: &str,
) -> EditResult<CommitOutcome> {
    let on_disk = store.read(target)?;
    if sha256_hex(&on_disk) != sha256_hex(original.as_bytes()) {
        return Err(RefusalError::PreconditionMismatch {
            path: target.to_string(),
        }
        .into());
    }

    let mut session = BackupSession::new(store, target, backup);
    session.snapshot()?;

    if let Err(err) = session.write(repaired.as_bytes()) {
        warn!(path = %target, error = %err, "write failed; restoring backup");
        session.restore()?;
        return Err(err);
    }

    let expected = sha256_hex(repaired.as_bytes());
    match post_write_check(store, target, &expected) {
        Ok(issues_remaining) => {
            session.commit()?;
            debug!(path = %target, sha256 = %expected, "committed repair");
            Ok(CommitOutcome::Committed {
                sha256_after: expected,
                issues_remaining,
            })
        }
        Err(reason) => {
            warn!(path = %target, reason = %reason, "post-write verification failed; restoring");
            session.restore()?;
            Ok(CommitOutcome::Restored { reason })
        }
    }
}

fn post_write_check<S: DocumentStore + ?Sized>(
    store: &S,
    target: &Utf8Path,
    expected_sha: &str,
) -> Result<Vec<Issue>, String> {
    let bytes = store
        .read(target)
        .map_err(|e| format!("re-read failed: {e:#}"))?;
    let actual = sha256_hex(&bytes);
    if actual != expected_sha {
        return Err(format!(
            "content on disk differs from what was written (sha256 {actual})"
        ));
    }
    let text = String::from_utf8(bytes).map_err(|_| "content on disk is not UTF-8".to_string())?;
    verify(&text).map_err(|e| e.to_string())
}
