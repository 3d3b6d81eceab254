//! Error types for xhtmlfix-edit.
//!
//! This module separates:
//! - Refusals: the coordinator declined to persist a repair (stale backup,
//!   file changed since analysis, failed verification, illegal transition)
//! - Runtime errors: I/O failures while reading, writing or restoring

use crate::backup::BackupState;
use thiserror::Error;

/// The top-level error type for xhtmlfix-edit operations.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("repair refused: {0}")]
    Refused(#[from] RefusalError),

    #[error("runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
}

/// Reasons the coordinator refuses to move a file forward.
#[derive(Debug, Error)]
pub enum RefusalError {
    /// Repaired content still carries fatal issues.
    #[error("fix verification failed: {fatal} fatal issue(s) remain")]
    VerificationFailed { fatal: usize },

    /// A backup from an earlier run is still on disk.
    #[error("stale backup exists at {path}")]
    StaleBackup { path: String },

    /// The file on disk no longer matches the content that was analyzed.
    #[error("precondition mismatch: {path} changed since it was read")]
    PreconditionMismatch { path: String },

    #[error("illegal backup transition: {from} -> {to}")]
    IllegalTransition { from: BackupState, to: BackupState },
}

impl EditError {
    pub fn is_refusal(&self) -> bool {
        matches!(self, EditError::Refused(_))
    }

    /// Exit code convention: a failed verification is an unresolved file (1);
    /// everything else is an engine fault (2).
    pub fn exit_code(&self) -> u8 {
        match self {
            EditError::Refused(RefusalError::VerificationFailed { .. }) => 1,
            EditError::Refused(_) | EditError::Runtime(_) => 2,
        }
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::{EditError, RefusalError};
    use crate::backup::BackupState;

    #[test]
    fn verification_failure_reports_exit_code_1() {
        let err = EditError::from(RefusalError::VerificationFailed { fatal: 2 });
        assert!(err.is_refusal());
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("fix verification failed"));
    }

    #[test]
    fn stale_backup_reports_exit_code_2() {
        let err = EditError::from(RefusalError::StaleBackup {
            path: "text/ch1.xhtml.xhtmlfix.bak".to_string(),
        });
        assert!(err.is_refusal());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("ch1.xhtml.xhtmlfix.bak"));
    }

    #[test]
    fn runtime_error_reports_exit_code_2() {
        let err = EditError::from(anyhow::anyhow!("boom"));
        assert!(!err.is_refusal());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("runtime error"));
    }

    #[test]
    fn illegal_transition_names_both_states() {
        let err = RefusalError::IllegalTransition {
            from: BackupState::Untouched,
            to: BackupState::Written,
        };
        assert_eq!(
            err.to_string(),
            "illegal backup transition: untouched -> written"
        );
    }
}
