//! Verification gate: nothing is persisted while a fatal issue remains.

use crate::error::RefusalError;
use tracing::debug;
use xhtmlfix_domain::analyze;
use xhtmlfix_types::issue::Issue;

/// Re-scan `content` from scratch.
///
/// On success returns the surviving non-fatal issues, which the caller
/// reports as remaining work. Any fatal issue rejects the content.
pub fn verify(content: &str) -> Result<Vec<Issue>, RefusalError> {
    let issues = analyze(content);
    let fatal = issues.iter().filter(|i| i.is_fatal()).count();
    debug!(issues = issues.len(), fatal, "verification scan");
    if fatal > 0 {
        return Err(RefusalError::VerificationFailed { fatal });
    }
    Ok(issues)
}
