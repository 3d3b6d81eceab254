use crate::issue::Issue;
use serde::{Deserialize, Serialize};

/// One fix that changed the content during a repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFix {
    pub code: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Outcome of running the repair engine over one document's content.
///
/// Produced once per file per run. Nothing is persisted until the caller has
/// passed `content` through verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairResult {
    pub content: String,
    pub fixes_applied: u64,

    #[serde(default)]
    pub issues_remaining: Vec<Issue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AppliedFix>,

    /// Number of scan/plan/apply passes that ran.
    pub passes: u32,
}

impl RepairResult {
    pub fn changed(&self) -> bool {
        self.fixes_applied > 0
    }

    pub fn has_fatal(&self) -> bool {
        self.issues_remaining.iter().any(Issue::is_fatal)
    }
}
