use crate::issue::{Issue, Severity};
use crate::repair::AppliedFix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub started_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    pub root: String,
    pub dry_run: bool,
    pub repair: bool,
}

/// Where a file ended up after its pipeline ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// No issues found.
    Valid,
    /// Repairs committed and no error or fatal issue remains.
    Repaired,
    /// Repairs committed but error-level issues remain for a human.
    Partial,
    /// Issues found and the file was left untouched.
    Unresolved,
    /// Dry run: a verified repair exists but was not written.
    WouldRepair,
    /// The repaired content failed verification before any write.
    Rejected,
    /// The repaired content was written, failed post-write verification,
    /// and the original was restored from backup.
    Restored,
    /// The file could not be read or written.
    ProcessingError,
    /// The run was cancelled before this file started.
    Skipped,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Valid => "valid",
            FileStatus::Repaired => "repaired",
            FileStatus::Partial => "partial",
            FileStatus::Unresolved => "unresolved",
            FileStatus::WouldRepair => "would_repair",
            FileStatus::Rejected => "rejected",
            FileStatus::Restored => "restored",
            FileStatus::ProcessingError => "processing_error",
            FileStatus::Skipped => "skipped",
        }
    }

    /// True when the file on disk was rewritten by this run.
    pub fn is_committed(self) -> bool {
        matches!(self, FileStatus::Repaired | FileStatus::Partial)
    }
}

/// Per-file outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub status: FileStatus,

    /// Issues found in the document as it was read.
    #[serde(default)]
    pub issues: Vec<Issue>,

    pub fixes_applied: u64,

    /// Issues present in the file on disk once this run finished with it.
    /// For `would_repair` these are the issues the repair would leave.
    #[serde(default)]
    pub issues_remaining: Vec<Issue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AppliedFix>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,

    /// I/O failure message for `processing_error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Free-form note, e.g. "fix verification failed".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Unified diff of the would-be change in dry-run mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl FileReport {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            issues: vec![],
            fixes_applied: 0,
            issues_remaining: vec![],
            applied: vec![],
            sha256_before: None,
            sha256_after: None,
            error: None,
            note: None,
            patch: None,
        }
    }

    pub fn processing_error(path: impl Into<String>, error: impl Into<String>) -> Self {
        let mut report = Self::new(path, FileStatus::ProcessingError);
        report.error = Some(error.into());
        report
    }

    pub fn skipped(path: impl Into<String>) -> Self {
        let mut report = Self::new(path, FileStatus::Skipped);
        report.note = Some("run cancelled before this file started".to_string());
        report
    }

    /// Whether link/asset checkers may resolve references in this document.
    pub fn structurally_valid(&self) -> bool {
        !matches!(
            self.status,
            FileStatus::ProcessingError | FileStatus::Skipped
        ) && !self.issues_remaining.iter().any(Issue::is_fatal)
    }

    /// Whether the file still needs human attention after the run.
    pub fn needs_attention(&self) -> bool {
        match self.status {
            FileStatus::Rejected | FileStatus::Restored | FileStatus::Skipped => true,
            FileStatus::ProcessingError => true,
            _ => self
                .issues_remaining
                .iter()
                .any(|i| i.severity.is_error()),
        }
    }
}

/// Run-level statistics, folded from per-file reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_processed: u64,
    pub errors_found: u64,
    pub warnings_found: u64,
    pub fixes_applied: u64,

    #[serde(default)]
    pub files_valid: u64,
    #[serde(default)]
    pub files_repaired: u64,
    #[serde(default)]
    pub files_would_repair: u64,
    #[serde(default)]
    pub files_unresolved: u64,
    #[serde(default)]
    pub files_rejected: u64,
    #[serde(default)]
    pub files_restored: u64,
    #[serde(default)]
    pub files_failed: u64,
    #[serde(default)]
    pub files_skipped: u64,
}

impl RunSummary {
    pub fn absorb(&mut self, file: &FileReport) {
        if file.status != FileStatus::Skipped {
            self.files_processed += 1;
        }
        for issue in &file.issues {
            match issue.severity {
                Severity::Warning => self.warnings_found += 1,
                Severity::Error | Severity::Fatal => self.errors_found += 1,
            }
        }
        if file.status.is_committed() {
            self.fixes_applied += file.fixes_applied;
        }
        match file.status {
            FileStatus::Valid => self.files_valid += 1,
            FileStatus::Repaired | FileStatus::Partial => self.files_repaired += 1,
            FileStatus::WouldRepair => self.files_would_repair += 1,
            FileStatus::Unresolved => self.files_unresolved += 1,
            FileStatus::Rejected => self.files_rejected += 1,
            FileStatus::Restored => self.files_restored += 1,
            FileStatus::ProcessingError => self.files_failed += 1,
            FileStatus::Skipped => self.files_skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.files_processed += other.files_processed;
        self.errors_found += other.errors_found;
        self.warnings_found += other.warnings_found;
        self.fixes_applied += other.fixes_applied;
        self.files_valid += other.files_valid;
        self.files_repaired += other.files_repaired;
        self.files_would_repair += other.files_would_repair;
        self.files_unresolved += other.files_unresolved;
        self.files_rejected += other.files_rejected;
        self.files_restored += other.files_restored;
        self.files_failed += other.files_failed;
        self.files_skipped += other.files_skipped;
    }
}

impl<'a> FromIterator<&'a FileReport> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a FileReport>>(iter: I) -> Self {
        let mut summary = RunSummary::default();
        for file in iter {
            summary.absorb(file);
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl Verdict {
    /// Exit code convention consumed by CLI wrappers.
    pub fn exit_code(&self) -> u8 {
        match self.status {
            VerdictStatus::Pass => 0,
            VerdictStatus::Fail => 1,
            VerdictStatus::Error => 2,
        }
    }
}

/// Machine-readable report for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub summary: RunSummary,
    pub verdict: Verdict,

    #[serde(default)]
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// Build a report from per-file outcomes. Files are sorted by path so
    /// parallel runs produce the same report as sequential ones.
    pub fn new(tool: ToolInfo, run: RunInfo, mut files: Vec<FileReport>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let summary: RunSummary = files.iter().collect();
        let verdict = verdict_for(&summary, &files);
        Self {
            schema: crate::schema::XHTMLFIX_REPORT_V1.to_string(),
            tool,
            run,
            summary,
            verdict,
            files,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }
}

fn verdict_for(summary: &RunSummary, files: &[FileReport]) -> Verdict {
    let mut reasons = Vec::new();
    if summary.files_failed > 0 {
        reasons.push("processing_errors".to_string());
    }
    if summary.files_restored > 0 {
        reasons.push("restored_after_failed_verification".to_string());
    }
    if summary.files_rejected > 0 {
        reasons.push("repair_rejected".to_string());
    }
    if summary.files_skipped > 0 {
        reasons.push("cancelled".to_string());
    }
    if summary.files_would_repair > 0 {
        reasons.push("repairs_pending".to_string());
    }
    let unresolved = files
        .iter()
        .filter(|f| {
            !matches!(
                f.status,
                FileStatus::ProcessingError
                    | FileStatus::Skipped
                    | FileStatus::Rejected
                    | FileStatus::Restored
            )
        })
        .any(FileReport::needs_attention);
    if unresolved {
        reasons.push("unresolved_issues".to_string());
    }

    let status = if summary.files_failed > 0 {
        VerdictStatus::Error
    } else if reasons.is_empty() {
        VerdictStatus::Pass
    } else {
        VerdictStatus::Fail
    };

    Verdict { status, reasons }
}
