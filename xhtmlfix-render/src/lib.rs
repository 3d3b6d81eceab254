//! Rendering helpers (markdown, console) for human-readable artifacts.

use xhtmlfix_types::issue::Issue;
use xhtmlfix_types::report::{FileReport, FileStatus, RunReport, VerdictStatus};

pub const DEFAULT_MAX_ISSUES_PER_FILE: usize = 10;

/// Markdown report: run summary, then one block per file.
///
/// Issue listings are cut after `max_issues_per_file` entries.
pub fn render_report_md(report: &RunReport, max_issues_per_file: usize) -> String {
    let s = &report.summary;
    let mut out = String::new();
    out.push_str("# xhtmlfix report\n\n");
    out.push_str(&format!("- Verdict: `{}`\n", verdict_label(report.verdict.status)));
    if !report.verdict.reasons.is_empty() {
        out.push_str(&format!("- Reasons: {}\n", report.verdict.reasons.join(", ")));
    }
    out.push_str(&format!("- Root: `{}`\n", report.run.root));
    out.push_str(&format!(
        "- Mode: {}\n",
        match (report.run.repair, report.run.dry_run) {
            (false, _) => "check",
            (true, true) => "fix (dry run)",
            (true, false) => "fix",
        }
    ));
    out.push_str(&format!(
        "- Files processed: {}\n- Errors found: {}\n- Warnings found: {}\n- Fixes applied: {}\n\n",
        s.files_processed, s.errors_found, s.warnings_found, s.fixes_applied
    ));

    out.push_str("| valid | repaired | would repair | unresolved | rejected | restored | failed | skipped |\n");
    out.push_str("|---|---|---|---|---|---|---|---|\n");
    out.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} |\n\n",
        s.files_valid,
        s.files_repaired,
        s.files_would_repair,
        s.files_unresolved,
        s.files_rejected,
        s.files_restored,
        s.files_failed,
        s.files_skipped
    ));

    out.push_str("## Files\n\n");
    if report.files.is_empty() {
        out.push_str("_No documents matched._\n");
        return out;
    }

    for (i, file) in report.files.iter().enumerate() {
        render_file_block(&mut out, i + 1, file, max_issues_per_file);
    }

    out
}

fn render_file_block(out: &mut String, index: usize, file: &FileReport, max_issues: usize) {
    out.push_str(&format!("### {}. {}\n\n", index, file.path));
    out.push_str(&format!("- Status: `{}`\n", file.status.as_str()));
    if !file.issues.is_empty() {
        out.push_str(&format!("- Issues found: {}\n", file.issues.len()));
    }
    if file.fixes_applied > 0 {
        let label = if file.status == FileStatus::WouldRepair {
            "Fixes available"
        } else {
            "Fixes applied"
        };
        out.push_str(&format!("- {}: {}\n", label, file.fixes_applied));
    }
    if let (Some(before), Some(after)) = (&file.sha256_before, &file.sha256_after) {
        out.push_str(&format!("- sha256: {} → {}\n", short(before), short(after)));
    }
    if let Some(note) = &file.note {
        out.push_str(&format!("- Note: {}\n", note));
    }
    if let Some(error) = &file.error {
        out.push_str(&format!("- Error: {}\n", error));
    }

    if !file.issues_remaining.is_empty() {
        out.push_str("\n**Remaining issues**\n\n");
        render_issue_list(out, &file.issues_remaining, max_issues);
    }
    out.push('\n');
}

fn render_issue_list(out: &mut String, issues: &[Issue], max_issues: usize) {
    for issue in issues.iter().take(max_issues) {
        let loc = match (issue.line, issue.column) {
            (Some(line), Some(col)) => format!("{}:{}", line, col),
            (Some(line), None) => line.to_string(),
            _ => "-".to_string(),
        };
        let fix = if issue.fixable { "" } else { " (manual)" };
        out.push_str(&format!(
            "- `{}` `{}` at {}: {}{}\n",
            issue.severity,
            issue.code(),
            loc,
            issue.message,
            fix
        ));
    }
    if issues.len() > max_issues {
        out.push_str(&format!("- … and {} more\n", issues.len() - max_issues));
    }
}

fn short(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}

/// Plain-text summary for stderr at the end of a run.
pub fn render_console_summary(report: &RunReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    for file in &report.files {
        if file.status == FileStatus::Valid {
            continue;
        }
        let detail = file
            .error
            .as_deref()
            .or(file.note.as_deref())
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:>16}  {}{}\n",
            file.status.as_str(),
            file.path,
            detail
        ));
    }
    out.push_str(&format!(
        "xhtmlfix: {} file(s), {} error(s), {} warning(s), {} fix(es) applied; verdict {}\n",
        s.files_processed,
        s.errors_found,
        s.warnings_found,
        s.fixes_applied,
        verdict_label(report.verdict.status)
    ));
    out
}

fn verdict_label(status: VerdictStatus) -> &'static str {
    match status {
        VerdictStatus::Pass => "pass",
        VerdictStatus::Fail => "fail",
        VerdictStatus::Error => "error",
    }
}
