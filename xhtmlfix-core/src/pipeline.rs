//! Core check/fix pipeline, extracted from the CLI.
//!
//! The entry point is I/O-agnostic: discovery goes through [`DocumentSource`],
//! document reads and writes through [`DocumentStore`], and artifacts through
//! [`WritePort`].

use crate::cancel::CancelToken;
use crate::lock::{LockError, RunLock};
use crate::ports::{DocumentSource, WritePort};
use crate::settings::RunSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use xhtmlfix_domain::{analyze_document, repair_document};
use xhtmlfix_edit::{CommitOutcome, DocumentStore, commit_repair, render_patch, sha256_hex, verify};
use xhtmlfix_render::render_report_md;
use xhtmlfix_types::document::Document;
use xhtmlfix_types::report::{FileReport, FileStatus, RunInfo, RunReport, ToolInfo};

/// Error type for pipeline results. Every variant is an engine fault (exit 2).
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        2
    }
}

/// Outcome of [`run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    /// Concatenated per-file diffs; empty unless the run was a dry run.
    pub patch: String,
}

/// Run the pipeline over every document the source lists.
///
/// Per-file faults never abort the run; they become `processing_error`
/// entries. Only discovery, pool setup and the run lock fail the whole run.
pub fn run(
    settings: &RunSettings,
    source: &dyn DocumentSource,
    store: &dyn DocumentStore,
    cancel: &CancelToken,
    tool: ToolInfo,
) -> Result<RunOutcome, ToolError> {
    let started = Utc::now();
    let _lock = if settings.writes_documents() {
        Some(RunLock::acquire(&settings.root)?)
    } else {
        None
    };

    let paths = source.list_documents().context("discover documents")?;
    info!(
        root = %settings.root,
        documents = paths.len(),
        repair = settings.repair,
        dry_run = settings.dry_run,
        jobs = settings.jobs,
        "starting run"
    );

    let process = |rel: &Utf8PathBuf| -> FileReport {
        if cancel.is_cancelled() {
            debug!(path = %rel, "cancelled before start");
            return FileReport::skipped(rel.as_str());
        }
        let report = process_document(settings, store, rel);
        if settings.fail_fast
            && matches!(
                report.status,
                FileStatus::Restored | FileStatus::ProcessingError
            )
        {
            warn!(path = %rel, status = report.status.as_str(), "fail-fast: cancelling run");
            cancel.cancel();
        }
        report
    };

    let files: Vec<FileReport> = if settings.jobs == 1 {
        paths.iter().map(process).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.jobs)
            .build()
            .context("build worker pool")?;
        pool.install(|| paths.par_iter().map(process).collect())
    };

    let ended = Utc::now();
    let run = RunInfo {
        started_at: started.to_rfc3339(),
        ended_at: Some(ended.to_rfc3339()),
        duration_ms: Some((ended - started).num_milliseconds().max(0) as u64),
        root: settings.root.to_string(),
        dry_run: settings.dry_run,
        repair: settings.repair,
    };
    let report = RunReport::new(tool, run, files);
    let patch: String = report
        .files
        .iter()
        .filter_map(|f| f.patch.as_deref())
        .collect();

    info!(
        files = report.summary.files_processed,
        errors = report.summary.errors_found,
        fixes = report.summary.fixes_applied,
        verdict = ?report.verdict.status,
        "run finished"
    );

    Ok(RunOutcome { report, patch })
}

/// Scan one document and, when the settings allow it, repair and commit it.
pub fn process_document(
    settings: &RunSettings,
    store: &dyn DocumentStore,
    rel: &Utf8Path,
) -> FileReport {
    let abs = settings.root.join(rel);
    let content = match read_document(store, &abs) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %rel, error = %format!("{e:#}"), "read failed");
            return FileReport::processing_error(rel.as_str(), format!("{e:#}"));
        }
    };

    let doc = Document::new(rel, content);
    let issues = analyze_document(&doc);
    let mut report = FileReport::new(rel.as_str(), FileStatus::Valid);
    report.sha256_before = Some(sha256_hex(doc.content().as_bytes()));
    if issues.is_empty() {
        info!(path = %rel, status = "valid", "processed");
        return report;
    }

    report.status = FileStatus::Unresolved;
    report.issues = issues.clone();
    report.issues_remaining = issues;
    if !settings.repair {
        info!(path = %rel, status = "unresolved", issues = report.issues.len(), "processed");
        return report;
    }

    let result = repair_document(&doc, &settings.repair_options());
    if !result.changed() {
        info!(path = %rel, status = "unresolved", "no applicable fixes");
        return report;
    }

    if let Err(refusal) = verify(&result.content) {
        warn!(path = %rel, reason = %refusal, "repair rejected");
        report.status = FileStatus::Rejected;
        report.note = Some(refusal.to_string());
        return report;
    }

    if settings.dry_run {
        report.status = FileStatus::WouldRepair;
        report.fixes_applied = result.fixes_applied;
        report.applied = result.applied;
        report.issues_remaining = result.issues_remaining;
        report.sha256_after = Some(sha256_hex(result.content.as_bytes()));
        report.patch = Some(render_patch(rel.as_str(), doc.content(), &result.content));
        info!(path = %rel, status = "would_repair", fixes = result.fixes_applied, "processed");
        return report;
    }

    let backup = settings.backup_options().path_for(&settings.root, rel);
    match commit_repair(store, &abs, &backup, doc.content(), &result.content) {
        Ok(CommitOutcome::Committed {
            sha256_after,
            issues_remaining,
        }) => {
            report.status = if issues_remaining.iter().any(|i| i.severity.is_error()) {
                FileStatus::Partial
            } else {
                FileStatus::Repaired
            };
            report.fixes_applied = result.fixes_applied;
            report.applied = result.applied;
            report.sha256_after = Some(sha256_after);
            report.issues_remaining = issues_remaining;
            info!(
                path = %rel,
                status = report.status.as_str(),
                fixes = report.fixes_applied,
                "processed"
            );
        }
        Ok(CommitOutcome::Restored { reason }) => {
            report.status = FileStatus::Restored;
            report.note = Some(format!("original restored: {reason}"));
        }
        Err(e) => {
            warn!(path = %rel, error = %e, "commit failed");
            report.status = FileStatus::ProcessingError;
            report.error = Some(e.to_string());
        }
    }
    report
}

fn read_document(store: &dyn DocumentStore, abs: &Utf8Path) -> anyhow::Result<String> {
    let bytes = store.read(abs)?;
    String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", abs))
}

/// Write all run artifacts to the output directory.
pub fn write_report_artifacts(
    outcome: &RunOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
    max_issues_per_file: usize,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let json = serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), json.as_bytes())?;

    let md = render_report_md(&outcome.report, max_issues_per_file);
    writer.write_file(&out_dir.join("report.md"), md.as_bytes())?;

    if outcome.report.run.dry_run {
        writer.write_file(&out_dir.join("patch.diff"), outcome.patch.as_bytes())?;
    }

    Ok(())
}
