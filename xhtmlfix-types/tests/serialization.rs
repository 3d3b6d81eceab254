use pretty_assertions::assert_eq;
use xhtmlfix_types::issue::{Issue, IssueKind, Severity, UnclosedCause};
use xhtmlfix_types::report::{
    FileReport, FileStatus, RunInfo, RunReport, RunSummary, ToolInfo, VerdictStatus,
};

fn tool() -> ToolInfo {
    ToolInfo {
        name: "xhtmlfix".to_string(),
        version: Some("0.0.0".to_string()),
    }
}

fn run_info() -> RunInfo {
    RunInfo {
        started_at: "2026-01-01T00:00:00Z".to_string(),
        ended_at: None,
        duration_ms: None,
        root: "/book".to_string(),
        dry_run: false,
        repair: true,
    }
}

fn issue(kind: IssueKind, severity: Severity, fixable: bool) -> Issue {
    Issue {
        kind,
        message: "m".to_string(),
        line: Some(1),
        column: Some(1),
        severity,
        fixable,
    }
}

#[test]
fn severity_serializes_snake_case() {
    assert_eq!(
        serde_json::to_value(Severity::Warning).expect("serialize"),
        serde_json::json!("warning")
    );
    assert_eq!(
        serde_json::to_value(Severity::Fatal).expect("serialize"),
        serde_json::json!("fatal")
    );
}

#[test]
fn issue_flattens_kind_payload() {
    let i = issue(
        IssueKind::UnquotedAttribute {
            attribute: "class".to_string(),
            value: "note".to_string(),
        },
        Severity::Error,
        true,
    );
    let v = serde_json::to_value(&i).expect("serialize issue");
    assert_eq!(v["type"], "unquoted_attribute");
    assert_eq!(v["attribute"], "class");
    assert_eq!(v["value"], "note");
    assert_eq!(v["severity"], "error");
    assert_eq!(v["fixable"], true);
    assert_eq!(v["line"], 1);
}

#[test]
fn unclosed_tag_carries_cause() {
    let i = issue(
        IssueKind::UnclosedTag {
            tag: "p".to_string(),
            cause: UnclosedCause::Interrupted {
                closed_by: "div".to_string(),
            },
        },
        Severity::Fatal,
        false,
    );
    let v = serde_json::to_value(&i).expect("serialize issue");
    assert_eq!(v["type"], "unclosed_tag");
    assert_eq!(v["tag"], "p");
    assert_eq!(v["cause"], "interrupted");
    assert_eq!(v["closed_by"], "div");

    let back: Issue = serde_json::from_value(v).expect("deserialize issue");
    assert_eq!(back, i);
}

#[test]
fn document_level_issue_omits_position() {
    let i = Issue {
        kind: IssueKind::MissingNamespace,
        message: "Missing XHTML namespace".to_string(),
        line: None,
        column: None,
        severity: Severity::Error,
        fixable: true,
    };
    let v = serde_json::to_value(&i).expect("serialize issue");
    assert!(v.get("line").is_none());
    assert!(v.get("column").is_none());
    assert_eq!(v["type"], "missing_namespace");
}

#[test]
fn summary_counts_errors_and_warnings() {
    let mut repaired = FileReport::new("a.xhtml", FileStatus::Repaired);
    repaired.issues = vec![
        issue(IssueKind::MissingNamespace, Severity::Error, true),
        issue(
            IssueKind::SelfClosedContainer {
                tag: "div".to_string(),
            },
            Severity::Warning,
            true,
        ),
    ];
    repaired.fixes_applied = 2;

    let mut dry = FileReport::new("b.xhtml", FileStatus::WouldRepair);
    dry.issues = vec![issue(
        IssueKind::InvalidEntity {
            entity: "&".to_string(),
        },
        Severity::Fatal,
        true,
    )];
    dry.fixes_applied = 1;

    let summary: RunSummary = [&repaired, &dry].into_iter().collect();
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.errors_found, 2);
    assert_eq!(summary.warnings_found, 1);
    assert_eq!(summary.fixes_applied, 2);
    assert_eq!(summary.files_repaired, 1);
    assert_eq!(summary.files_would_repair, 1);
}

#[test]
fn summary_merge_adds_fields() {
    let mut a = RunSummary {
        files_processed: 1,
        errors_found: 2,
        ..Default::default()
    };
    let b = RunSummary {
        files_processed: 3,
        fixes_applied: 4,
        files_failed: 1,
        ..Default::default()
    };
    a.merge(&b);
    assert_eq!(a.files_processed, 4);
    assert_eq!(a.errors_found, 2);
    assert_eq!(a.fixes_applied, 4);
    assert_eq!(a.files_failed, 1);
}

#[test]
fn report_sorts_files_and_passes_when_clean() {
    let report = RunReport::new(
        tool(),
        run_info(),
        vec![
            FileReport::new("z.xhtml", FileStatus::Valid),
            FileReport::new("a.xhtml", FileStatus::Repaired),
        ],
    );
    assert_eq!(report.schema, xhtmlfix_types::schema::XHTMLFIX_REPORT_V1);
    assert_eq!(report.files[0].path, "a.xhtml");
    assert_eq!(report.verdict.status, VerdictStatus::Pass);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn report_fails_on_remaining_errors() {
    let mut unresolved = FileReport::new("a.xhtml", FileStatus::Unresolved);
    unresolved.issues_remaining = vec![issue(
        IssueKind::UnclosedTag {
            tag: "p".to_string(),
            cause: UnclosedCause::UnexpectedClose,
        },
        Severity::Fatal,
        false,
    )];
    let report = RunReport::new(tool(), run_info(), vec![unresolved]);
    assert_eq!(report.verdict.status, VerdictStatus::Fail);
    assert!(report
        .verdict
        .reasons
        .contains(&"unresolved_issues".to_string()));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn report_warnings_only_still_pass() {
    let mut file = FileReport::new("a.xhtml", FileStatus::Unresolved);
    file.issues_remaining = vec![issue(
        IssueKind::SelfClosedContainer {
            tag: "p".to_string(),
        },
        Severity::Warning,
        true,
    )];
    let report = RunReport::new(tool(), run_info(), vec![file]);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn dry_run_with_pending_repairs_fails() {
    let report = RunReport::new(
        tool(),
        run_info(),
        vec![FileReport::new("a.xhtml", FileStatus::WouldRepair)],
    );
    assert_eq!(report.verdict.reasons, vec!["repairs_pending".to_string()]);
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn report_errors_on_processing_failure() {
    let report = RunReport::new(
        tool(),
        run_info(),
        vec![
            FileReport::processing_error("a.xhtml", "permission denied"),
            FileReport::new("b.xhtml", FileStatus::Restored),
        ],
    );
    assert_eq!(report.verdict.status, VerdictStatus::Error);
    assert_eq!(report.exit_code(), 2);
    assert!(report
        .verdict
        .reasons
        .contains(&"restored_after_failed_verification".to_string()));
}

#[test]
fn structurally_valid_tracks_remaining_fatals() {
    let mut file = FileReport::new("a.xhtml", FileStatus::Rejected);
    assert!(file.structurally_valid());
    file.issues_remaining = vec![issue(
        IssueKind::InvalidEntity {
            entity: "&x".to_string(),
        },
        Severity::Fatal,
        true,
    )];
    assert!(!file.structurally_valid());
    assert!(!FileReport::skipped("b.xhtml").structurally_valid());
}
