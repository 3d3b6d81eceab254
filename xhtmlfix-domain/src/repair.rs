use crate::analyzer::analyze;
use crate::classifier::RepairPolicy;
use crate::planner::{apply_plan, plan};
use tracing::debug;
use xhtmlfix_types::document::Document;
use xhtmlfix_types::issue::Issue;
use xhtmlfix_types::repair::{AppliedFix, RepairResult};

pub const DEFAULT_MAX_PASSES: u32 = 3;

#[derive(Debug, Clone)]
pub struct RepairOptions {
    pub policy: RepairPolicy,
    /// Upper bound on scan/plan/apply passes. Deferred fixes are retried on
    /// the next pass.
    pub max_passes: u32,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            policy: RepairPolicy::default(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// One pass: plan the fixable, permitted subset of `issues` and apply it.
pub fn apply_fixes(
    content: &str,
    issues: &[Issue],
    policy: &RepairPolicy,
) -> (String, Vec<AppliedFix>) {
    apply_plan(content, &plan(issues, policy))
}

/// Repair `content` until nothing more applies or the pass budget runs out.
///
/// `issues_remaining` always comes from a fresh scan of the returned content.
pub fn repair(content: &str, options: &RepairOptions) -> RepairResult {
    let max_passes = options.max_passes.max(1);
    let mut current = content.to_string();
    let mut applied = Vec::new();
    let mut passes = 0;
    let mut issues = analyze(&current);

    while passes < max_passes {
        let plan = plan(&issues, &options.policy);
        if plan.is_empty() {
            break;
        }
        passes += 1;
        let (next, fixes) = apply_plan(&current, &plan);
        debug!(
            pass = passes,
            planned = plan.fixes.len(),
            applied = fixes.len(),
            deferred = plan.deferred.len(),
            "repair pass"
        );
        if fixes.is_empty() {
            break;
        }
        current = next;
        applied.extend(fixes);
        issues = analyze(&current);
    }

    RepairResult {
        content: current,
        fixes_applied: applied.len() as u64,
        issues_remaining: issues,
        applied,
        passes,
    }
}

pub fn repair_document(doc: &Document, options: &RepairOptions) -> RepairResult {
    let result = repair(doc.content(), options);
    debug!(
        path = %doc.path(),
        fixes = result.fixes_applied,
        remaining = result.issues_remaining.len(),
        "repaired document"
    );
    result
}
