use crate::classifier::RepairPolicy;
use crate::fixes::{Fix, plan_fix};
use std::cmp::Reverse;
use std::ops::Range;
use tracing::debug;
use xhtmlfix_types::issue::Issue;
use xhtmlfix_types::repair::AppliedFix;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFix {
    pub fix: Fix,
    pub code: &'static str,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Ordered fixes for one pass over one document.
#[derive(Debug, Clone, Default)]
pub struct RepairPlan {
    pub fixes: Vec<PlannedFix>,
    /// Fixable issues whose text overlaps an earlier fix on the same line.
    /// A later pass sees them again on the updated content.
    pub deferred: Vec<Issue>,
    /// Fixable issues the policy keeps away from auto-repair.
    pub withheld: Vec<Issue>,
}

impl RepairPlan {
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Plan fixes for the issues of one scan.
///
/// `issues` must be in scan order; the first fix to claim a stretch of a line
/// keeps it.
pub fn plan(issues: &[Issue], policy: &RepairPolicy) -> RepairPlan {
    let mut plan = RepairPlan::default();
    let mut claimed: Vec<(usize, Range<usize>)> = Vec::new();

    for issue in issues.iter().filter(|i| i.fixable) {
        if !policy.permits(issue.code()) {
            plan.withheld.push(issue.clone());
            continue;
        }
        let Some(fix) = plan_fix(issue) else {
            continue;
        };

        if let Some((line, cols)) = fix.footprint() {
            if claimed
                .iter()
                .any(|(l, c)| *l == line && c.start < cols.end && cols.start < c.end)
            {
                debug!(code = issue.code(), line, "fix deferred by overlap");
                plan.deferred.push(issue.clone());
                continue;
            }
            claimed.push((line, cols));
        } else if matches!(
            fix,
            Fix::EnsureProlog | Fix::EnsureDoctype | Fix::EnsureNamespace
        ) && plan.fixes.iter().any(|p| p.fix == fix)
        {
            continue;
        }

        plan.fixes.push(PlannedFix {
            fix,
            code: issue.code(),
            line: issue.line,
            column: issue.column,
        });
    }

    // Deterministic ordering.
    plan.fixes.sort_by_key(apply_order_key);
    plan
}

/// Line-addressed fixes first, bottom-up and right-to-left, so pending fixes
/// keep valid positions. Inserted closers follow, innermost first, then the
/// anchor-based declaration fixes.
fn apply_order_key(planned: &PlannedFix) -> (u8, Reverse<usize>, Reverse<usize>) {
    let rank = match planned.fix {
        Fix::QuoteAttribute { .. }
        | Fix::CollapseQuotes { .. }
        | Fix::TerminateEntity { .. }
        | Fix::ExpandSelfClosing { .. } => 0,
        Fix::CloseElement { .. } => 1,
        Fix::EnsureNamespace => 2,
        Fix::EnsureDoctype => 3,
        Fix::EnsureProlog => 4,
    };
    (
        rank,
        Reverse(planned.line.unwrap_or(0)),
        Reverse(planned.column.unwrap_or(0)),
    )
}

/// Apply a plan in order. Fixes whose anchor is gone are skipped.
pub fn apply_plan(content: &str, plan: &RepairPlan) -> (String, Vec<AppliedFix>) {
    let mut current = content.to_string();
    let mut applied = Vec::new();
    for planned in &plan.fixes {
        match planned.fix.apply(&current) {
            Some(next) => {
                current = next;
                applied.push(AppliedFix {
                    code: planned.code.to_string(),
                    description: planned.fix.describe(),
                    line: planned.line,
                });
            }
            None => debug!(code = planned.code, line = ?planned.line, "fix did not apply"),
        }
    }
    (current, applied)
}
