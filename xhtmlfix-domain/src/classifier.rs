//! Severity and fixability table, issue partitioning, and repair policy.

use xhtmlfix_types::issue::{Issue, IssueKind, Severity, UnclosedCause};

/// Document-wide facts that shift the severity of some kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentFacts {
    pub has_doctype: bool,
}

pub fn severity(kind: &IssueKind, facts: &DocumentFacts) -> Severity {
    match kind {
        IssueKind::MissingXmlDeclaration { .. } if facts.has_doctype => Severity::Warning,
        IssueKind::MissingXmlDeclaration { .. } => Severity::Error,
        IssueKind::MissingDoctype { .. } => Severity::Error,
        IssueKind::MissingNamespace => Severity::Error,
        IssueKind::UnclosedTag { .. } => Severity::Fatal,
        IssueKind::UnquotedAttribute { .. } => Severity::Error,
        IssueKind::MalformedAttribute { .. } => Severity::Fatal,
        IssueKind::InvalidEntity { .. } => Severity::Fatal,
        IssueKind::CorruptedQuotes { .. } => Severity::Fatal,
        IssueKind::SelfClosedContainer { .. } => Severity::Warning,
    }
}

/// Whether a mechanical transform exists for this kind.
///
/// Interrupted frames and stray closers have no safe placement for the
/// missing tag, so they are left to a human.
pub fn is_fixable(kind: &IssueKind) -> bool {
    match kind {
        IssueKind::UnclosedTag { cause, .. } => matches!(cause, UnclosedCause::EndOfDocument),
        _ => true,
    }
}

pub fn describe(kind: &IssueKind) -> String {
    match kind {
        IssueKind::MissingXmlDeclaration { found: None } => "Missing XML declaration".to_string(),
        IssueKind::MissingXmlDeclaration { found: Some(h) } => {
            format!("Malformed XML declaration: {h}")
        }
        IssueKind::MissingDoctype { found: None } => "Missing DOCTYPE declaration".to_string(),
        IssueKind::MissingDoctype { found: Some(h) } => format!("Malformed DOCTYPE declaration: {h}"),
        IssueKind::MissingNamespace => "Missing XHTML namespace".to_string(),
        IssueKind::UnclosedTag { tag, cause } => match cause {
            UnclosedCause::Interrupted { closed_by } => {
                format!("Unclosed tag: <{tag}> (interrupted by </{closed_by}>)")
            }
            UnclosedCause::UnexpectedClose => format!("Unexpected closing tag: </{tag}>"),
            UnclosedCause::EndOfDocument => format!("Unclosed tag: <{tag}>"),
        },
        IssueKind::UnquotedAttribute { attribute, value } => {
            format!("Unquoted attribute: {attribute}={value}")
        }
        IssueKind::MalformedAttribute { attribute, value } if value.is_empty() => {
            format!("Malformed attribute: {attribute} has no value")
        }
        IssueKind::MalformedAttribute { attribute, value } => {
            format!("Malformed attribute: {attribute}={value}")
        }
        IssueKind::InvalidEntity { entity } if entity == "&" => {
            "Unescaped ampersand".to_string()
        }
        IssueKind::InvalidEntity { entity } => format!("Invalid entity reference: {entity}"),
        IssueKind::CorruptedQuotes { attribute, quotes } => {
            format!("Corrupted quotes in attribute {attribute} ({quotes} consecutive quotes)")
        }
        IssueKind::SelfClosedContainer { tag } => {
            format!("Self-closing <{tag}/> is not valid for a container element")
        }
    }
}

/// Build an issue with its severity, fixability and message filled in.
pub fn classify(
    kind: IssueKind,
    position: Option<(usize, usize)>,
    facts: &DocumentFacts,
) -> Issue {
    // Document-level kinds never carry a position.
    let position = position.filter(|_| !kind.is_document_level());
    Issue {
        message: describe(&kind),
        severity: severity(&kind, facts),
        fixable: is_fixable(&kind),
        line: position.map(|(line, _)| line),
        column: position.map(|(_, column)| column),
        kind,
    }
}

#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub fixable: Vec<&'a Issue>,
    pub manual: Vec<&'a Issue>,
}

pub fn partition(issues: &[Issue]) -> Partition<'_> {
    let (fixable, manual) = issues.iter().partition(|i| i.fixable);
    Partition { fixable, manual }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub warnings: usize,
    pub errors: usize,
    pub fatals: usize,
}

impl SeverityCounts {
    pub fn of(issues: &[Issue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Warning => counts.warnings += 1,
                Severity::Error => counts.errors += 1,
                Severity::Fatal => counts.fatals += 1,
            }
        }
        counts
    }
}

/// Which fixable issue codes the planner may auto-apply.
///
/// Deny wins over allow. An empty allow list permits every code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairPolicy {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl RepairPolicy {
    pub fn new(allow: Vec<String>, deny: Vec<String>) -> Self {
        Self { allow, deny }
    }

    pub fn permits(&self, code: &str) -> bool {
        if self.deny.iter().any(|pat| glob_match(pat, code)) {
            return false;
        }
        self.allow.is_empty() || self.allow.iter().any(|pat| glob_match(pat, code))
    }

    pub fn withholds(&self, issue: &Issue) -> bool {
        issue.fixable && !self.permits(issue.code())
    }
}

/// `*` and `?` wildcard match over the whole string.
pub fn glob_match(pat: &str, text: &str) -> bool {
    let p = pat.as_bytes();
    let t = text.as_bytes();
    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;

    for i in 1..=p.len() {
        if p[i - 1] == b'*' {
            dp[i][0] = dp[i - 1][0];
        }
    }

    for i in 1..=p.len() {
        for j in 1..=t.len() {
            dp[i][j] = match p[i - 1] {
                b'*' => dp[i - 1][j] || dp[i][j - 1],
                b'?' => dp[i - 1][j - 1],
                c => dp[i - 1][j - 1] && c == t[j - 1],
            };
        }
    }

    dp[p.len()][t.len()]
}
