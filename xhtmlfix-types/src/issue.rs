use serde::{Deserialize, Serialize};
use std::fmt;

/// How bad a structural defect is.
///
/// - warning: the document is usable but deviates from the expected shape
/// - error: the document violates a conformance rule
/// - fatal: structure integrity is compromised; downstream tooling must not trust it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Errors and fatals both count as errors in run statistics.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a tag frame was reported as unclosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum UnclosedCause {
    /// A closing tag for an outer element arrived while this frame was still open.
    Interrupted { closed_by: String },
    /// A closing tag arrived with no matching open frame at all.
    UnexpectedClose,
    /// The frame was still open when the document ended.
    EndOfDocument,
}

/// Defect kind plus its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    MissingXmlDeclaration {
        /// Non-conforming prolog text found at the top of the document, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        found: Option<String>,
    },
    MissingDoctype {
        /// Malformed doctype header found in the document, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        found: Option<String>,
    },
    MissingNamespace,
    UnclosedTag {
        tag: String,
        #[serde(flatten)]
        cause: UnclosedCause,
    },
    UnquotedAttribute {
        attribute: String,
        value: String,
    },
    MalformedAttribute {
        attribute: String,
        value: String,
    },
    InvalidEntity {
        entity: String,
    },
    CorruptedQuotes {
        attribute: String,
        quotes: usize,
    },
    SelfClosedContainer {
        tag: String,
    },
}

impl IssueKind {
    /// Stable snake_case code, used in reports and in policy patterns.
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::MissingXmlDeclaration { .. } => codes::MISSING_XML_DECLARATION,
            IssueKind::MissingDoctype { .. } => codes::MISSING_DOCTYPE,
            IssueKind::MissingNamespace => codes::MISSING_NAMESPACE,
            IssueKind::UnclosedTag { .. } => codes::UNCLOSED_TAG,
            IssueKind::UnquotedAttribute { .. } => codes::UNQUOTED_ATTRIBUTE,
            IssueKind::MalformedAttribute { .. } => codes::MALFORMED_ATTRIBUTE,
            IssueKind::InvalidEntity { .. } => codes::INVALID_ENTITY,
            IssueKind::CorruptedQuotes { .. } => codes::CORRUPTED_QUOTES,
            IssueKind::SelfClosedContainer { .. } => codes::SELF_CLOSED_CONTAINER,
        }
    }

    /// Whether this kind addresses the whole document rather than a position.
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            IssueKind::MissingXmlDeclaration { .. }
                | IssueKind::MissingDoctype { .. }
                | IssueKind::MissingNamespace
        )
    }
}

/// Issue codes as they appear in reports.
pub mod codes {
    pub const MISSING_XML_DECLARATION: &str = "missing_xml_declaration";
    pub const MISSING_DOCTYPE: &str = "missing_doctype";
    pub const MISSING_NAMESPACE: &str = "missing_namespace";
    pub const UNCLOSED_TAG: &str = "unclosed_tag";
    pub const UNQUOTED_ATTRIBUTE: &str = "unquoted_attribute";
    pub const MALFORMED_ATTRIBUTE: &str = "malformed_attribute";
    pub const INVALID_ENTITY: &str = "invalid_entity";
    pub const CORRUPTED_QUOTES: &str = "corrupted_quotes";
    pub const SELF_CLOSED_CONTAINER: &str = "self_closed_container";

    pub const ALL: &[&str] = &[
        MISSING_XML_DECLARATION,
        MISSING_DOCTYPE,
        MISSING_NAMESPACE,
        UNCLOSED_TAG,
        UNQUOTED_ATTRIBUTE,
        MALFORMED_ATTRIBUTE,
        INVALID_ENTITY,
        CORRUPTED_QUOTES,
        SELF_CLOSED_CONTAINER,
    ];
}

/// A structural defect found by the analyzer.
///
/// Issues are never mutated after creation; a repair is observed through the
/// issues of a fresh scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(flatten)]
    pub kind: IssueKind,

    pub message: String,

    /// 1-based line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// 1-based byte column within the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,

    pub severity: Severity,
    pub fixable: bool,
}

impl Issue {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// Sort key for scan order: document-level issues first, then by position.
    pub fn scan_key(&self) -> (usize, usize) {
        (self.line.unwrap_or(0), self.column.unwrap_or(0))
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "[{}] {} (line {}): {}",
                self.severity,
                self.code(),
                line,
                self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.code(), self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_warning_below_fatal() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
        assert!(!Severity::Warning.is_error());
        assert!(Severity::Fatal.is_error());
    }

    #[test]
    fn every_kind_code_is_listed() {
        let kinds = [
            IssueKind::MissingXmlDeclaration { found: None },
            IssueKind::MissingDoctype { found: None },
            IssueKind::MissingNamespace,
            IssueKind::UnclosedTag {
                tag: "p".into(),
                cause: UnclosedCause::EndOfDocument,
            },
            IssueKind::UnquotedAttribute {
                attribute: "class".into(),
                value: "note".into(),
            },
            IssueKind::MalformedAttribute {
                attribute: "class".into(),
                value: String::new(),
            },
            IssueKind::InvalidEntity {
                entity: "&".into(),
            },
            IssueKind::CorruptedQuotes {
                attribute: "xmlns".into(),
                quotes: 5,
            },
            IssueKind::SelfClosedContainer { tag: "div".into() },
        ];
        for kind in &kinds {
            assert!(codes::ALL.contains(&kind.code()), "{}", kind.code());
        }
        assert_eq!(kinds.len(), codes::ALL.len());
    }

    #[test]
    fn display_includes_line_when_present() {
        let issue = Issue {
            kind: IssueKind::InvalidEntity {
                entity: "&foo".into(),
            },
            message: "Invalid entity reference: &foo".into(),
            line: Some(7),
            column: Some(3),
            severity: Severity::Fatal,
            fixable: true,
        };
        assert_eq!(
            issue.to_string(),
            "[fatal] invalid_entity (line 7): Invalid entity reference: &foo"
        );
    }
}
