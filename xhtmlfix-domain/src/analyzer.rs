//! Structural analysis over scanner output.
//!
//! Declarations, tag balance, attributes and entities are checked
//! independently; the result is one flat list in scan order.

use crate::classifier::{DocumentFacts, classify};
use crate::scanner::{self, Quoting, Scan, TagKind};
use tracing::debug;
use xhtmlfix_types::document::Document;
use xhtmlfix_types::issue::{Issue, IssueKind, UnclosedCause};

/// Container elements whose self-closing form XHTML readers mishandle.
pub const NON_SELF_CLOSING: &[&str] = &[
    "html", "head", "title", "style", "script", "body", "main", "section", "div", "p", "h1", "h2",
    "h3", "h4", "h5", "h6", "span", "iframe", "textarea",
];

/// An open element awaiting its closing tag.
#[derive(Debug, Clone)]
struct TagFrame<'a> {
    name: &'a str,
    line: usize,
    column: usize,
}

pub fn analyze(content: &str) -> Vec<Issue> {
    let scan = scanner::scan(content);
    analyze_scan(&scan)
}

pub fn analyze_document(doc: &Document) -> Vec<Issue> {
    let issues = analyze(doc.content());
    debug!(path = %doc.path(), issues = issues.len(), "analyzed document");
    issues
}

/// Analyze an existing scan.
///
/// Document-level issues come first, then positioned issues top to bottom,
/// left to right.
pub fn analyze_scan(scan: &Scan) -> Vec<Issue> {
    let facts = DocumentFacts {
        has_doctype: scan.doctype.is_some(),
    };
    let mut issues = Vec::new();
    check_declarations(scan, &facts, &mut issues);
    check_tag_balance(scan, &facts, &mut issues);
    check_attributes(scan, &facts, &mut issues);
    check_entities(scan, &facts, &mut issues);
    issues.sort_by_key(Issue::scan_key);
    issues
}

fn check_declarations(scan: &Scan, facts: &DocumentFacts, issues: &mut Vec<Issue>) {
    if !scan.prolog_conforms() {
        let found = scan.prolog.as_ref().map(|h| h.text.clone());
        issues.push(classify(
            IssueKind::MissingXmlDeclaration { found },
            None,
            facts,
        ));
    }
    if !scan.doctype_conforms() {
        let found = scan.doctype.as_ref().map(|h| h.text.clone());
        issues.push(classify(IssueKind::MissingDoctype { found }, None, facts));
    }
    if !scan.root_has_namespace() {
        issues.push(classify(IssueKind::MissingNamespace, None, facts));
    }
}

fn check_tag_balance(scan: &Scan, facts: &DocumentFacts, issues: &mut Vec<Issue>) {
    let mut stack: Vec<TagFrame<'_>> = Vec::new();

    for tag in &scan.tags {
        match tag.kind {
            TagKind::SelfClosing => {
                if NON_SELF_CLOSING.contains(&tag.name.as_str()) {
                    issues.push(classify(
                        IssueKind::SelfClosedContainer {
                            tag: tag.name.clone(),
                        },
                        Some((tag.line, tag.column)),
                        facts,
                    ));
                }
            }
            TagKind::Open | TagKind::Close if scanner::is_void(&tag.name) => {}
            TagKind::Open => stack.push(TagFrame {
                name: &tag.name,
                line: tag.line,
                column: tag.column,
            }),
            TagKind::Close => match stack.iter().rposition(|f| f.name == tag.name) {
                Some(depth) => {
                    for frame in stack.drain(depth + 1..) {
                        debug!(tag = frame.name, closed_by = %tag.name, "frame interrupted");
                        issues.push(classify(
                            IssueKind::UnclosedTag {
                                tag: frame.name.to_string(),
                                cause: UnclosedCause::Interrupted {
                                    closed_by: tag.name.clone(),
                                },
                            },
                            Some((frame.line, frame.column)),
                            facts,
                        ));
                    }
                    stack.pop();
                }
                None => issues.push(classify(
                    IssueKind::UnclosedTag {
                        tag: tag.name.clone(),
                        cause: UnclosedCause::UnexpectedClose,
                    },
                    Some((tag.line, tag.column)),
                    facts,
                )),
            },
        }
    }

    for frame in stack {
        issues.push(classify(
            IssueKind::UnclosedTag {
                tag: frame.name.to_string(),
                cause: UnclosedCause::EndOfDocument,
            },
            Some((frame.line, frame.column)),
            facts,
        ));
    }
}

fn check_attributes(scan: &Scan, facts: &DocumentFacts, issues: &mut Vec<Issue>) {
    for attr in scan.tags.iter().flat_map(|t| &t.attributes) {
        let kind = match attr.quoting {
            Quoting::Double | Quoting::Single => continue,
            Quoting::Corrupted { quotes } => IssueKind::CorruptedQuotes {
                attribute: attr.name.clone(),
                quotes,
            },
            Quoting::Unterminated => IssueKind::MalformedAttribute {
                attribute: attr.name.clone(),
                value: attr.raw.clone(),
            },
            Quoting::Unquoted if is_ambiguous_unquoted(&attr.raw) => {
                IssueKind::MalformedAttribute {
                    attribute: attr.name.clone(),
                    value: attr.raw.clone(),
                }
            }
            Quoting::Unquoted => IssueKind::UnquotedAttribute {
                attribute: attr.name.clone(),
                value: attr.raw.clone(),
            },
        };
        issues.push(classify(kind, Some((attr.line, attr.column)), facts));
    }
}

fn is_ambiguous_unquoted(raw: &str) -> bool {
    raw.is_empty() || raw.contains(['=', '<', '`', '"', '\''])
}

fn check_entities(scan: &Scan, facts: &DocumentFacts, issues: &mut Vec<Issue>) {
    for entity in scan.entities.iter().filter(|e| !e.terminated) {
        issues.push(classify(
            IssueKind::InvalidEntity {
                entity: entity.text.clone(),
            },
            Some((entity.line, entity.column)),
            facts,
        ));
    }
}
