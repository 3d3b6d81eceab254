//! Text transforms, one per fixable issue.
//!
//! Every fix is a pure function from content to content. `apply` returns
//! `None` when the fix has nothing to do or its anchor is gone, so a fix can
//! never rewrite text it did not recognise.

use crate::scanner::{
    self, CANONICAL_DOCTYPE, CANONICAL_PROLOG, LineIndex, TagKind, XHTML_NAMESPACE,
};
use std::ops::Range;
use xhtmlfix_types::issue::{Issue, IssueKind, UnclosedCause};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fix {
    /// Prepend the canonical prolog, or replace a non-conforming one.
    EnsureProlog,
    /// Insert `<!DOCTYPE html>` after the prolog, or replace a malformed one.
    EnsureDoctype,
    /// Put the XHTML namespace on the root element.
    EnsureNamespace,
    /// Insert a missing closing tag near the end of the document.
    CloseElement { tag: String },
    QuoteAttribute {
        line: usize,
        column: usize,
        attribute: String,
        value: String,
    },
    CollapseQuotes {
        line: usize,
        column: usize,
        attribute: String,
        quotes: usize,
    },
    TerminateEntity {
        line: usize,
        column: usize,
        entity: String,
    },
    ExpandSelfClosing {
        line: usize,
        column: usize,
        tag: String,
    },
}

/// Plan the transform for one issue.
///
/// Returns `None` for issues without a mechanical fix.
pub fn plan_fix(issue: &Issue) -> Option<Fix> {
    if !issue.fixable {
        return None;
    }
    let position = issue.line.zip(issue.column);
    match &issue.kind {
        IssueKind::MissingXmlDeclaration { .. } => Some(Fix::EnsureProlog),
        IssueKind::MissingDoctype { .. } => Some(Fix::EnsureDoctype),
        IssueKind::MissingNamespace => Some(Fix::EnsureNamespace),
        IssueKind::UnclosedTag { tag, cause } => match cause {
            UnclosedCause::EndOfDocument => Some(Fix::CloseElement { tag: tag.clone() }),
            UnclosedCause::Interrupted { .. } | UnclosedCause::UnexpectedClose => None,
        },
        IssueKind::UnquotedAttribute { attribute, value }
        | IssueKind::MalformedAttribute { attribute, value } => {
            let (line, column) = position?;
            Some(Fix::QuoteAttribute {
                line,
                column,
                attribute: attribute.clone(),
                value: value.clone(),
            })
        }
        IssueKind::InvalidEntity { entity } => {
            let (line, column) = position?;
            Some(Fix::TerminateEntity {
                line,
                column,
                entity: entity.clone(),
            })
        }
        IssueKind::CorruptedQuotes { attribute, quotes } => {
            let (line, column) = position?;
            Some(Fix::CollapseQuotes {
                line,
                column,
                attribute: attribute.clone(),
                quotes: *quotes,
            })
        }
        IssueKind::SelfClosedContainer { tag } => {
            let (line, column) = position?;
            Some(Fix::ExpandSelfClosing {
                line,
                column,
                tag: tag.clone(),
            })
        }
    }
}

impl Fix {
    pub fn apply(&self, content: &str) -> Option<String> {
        match self {
            Fix::EnsureProlog => ensure_prolog(content),
            Fix::EnsureDoctype => ensure_doctype(content),
            Fix::EnsureNamespace => ensure_namespace(content),
            Fix::CloseElement { tag } => close_element(content, tag),
            Fix::QuoteAttribute {
                line,
                column,
                attribute,
                value,
            } => splice_in_line(content, *line, *column, |text, at| {
                quote_attribute_at(text, at, attribute, value)
            }),
            Fix::CollapseQuotes {
                line,
                column,
                attribute,
                quotes,
            } => splice_in_line(content, *line, *column, |text, at| {
                collapse_quotes_at(text, at, attribute, *quotes)
            }),
            Fix::TerminateEntity {
                line,
                column,
                entity,
            } => splice_in_line(content, *line, *column, |text, at| {
                terminate_entity_at(text, at, entity)
            }),
            Fix::ExpandSelfClosing { line, column, tag } => {
                splice_in_line(content, *line, *column, |text, at| {
                    expand_self_closing_at(text, at, tag)
                })
            }
        }
    }

    /// Position for line-addressed fixes.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Fix::QuoteAttribute { line, column, .. }
            | Fix::CollapseQuotes { line, column, .. }
            | Fix::TerminateEntity { line, column, .. }
            | Fix::ExpandSelfClosing { line, column, .. } => Some((*line, *column)),
            Fix::EnsureProlog
            | Fix::EnsureDoctype
            | Fix::EnsureNamespace
            | Fix::CloseElement { .. } => None,
        }
    }

    /// Line plus 1-based column range the fix reads from when planned.
    pub fn footprint(&self) -> Option<(usize, Range<usize>)> {
        let (line, column) = self.position()?;
        let len = match self {
            Fix::QuoteAttribute {
                attribute, value, ..
            } => attribute.len() + 1 + value.len(),
            Fix::CollapseQuotes {
                attribute, quotes, ..
            } => attribute.len() + 1 + quotes,
            Fix::TerminateEntity { entity, .. } => entity.len(),
            Fix::ExpandSelfClosing { tag, .. } => tag.len() + 1,
            _ => 0,
        };
        Some((line, column..column + len.max(1)))
    }

    pub fn describe(&self) -> String {
        match self {
            Fix::EnsureProlog => "Ensured XML declaration".to_string(),
            Fix::EnsureDoctype => "Ensured DOCTYPE declaration".to_string(),
            Fix::EnsureNamespace => "Added XHTML namespace to <html>".to_string(),
            Fix::CloseElement { tag } => format!("Inserted missing </{tag}>"),
            Fix::QuoteAttribute { attribute, .. } => format!("Quoted attribute {attribute}"),
            Fix::CollapseQuotes { attribute, .. } => {
                format!("Collapsed repeated quotes in attribute {attribute}")
            }
            Fix::TerminateEntity { entity, .. } if entity == "&" => {
                "Escaped ampersand as &amp;".to_string()
            }
            Fix::TerminateEntity { entity, .. } => format!("Terminated entity {entity};"),
            Fix::ExpandSelfClosing { tag, .. } => format!("Expanded <{tag}/> to <{tag}></{tag}>"),
        }
    }
}

fn bom_len(content: &str) -> usize {
    if content.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    }
}

fn ensure_prolog(content: &str) -> Option<String> {
    let scan = scanner::scan(content);
    if scan.prolog_conforms() {
        return None;
    }
    let span = match &scan.prolog {
        Some(header) => header.span.clone(),
        None => {
            let at = bom_len(content);
            return Some(splice(content, at..at, &format!("{CANONICAL_PROLOG}\n")));
        }
    };
    Some(splice(content, span, CANONICAL_PROLOG))
}

fn ensure_doctype(content: &str) -> Option<String> {
    let scan = scanner::scan(content);
    if scan.doctype_conforms() {
        return None;
    }
    if let Some(header) = &scan.doctype {
        return Some(splice(content, header.span.clone(), CANONICAL_DOCTYPE));
    }
    match &scan.prolog {
        Some(header) => {
            let at = header.span.end;
            Some(splice(content, at..at, &format!("\n{CANONICAL_DOCTYPE}")))
        }
        None => {
            let at = bom_len(content);
            Some(splice(content, at..at, &format!("{CANONICAL_DOCTYPE}\n")))
        }
    }
}

fn ensure_namespace(content: &str) -> Option<String> {
    let scan = scanner::scan(content);
    let root = scan.root()?;
    if scan.root_has_namespace() {
        return None;
    }

    // Replace an existing well-quoted xmlns value in place; corrupted forms
    // are repaired by their own fix first.
    if let Some(attr) = root.attribute("xmlns") {
        if !matches!(
            attr.quoting,
            scanner::Quoting::Double | scanner::Quoting::Single
        ) {
            return None;
        }
        return Some(splice(
            content,
            attr.value_span.clone(),
            &format!("\"{XHTML_NAMESPACE}\""),
        ));
    }

    let tag_text = content.get(root.span.clone())?;
    let (_, name, _, _) = scanner::tag_at_start(tag_text)?;
    let at = root.span.start + 1 + name.len();
    Some(splice(
        content,
        at..at,
        &format!(" xmlns=\"{XHTML_NAMESPACE}\""),
    ))
}

fn close_element(content: &str, tag: &str) -> Option<String> {
    let anchor = match tag {
        "html" => None,
        "body" => content.find("</html>"),
        _ => content.find("</body>").or_else(|| content.find("</html>")),
    };
    match anchor {
        Some(at) => Some(splice(content, at..at, &format!("</{tag}>\n"))),
        None => {
            let trimmed = content.trim_end();
            Some(format!("{trimmed}\n</{tag}>\n"))
        }
    }
}

fn splice(content: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len() + replacement.len());
    out.push_str(&content[..range.start]);
    out.push_str(replacement);
    out.push_str(&content[range.end..]);
    out
}

/// Run `edit` at the recorded position, then at each later candidate in the
/// same line, and splice the first edit that recognises its anchor.
fn splice_in_line<F>(content: &str, line: usize, column: usize, edit: F) -> Option<String>
where
    F: Fn(&str, usize) -> Option<(Range<usize>, String)>,
{
    let index = LineIndex::new(content);
    let span = index.line_span(line)?;
    let recorded = index
        .offset(line, column)
        .filter(|&at| content.is_char_boundary(at));

    let candidates = recorded.into_iter().chain(
        span.filter(|&at| Some(at) != recorded && content.is_char_boundary(at)),
    );
    for at in candidates {
        if let Some((range, replacement)) = edit(content, at) {
            return Some(splice(content, range, &replacement));
        }
    }
    None
}

fn ends_value(c: Option<char>) -> bool {
    c.is_none_or(|c| c.is_whitespace() || c == '>' || c == '/')
}

/// Offset just past `attribute` `=` at `at`, if the attribute starts there.
fn after_assignment(text: &str, at: usize, attribute: &str) -> Option<usize> {
    let rest = text.get(at..)?;
    if !rest.starts_with(attribute) || !text[..at].ends_with(char::is_whitespace) {
        return None;
    }
    let after_name = &rest[attribute.len()..];
    let eq = after_name.trim_start().strip_prefix('=')?;
    Some(text.len() - eq.len())
}

fn quote_attribute_at(
    text: &str,
    at: usize,
    attribute: &str,
    value: &str,
) -> Option<(Range<usize>, String)> {
    let eq_end = after_assignment(text, at, attribute)?;
    let rest = &text[eq_end..];
    // Unterminated values may sit after whitespace; unquoted ones never do.
    let start = if value.starts_with(['"', '\'']) {
        eq_end + (rest.len() - rest.trim_start().len())
    } else {
        eq_end
    };
    let end = start + value.len();
    if text.get(start..end)? != value || !ends_value(text[end..].chars().next()) {
        return None;
    }
    let cleaned: String = value.chars().filter(|&c| c != '"' && c != '\'').collect();
    Some((start..end, format!("\"{cleaned}\"")))
}

fn collapse_quotes_at(
    text: &str,
    at: usize,
    attribute: &str,
    quotes: usize,
) -> Option<(Range<usize>, String)> {
    let eq_end = after_assignment(text, at, attribute)?;
    let rest = &text[eq_end..];
    let start = eq_end + (rest.len() - rest.trim_start().len());
    let run = text[start..].bytes().take_while(|&b| b == b'"').count();
    if run != quotes {
        return None;
    }
    let end = start + run;
    let mut after = text[end..].chars();
    let no_value = match after.next() {
        None | Some('>') => true,
        Some(c) if c.is_whitespace() => true,
        Some('/') => after.next() == Some('>'),
        _ => false,
    };
    let replacement = if no_value { "\"\"" } else { "\"" };
    Some((start..end, replacement.to_string()))
}

fn terminate_entity_at(text: &str, at: usize, entity: &str) -> Option<(Range<usize>, String)> {
    let rest = text.get(at..)?;
    if !rest.starts_with(entity) {
        return None;
    }
    let end = at + entity.len();
    let next = text[end..].chars().next();
    if entity == "&" {
        // Only a lone ampersand; `&amp;` and friends are left alone.
        if next.is_some_and(scanner::is_entity_name_char) {
            return None;
        }
        return Some((at..end, "&amp;".to_string()));
    }
    if next.is_some_and(|c| scanner::is_entity_name_char(c) || c == ';') {
        return None;
    }
    Some((end..end, ";".to_string()))
}

fn expand_self_closing_at(text: &str, at: usize, tag: &str) -> Option<(Range<usize>, String)> {
    let (kind, name, body, len) = scanner::tag_at_start(text.get(at..)?)?;
    if kind != TagKind::SelfClosing || !name.eq_ignore_ascii_case(tag) {
        return None;
    }
    let body = body.trim_end();
    Some((at..at + len, format!("<{name}{body}></{name}>")))
}
