//! Pattern-based tokenizer.
//!
//! The scanner never builds a tree and never fails. It reports what it can
//! match (tags, attributes, entity references and declaration headers) and
//! leaves every judgement about malformation to the analyzer.

use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const CANONICAL_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const CANONICAL_DOCTYPE: &str = "<!DOCTYPE html>";

const BOM: char = '\u{feff}';

/// Elements that never take a closing tag and are excluded from stack tracking.
pub const VOID_ELEMENTS: &[&str] = &[
    "img", "br", "hr", "meta", "link", "input", "area", "base", "col", "embed", "source", "track",
    "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

// Comments and CDATA are blanked out before tag and entity matching. An
// unterminated section runs to the end of the input.
static OPAQUE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?(?:-->|\z)|<!\[CDATA\[.*?(?:\]\]>|\z)").unwrap()
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][\w:.-]*)((?:"[^"<]*"|'[^'<]*'|[^<>])*?)(/?)>"#).unwrap()
});

static TAG_AT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<(/?)([A-Za-z][\w:.-]*)((?:"[^"<]*"|'[^'<]*'|[^<>])*?)(/?)>"#).unwrap()
});

static ATTRIBUTE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([A-Za-z_][\w:.-]*)\s*=").unwrap());

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"&([^;\s<>&"']*)(;?)"#).unwrap());

static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<!doctype\b[^<>]*>").unwrap());

static CONFORMING_PROLOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<\?xml\s+version\s*=\s*["']1\.0["'][^<>]*\?>$"#).unwrap()
});

/// Maps byte offsets to 1-based line and byte column.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            starts,
            len: text.len(),
        }
    }

    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let start = self.starts[line - 1];
        (line, offset.saturating_sub(start) + 1)
    }

    /// Byte range of a 1-based line, excluding its newline.
    pub fn line_span(&self, line: usize) -> Option<Range<usize>> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self
            .starts
            .get(line)
            .map(|&next| next - 1)
            .unwrap_or(self.len);
        Some(start..end)
    }

    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        let span = self.line_span(line)?;
        let offset = span.start + column.checked_sub(1)?;
        (offset <= span.end).then_some(offset)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    SelfClosing,
}

/// How an attribute value was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Double,
    Single,
    Unquoted,
    /// Opening quote with no closing quote before the tag ends.
    Unterminated,
    /// Three or more consecutive `"` opening the value.
    Corrupted { quotes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeToken {
    pub name: String,
    /// Value text without surrounding quotes.
    pub value: String,
    /// Value exactly as written after `=` (leading whitespace excluded).
    pub raw: String,
    pub quoting: Quoting,
    /// Byte span of `raw`.
    pub value_span: Range<usize>,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    pub kind: TagKind,
    /// Lowercased tag name.
    pub name: String,
    pub span: Range<usize>,
    pub line: usize,
    pub column: usize,
    pub attributes: Vec<AttributeToken>,
}

impl TagToken {
    pub fn attribute(&self, name: &str) -> Option<&AttributeToken> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityToken {
    /// `&` plus the name characters that follow it, without the `;`.
    pub text: String,
    pub terminated: bool,
    pub span: Range<usize>,
    pub line: usize,
    pub column: usize,
}

impl EntityToken {
    /// A lone `&` with no name after it.
    pub fn is_bare(&self) -> bool {
        self.text == "&"
    }
}

/// Prolog or doctype header text and where it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub text: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub bom: bool,
    pub prolog: Option<Header>,
    pub doctype: Option<Header>,
    pub tags: Vec<TagToken>,
    pub entities: Vec<EntityToken>,
}

impl Scan {
    /// The first `<html>` element.
    pub fn root(&self) -> Option<&TagToken> {
        self.tags
            .iter()
            .find(|t| t.name == "html" && t.kind != TagKind::Close)
    }

    pub fn prolog_conforms(&self) -> bool {
        self.prolog
            .as_ref()
            .is_some_and(|h| CONFORMING_PROLOG.is_match(&h.text))
    }

    pub fn doctype_conforms(&self) -> bool {
        self.doctype
            .as_ref()
            .is_some_and(|h| h.text == CANONICAL_DOCTYPE)
    }

    pub fn root_has_namespace(&self) -> bool {
        self.root()
            .and_then(|root| root.attribute("xmlns"))
            .is_some_and(|a| a.value == XHTML_NAMESPACE)
    }
}

/// Tokenize `text`.
pub fn scan(text: &str) -> Scan {
    let masked = mask_opaque_sections(text);
    let index = LineIndex::new(text);

    let bom = text.starts_with(BOM);
    let body_start = if bom { BOM.len_utf8() } else { 0 };

    let prolog = prolog_header(text, body_start);
    let doctype = DOCTYPE.find(&masked).map(|m| Header {
        text: m.as_str().to_string(),
        span: m.range(),
    });

    let tags = TAG
        .captures_iter(&masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let closing = caps.get(1).is_some_and(|m| !m.is_empty());
            let name = caps.get(2)?;
            let self_closing = caps.get(4).is_some_and(|m| !m.is_empty());
            let kind = match (closing, self_closing) {
                (true, _) => TagKind::Close,
                (false, true) => TagKind::SelfClosing,
                (false, false) => TagKind::Open,
            };
            let attributes = match (kind, caps.get(3)) {
                (TagKind::Close, _) | (_, None) => Vec::new(),
                (_, Some(body)) => scan_attributes(body.as_str(), body.start(), &index),
            };
            let (line, column) = index.position(whole.start());
            Some(TagToken {
                kind,
                name: name.as_str().to_ascii_lowercase(),
                span: whole.range(),
                line,
                column,
                attributes,
            })
        })
        .collect();

    let entities = ENTITY
        .captures_iter(&masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1).map_or("", |m| m.as_str());
            let terminated = caps.get(2).is_some_and(|m| !m.is_empty());
            let (line, column) = index.position(whole.start());
            Some(EntityToken {
                text: format!("&{name}"),
                terminated: terminated && !name.is_empty(),
                span: whole.range(),
                line,
                column,
            })
        })
        .collect();

    Scan {
        bom,
        prolog,
        doctype,
        tags,
        entities,
    }
}

/// Match a single tag that starts exactly at the beginning of `text`.
///
/// Returns the tag kind, its name as written, the attribute body, and the
/// byte length of the whole tag.
pub fn tag_at_start(text: &str) -> Option<(TagKind, &str, &str, usize)> {
    let caps = TAG_AT_START.captures(text)?;
    let whole = caps.get(0)?;
    let name = caps.get(2)?.as_str();
    let body = caps.get(3).map_or("", |m| m.as_str());
    let kind = if caps.get(1).is_some_and(|m| !m.is_empty()) {
        TagKind::Close
    } else if caps.get(4).is_some_and(|m| !m.is_empty()) {
        TagKind::SelfClosing
    } else {
        TagKind::Open
    };
    Some((kind, name, body, whole.end()))
}

/// Characters that may appear in an entity name as the scanner reads it.
pub fn is_entity_name_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, ';' | '<' | '>' | '&' | '"' | '\''))
}

fn mask_opaque_sections(text: &str) -> Cow<'_, str> {
    if !text.contains("<!") {
        return Cow::Borrowed(text);
    }
    let mut masked = String::with_capacity(text.len());
    let mut last = 0;
    for m in OPAQUE_SECTION.find_iter(text) {
        masked.push_str(&text[last..m.start()]);
        for c in m.as_str().chars() {
            if c == '\n' {
                masked.push('\n');
            } else {
                masked.extend(std::iter::repeat_n(' ', c.len_utf8()));
            }
        }
        last = m.end();
    }
    masked.push_str(&text[last..]);
    Cow::Owned(masked)
}

fn prolog_header(text: &str, start: usize) -> Option<Header> {
    let rest = text.get(start..)?;
    let after = rest.strip_prefix("<?xml")?;
    if !after.starts_with(|c: char| c.is_whitespace() || c == '?' || c == '>') {
        // `<?xml-stylesheet ...?>` and friends are processing instructions.
        return None;
    }
    let line_end = rest.find('\n').unwrap_or(rest.len());
    let len = rest[..line_end]
        .find('>')
        .map_or(line_end, |i| i + 1);
    Some(Header {
        text: rest[..len].to_string(),
        span: start..start + len,
    })
}

fn scan_attributes(body: &str, base: usize, index: &LineIndex) -> Vec<AttributeToken> {
    let mut attributes = Vec::new();
    let mut cursor = 0;
    while let Some(caps) = ATTRIBUTE_NAME.captures_at(body, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let value = read_value(body, whole.end());
        let (line, column) = index.position(base + name.start());
        cursor = value.end.max(whole.end());
        attributes.push(AttributeToken {
            name: name.as_str().to_string(),
            value: value.text,
            raw: value.raw,
            quoting: value.quoting,
            value_span: base + value.start..base + value.end,
            line,
            column,
        });
    }
    attributes
}

struct RawValue {
    text: String,
    raw: String,
    quoting: Quoting,
    start: usize,
    end: usize,
}

fn read_value(body: &str, eq_end: usize) -> RawValue {
    let rest = &body[eq_end..];
    let trimmed = rest.trim_start();
    let start = eq_end + (rest.len() - trimmed.len());

    let quote = match trimmed.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => {
            // Unquoted values begin right after `=`; whitespace there means
            // the value is empty.
            let len = if start > eq_end {
                0
            } else {
                rest.find(char::is_whitespace).unwrap_or(rest.len())
            };
            let raw = rest[..len].to_string();
            return RawValue {
                text: raw.clone(),
                raw,
                quoting: Quoting::Unquoted,
                start: eq_end,
                end: eq_end + len,
            };
        }
    };

    let run = trimmed.chars().take_while(|&c| c == quote).count();
    if quote == '"' && run >= 3 {
        let after = &trimmed[run..];
        let (value_len, close) = match after.find('"') {
            Some(i) => (i, 1),
            None => (after.find(char::is_whitespace).unwrap_or(after.len()), 0),
        };
        let raw_len = run + value_len + close;
        return RawValue {
            text: after[..value_len].to_string(),
            raw: trimmed[..raw_len].to_string(),
            quoting: Quoting::Corrupted { quotes: run },
            start,
            end: start + raw_len,
        };
    }

    let inner = &trimmed[1..];
    match inner.find(quote) {
        Some(i) => RawValue {
            text: inner[..i].to_string(),
            raw: trimmed[..i + 2].to_string(),
            quoting: if quote == '"' {
                Quoting::Double
            } else {
                Quoting::Single
            },
            start,
            end: start + i + 2,
        },
        None => {
            let raw = trimmed.trim_end();
            RawValue {
                text: raw[1..].to_string(),
                raw: raw.to_string(),
                quoting: Quoting::Unterminated,
                start,
                end: start + raw.len(),
            }
        }
    }
}
