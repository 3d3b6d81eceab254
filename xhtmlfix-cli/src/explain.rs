//! Check explanations for the `xhtmlfix explain` and `list-checks` commands.
//!
//! Each entry covers one issue code: what triggers it, how severe it is,
//! what the automatic repair does, and what to do by hand when it cannot.

use xhtmlfix_types::issue::{Severity, codes};

/// Information about one structural check.
#[derive(Debug, Clone)]
pub struct CheckExplanation {
    /// Issue code as it appears in reports and policy patterns.
    pub code: &'static str,
    pub title: &'static str,
    /// Default severity. Some checks are downgraded by document context.
    pub severity: Severity,
    /// Context that changes the default severity, if any.
    pub severity_note: Option<&'static str>,
    /// Whether a mechanical repair exists (for at least some occurrences).
    pub fixable: bool,
    pub description: &'static str,
    pub repair: &'static str,
    pub remediation: &'static str,
}

/// Registry of all checks, in report order.
pub static CHECK_REGISTRY: &[CheckExplanation] = &[
    CheckExplanation {
        code: codes::MISSING_XML_DECLARATION,
        title: "Missing XML Declaration",
        severity: Severity::Error,
        severity_note: Some("warning when the document already has a DOCTYPE"),
        fixable: true,
        description: r#"The document does not start with a conforming XML declaration.

Reported when the prolog is absent, or when a `<?xml ...?>` header exists but
does not declare version 1.0 and UTF-8 encoding. A leading byte-order mark is
ignored."#,
        repair: r#"Inserts `<?xml version="1.0" encoding="UTF-8"?>` at the top of the document,
or replaces the malformed header in place."#,
        remediation: r#"Add the declaration as the first line of the file:

    <?xml version="1.0" encoding="UTF-8"?>

If the file is not UTF-8, re-encode it before running xhtmlfix."#,
    },
    CheckExplanation {
        code: codes::MISSING_DOCTYPE,
        title: "Missing DOCTYPE",
        severity: Severity::Error,
        severity_note: None,
        fixable: true,
        description: r#"The document has no `<!DOCTYPE html>` declaration, or has a malformed one."#,
        repair: r#"Inserts `<!DOCTYPE html>` directly after the XML declaration, or replaces the
malformed doctype header."#,
        remediation: r#"Add the doctype after the XML declaration:

    <!DOCTYPE html>"#,
    },
    CheckExplanation {
        code: codes::MISSING_NAMESPACE,
        title: "Missing XHTML Namespace",
        severity: Severity::Error,
        severity_note: None,
        fixable: true,
        description: r#"The root `<html>` element does not declare the XHTML namespace.

Without `xmlns="http://www.w3.org/1999/xhtml"` the document is not XHTML and
reading systems may fall back to quirks handling."#,
        repair: r#"Adds the namespace attribute to the root element, or corrects an existing
`xmlns` value."#,
        remediation: r#"Declare the namespace on the root element:

    <html xmlns="http://www.w3.org/1999/xhtml">"#,
    },
    CheckExplanation {
        code: codes::UNCLOSED_TAG,
        title: "Unclosed Tag",
        severity: Severity::Fatal,
        severity_note: None,
        fixable: true,
        description: r#"An element was opened but never closed, or a closing tag has no matching
opener.

Three shapes are reported:
- the element is still open at the end of the document
- an outer element was closed while this one was still open
- a closing tag arrived with nothing to close"#,
        repair: r#"Only elements still open at the end of the document are repaired: the missing
closing tags are appended in nesting order. Interrupted elements and stray
closing tags are never repaired automatically because the right place for the
missing tag cannot be derived from the text."#,
        remediation: r#"Find the reported line and add the closing tag where the element's content
ends. For a stray closing tag, remove it or add the opener it belongs to."#,
    },
    CheckExplanation {
        code: codes::UNQUOTED_ATTRIBUTE,
        title: "Unquoted Attribute Value",
        severity: Severity::Error,
        severity_note: None,
        fixable: true,
        description: r#"An attribute value is written without quotes, as in `class=note`."#,
        repair: r#"Wraps the value in double quotes: `class="note"`."#,
        remediation: r#"Quote every attribute value. XHTML does not allow bare values."#,
    },
    CheckExplanation {
        code: codes::MALFORMED_ATTRIBUTE,
        title: "Malformed Attribute",
        severity: Severity::Fatal,
        severity_note: None,
        fixable: true,
        description: r#"An attribute value opens a quote that never closes, or is unquoted and
contains characters that make its end ambiguous."#,
        repair: r#"Re-quotes the value with a balanced pair of double quotes."#,
        remediation: r#"Check what the attribute was meant to say. A missing quote often swallows
the rest of the tag, so the repaired value may still need trimming."#,
    },
    CheckExplanation {
        code: codes::INVALID_ENTITY,
        title: "Invalid Entity Reference",
        severity: Severity::Fatal,
        severity_note: None,
        fixable: true,
        description: r#"A bare `&` appears in text, or an entity reference is not terminated with `;`.

XML parsers reject the whole document on the first bad entity."#,
        repair: r#"Escapes a bare ampersand as `&amp;` and terminates an unterminated reference
with `;`."#,
        remediation: r#"Write `&amp;` for a literal ampersand. Named entities other than the five XML
ones must be replaced by numeric references or the character itself."#,
    },
    CheckExplanation {
        code: codes::CORRUPTED_QUOTES,
        title: "Corrupted Attribute Quotes",
        severity: Severity::Fatal,
        severity_note: None,
        fixable: true,
        description: r#"An attribute value starts with a run of repeated quote characters, as in
`class=""note""`. Usually left behind by a broken search-and-replace."#,
        repair: r#"Collapses the repeated quotes to a single pair."#,
        remediation: r#"Fix the value by hand and check the tool that produced the file."#,
    },
    CheckExplanation {
        code: codes::SELF_CLOSED_CONTAINER,
        title: "Self-Closed Container Element",
        severity: Severity::Warning,
        severity_note: None,
        fixable: true,
        description: r#"A non-void element is written in self-closing form, as in `<div/>`.

Valid XML, but HTML parsers treat it as an open tag and swallow the content
that follows."#,
        repair: r#"Expands `<div/>` to `<div></div>`."#,
        remediation: r#"Use an explicit closing tag for every element that is not void (`br`, `img`,
`hr`, `meta`, `link`, `input` and friends)."#,
    },
];

/// Look up a check by code.
///
/// Matching ignores case and accepts `-` in place of `_`.
pub fn lookup_check(query: &str) -> Option<&'static CheckExplanation> {
    let normalized = query.trim().to_lowercase().replace('-', "_");
    CHECK_REGISTRY.iter().find(|check| check.code == normalized)
}

/// List all check codes.
pub fn list_check_codes() -> Vec<&'static str> {
    CHECK_REGISTRY.iter().map(|c| c.code).collect()
}

/// Get a description of what a severity means for a run.
pub fn severity_meaning(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => {
            "WARNING issues are reported but never fail a run on their own."
        }
        Severity::Error => {
            "ERROR issues fail `xhtmlfix check`. A repair that leaves them behind is\n\
             committed and reported as `partial`."
        }
        Severity::Fatal => {
            "FATAL issues mean the document cannot be parsed as XML. A repair that\n\
             leaves any fatal issue behind is rejected and the file is not written."
        }
    }
}
