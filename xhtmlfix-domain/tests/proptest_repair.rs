//! Property-based tests for the repair engine.
//!
//! These tests verify that:
//! - Scanning and repairing never panic, whatever the input
//! - A second repair of repaired output is a no-op
//! - Documents assembled from fixable defects come out clean

use proptest::prelude::*;
use xhtmlfix_domain::{RepairOptions, analyze, repair};

/// Fragments with at most one defect each; every defect here is fixable.
const FRAGMENTS: &[&str] = &[
    "<p>plain text</p>",
    "<p class=note>unquoted</p>",
    "<p>Tom & Jerry</p>",
    "<p>&copy 2024</p>",
    "<div/>",
    "<p><img src=a.png/></p>",
    "<span title=\"\"\"\"\"x\">y</span>",
    "<a href=x&y>link</a>",
    "<p>&amp; &#169; &#x2014;</p>",
    "<!-- <b> & comment -->",
];

fn arb_document() -> impl Strategy<Value = String> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        prop::collection::vec(prop::sample::select(FRAGMENTS), 0..8),
    )
        .prop_map(|(prolog, doctype, namespace, body)| {
            let mut doc = String::new();
            if prolog {
                doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
            }
            if doctype {
                doc.push_str("<!DOCTYPE html>\n");
            }
            if namespace {
                doc.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\">\n");
            } else {
                doc.push_str("<html>\n");
            }
            doc.push_str("<body>\n");
            for fragment in body {
                doc.push_str(fragment);
                doc.push('\n');
            }
            doc.push_str("</body>\n</html>\n");
            doc
        })
}

proptest! {
    #[test]
    fn analyze_never_panics(text in any::<String>()) {
        let _ = analyze(&text);
    }

    #[test]
    fn repair_never_panics_on_markup_noise(text in "[<>&/=\"' a-z!?\\-;#\n]{0,200}") {
        let result = repair(&text, &RepairOptions::default());
        prop_assert!(result.passes <= 3);
        prop_assert_eq!(result.fixes_applied as usize, result.applied.len());
    }

    #[test]
    fn repaired_documents_are_clean(doc in arb_document()) {
        let result = repair(&doc, &RepairOptions::default());
        prop_assert!(
            result.issues_remaining.is_empty(),
            "remaining: {:?}\n{}",
            result.issues_remaining,
            result.content
        );
    }

    #[test]
    fn second_repair_is_a_no_op(doc in arb_document()) {
        let first = repair(&doc, &RepairOptions::default());
        let second = repair(&first.content, &RepairOptions::default());
        prop_assert_eq!(second.fixes_applied, 0);
        prop_assert_eq!(second.content, first.content);
    }
}
