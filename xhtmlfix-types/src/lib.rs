//! Shared DTOs (schemas-as-code) for the xhtmlfix workspace.
//!
//! # Design constraints
//! - Report types are serialized to disk and consumed by other tools.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod document;
pub mod issue;
pub mod repair;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const XHTMLFIX_REPORT_V1: &str = "xhtmlfix.report.v1";
}
