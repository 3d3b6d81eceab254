//! Domain logic: scan XHTML text, find structural defects, and plan repairs.
//!
//! This crate owns *what* is wrong with a document and *which* text edits fix
//! it. It never touches the filesystem; persisting a repair is the job of
//! `xhtmlfix-edit`.

pub mod analyzer;
pub mod classifier;
pub mod fixes;
pub mod planner;
pub mod repair;
pub mod scanner;

pub use analyzer::{analyze, analyze_document};
pub use classifier::{RepairPolicy, SeverityCounts, partition};
pub use fixes::{Fix, plan_fix};
pub use planner::{PlannedFix, RepairPlan, apply_plan, plan};
pub use repair::{DEFAULT_MAX_PASSES, RepairOptions, apply_fixes, repair, repair_document};
