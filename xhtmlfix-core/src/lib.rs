//! Embeddable core library for xhtmlfix.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a larger publishing toolchain or other host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits:
//! - [`DocumentSource`](ports::DocumentSource): discover documents
//! - [`WritePort`](ports::WritePort): write report artifacts
//! - [`DocumentStore`](xhtmlfix_edit::DocumentStore): read, back up and commit documents
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run`](pipeline::run): check or fix a document tree and build the run report
//! - [`write_report_artifacts`](pipeline::write_report_artifacts): persist report.json/report.md/patch.diff

pub mod adapters;
pub mod cancel;
pub mod lock;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use cancel::CancelToken;
pub use pipeline::{RunOutcome, ToolError, process_document, run, write_report_artifacts};
pub use settings::RunSettings;

// Re-export the store so embedders don't need xhtmlfix-edit directly.
pub use xhtmlfix_edit::{DocumentStore, FsDocumentStore};
