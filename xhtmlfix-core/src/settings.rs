//! Clap-free settings for the check/fix pipeline.

use camino::{Utf8Path, Utf8PathBuf};
use xhtmlfix_domain::{DEFAULT_MAX_PASSES, RepairOptions, RepairPolicy};
use xhtmlfix_edit::{BackupOptions, DEFAULT_BACKUP_SUFFIX};
use xhtmlfix_render::DEFAULT_MAX_ISSUES_PER_FILE;

pub const DEFAULT_INCLUDE: &str = "**/*.xhtml";

/// Settings for one run over a document tree.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub root: Utf8PathBuf,
    /// Relative to `root` unless absolute.
    pub out_dir: Utf8PathBuf,

    // Discovery
    pub include: Vec<String>,
    pub exclude: Vec<String>,

    // Repair behaviour
    pub repair: bool,
    pub dry_run: bool,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub max_passes: u32,

    // Backups
    pub backup_suffix: String,
    pub backup_dir: Option<Utf8PathBuf>,

    // Execution
    /// Worker threads; 1 runs sequentially, 0 lets rayon decide.
    pub jobs: usize,
    pub fail_fast: bool,

    // Reporting
    pub max_issues_per_file: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            out_dir: Utf8PathBuf::from("artifacts/xhtmlfix"),
            include: vec![DEFAULT_INCLUDE.to_string()],
            exclude: Vec::new(),
            repair: false,
            dry_run: false,
            allow: Vec::new(),
            deny: Vec::new(),
            max_passes: DEFAULT_MAX_PASSES,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            backup_dir: None,
            jobs: 1,
            fail_fast: false,
            max_issues_per_file: DEFAULT_MAX_ISSUES_PER_FILE,
        }
    }
}

impl RunSettings {
    pub fn repair_options(&self) -> RepairOptions {
        RepairOptions {
            policy: RepairPolicy::new(self.allow.clone(), self.deny.clone()),
            max_passes: self.max_passes,
        }
    }

    pub fn backup_options(&self) -> BackupOptions {
        BackupOptions {
            suffix: self.backup_suffix.clone(),
            dir: self.backup_dir.clone(),
        }
    }

    pub fn resolved_out_dir(&self) -> Utf8PathBuf {
        resolve(&self.root, &self.out_dir)
    }

    /// Whether this run may write documents.
    pub fn writes_documents(&self) -> bool {
        self.repair && !self.dry_run
    }
}

fn resolve(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
