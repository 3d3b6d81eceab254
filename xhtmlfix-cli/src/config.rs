//! Configuration file loading for xhtmlfix.
//!
//! Discovers and loads `xhtmlfix.toml` from the document root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;
use xhtmlfix_core::RunSettings;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "xhtmlfix.toml";

/// Top-level configuration from xhtmlfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct XhtmlfixConfig {
    pub scan: ScanConfig,
    pub policy: PolicyConfig,
    pub backups: BackupsConfig,
    pub run: RunConfig,
    pub report: ReportConfig,
}

/// Document discovery.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns relative to the root. Empty means `**/*.xhtml`.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Policy section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Allowlist patterns for issue codes.
    /// If non-empty, only allowlisted codes are auto-repaired.
    pub allow: Vec<String>,

    /// Denylist patterns for issue codes.
    pub deny: Vec<String>,

    /// Upper bound on repair passes per document.
    pub max_passes: Option<u32>,
}

/// Backups section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackupsConfig {
    /// Suffix for backup files.
    pub suffix: Option<String>,

    /// Mirror backups under this directory instead of next to each file.
    pub dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub jobs: Option<usize>,
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub out_dir: Option<Utf8PathBuf>,
    pub max_issues_per_file: Option<usize>,
}

/// Discover the xhtmlfix.toml config file.
///
/// Returns `None` if no config file is found at the root.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse an xhtmlfix.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<XhtmlfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<XhtmlfixConfig> {
    let config: XhtmlfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the root, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<XhtmlfixConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(XhtmlfixConfig::default()),
    }
}

/// CLI values shared by `check` and `fix`. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub out_dir: Option<Utf8PathBuf>,
    pub jobs: Option<usize>,
    pub max_issues_per_file: Option<usize>,
}

/// CLI values specific to `fix`.
#[derive(Debug, Clone, Default)]
pub struct FixOverrides {
    pub dry_run: bool,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub max_passes: Option<u32>,
    pub fail_fast: bool,
    pub backup_suffix: Option<String>,
    pub backup_dir: Option<Utf8PathBuf>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: XhtmlfixConfig,
}

impl ConfigMerger {
    pub fn new(config: XhtmlfixConfig) -> Self {
        Self { config }
    }

    /// Settings for `check`: scan and report only.
    pub fn merge_check_args(self, root: &Utf8Path, cli: &RunOverrides) -> RunSettings {
        self.merge(root, cli, None)
    }

    /// Settings for `fix`.
    ///
    /// CLI `allow`/`deny`/`exclude` lists extend the config file lists;
    /// CLI scalars override config values; CLI `--include` replaces the
    /// config include list.
    pub fn merge_fix_args(
        self,
        root: &Utf8Path,
        cli: &RunOverrides,
        fix: &FixOverrides,
    ) -> RunSettings {
        self.merge(root, cli, Some(fix))
    }

    fn merge(self, root: &Utf8Path, cli: &RunOverrides, fix: Option<&FixOverrides>) -> RunSettings {
        let cfg = self.config;
        let mut settings = RunSettings {
            root: root.to_path_buf(),
            ..Default::default()
        };

        if !cli.include.is_empty() {
            settings.include = cli.include.clone();
        } else if !cfg.scan.include.is_empty() {
            settings.include = cfg.scan.include.clone();
        }
        settings.exclude = extend(cfg.scan.exclude, &cli.exclude);

        if let Some(out_dir) = cli.out_dir.clone().or(cfg.report.out_dir) {
            settings.out_dir = out_dir;
        }
        if let Some(jobs) = cli.jobs.or(cfg.run.jobs) {
            settings.jobs = jobs;
        }
        if let Some(max) = cli.max_issues_per_file.or(cfg.report.max_issues_per_file) {
            settings.max_issues_per_file = max;
        }

        let Some(fix) = fix else {
            return settings;
        };

        settings.repair = true;
        settings.dry_run = fix.dry_run;
        settings.allow = extend(cfg.policy.allow, &fix.allow);
        settings.deny = extend(cfg.policy.deny, &fix.deny);
        if let Some(passes) = fix.max_passes.or(cfg.policy.max_passes) {
            settings.max_passes = passes;
        }
        settings.fail_fast = fix.fail_fast || cfg.run.fail_fast;
        if let Some(suffix) = fix.backup_suffix.clone().or(cfg.backups.suffix) {
            settings.backup_suffix = suffix;
        }
        settings.backup_dir = fix.backup_dir.clone().or(cfg.backups.dir);
        settings
    }
}

fn extend(mut base: Vec<String>, extra: &[String]) -> Vec<String> {
    for pattern in extra {
        if !base.contains(pattern) {
            base.push(pattern.clone());
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[scan]
include = ["OEBPS/text/*.xhtml"]
exclude = []

[policy]
allow = []
deny = ["self_closed_*"]
max_passes = 5

[backups]
suffix = ".orig"
dir = "artifacts/xhtmlfix/backups"

[run]
jobs = 4
fail_fast = true

[report]
out_dir = "out"
max_issues_per_file = 3
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.scan.include, vec!["OEBPS/text/*.xhtml"]);
        assert_eq!(config.policy.deny, vec!["self_closed_*"]);
        assert_eq!(config.policy.max_passes, Some(5));
        assert_eq!(config.backups.suffix.as_deref(), Some(".orig"));
        assert_eq!(
            config.backups.dir,
            Some(Utf8PathBuf::from("artifacts/xhtmlfix/backups"))
        );
        assert_eq!(config.run.jobs, Some(4));
        assert!(config.run.fail_fast);
        assert_eq!(config.report.max_issues_per_file, Some(3));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.scan.include.is_empty());
        assert!(config.policy.allow.is_empty());
        assert!(!config.run.fail_fast);
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let err = parse_config("[run]\njobs = \"four\"\n").expect_err("bad type");
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_check_uses_defaults_without_config() {
        let settings = ConfigMerger::new(XhtmlfixConfig::default())
            .merge_check_args(Utf8Path::new("book"), &RunOverrides::default());
        assert_eq!(settings.root, Utf8PathBuf::from("book"));
        assert_eq!(settings.include, vec!["**/*.xhtml"]);
        assert!(!settings.repair);
        assert_eq!(settings.jobs, 1);
        assert_eq!(settings.backup_suffix, ".xhtmlfix.bak");
    }

    #[test]
    fn test_check_ignores_policy_section() {
        let config = parse_config("[policy]\nallow = [\"missing_*\"]\n").unwrap();
        let settings =
            ConfigMerger::new(config).merge_check_args(Utf8Path::new("."), &RunOverrides::default());
        assert!(settings.allow.is_empty());
        assert!(!settings.repair);
    }

    #[test]
    fn test_merge_fix_args_cli_extends_lists() {
        let config = XhtmlfixConfig {
            policy: PolicyConfig {
                allow: vec!["missing_*".to_string()],
                deny: vec!["self_closed_container".to_string()],
                ..Default::default()
            },
            scan: ScanConfig {
                include: vec!["text/*.xhtml".to_string()],
                exclude: vec!["text/nav.xhtml".to_string()],
            },
            ..Default::default()
        };
        let fix = FixOverrides {
            allow: vec!["invalid_entity".to_string(), "missing_*".to_string()],
            deny: vec!["unclosed_tag".to_string()],
            ..Default::default()
        };
        let cli = RunOverrides {
            exclude: vec!["text/toc.xhtml".to_string()],
            ..Default::default()
        };

        let settings = ConfigMerger::new(config).merge_fix_args(Utf8Path::new("."), &cli, &fix);

        assert!(settings.repair);
        assert_eq!(settings.allow, vec!["missing_*", "invalid_entity"]);
        assert_eq!(settings.deny, vec!["self_closed_container", "unclosed_tag"]);
        assert_eq!(settings.include, vec!["text/*.xhtml"]);
        assert_eq!(settings.exclude, vec!["text/nav.xhtml", "text/toc.xhtml"]);
    }

    #[test]
    fn test_cli_scalars_override_config() {
        let config = parse_config(
            "[run]\njobs = 8\n[policy]\nmax_passes = 5\n[backups]\nsuffix = \".orig\"\n[scan]\ninclude = [\"a/*.xhtml\"]\n",
        )
        .unwrap();
        let cli = RunOverrides {
            include: vec!["b/*.xhtml".to_string()],
            jobs: Some(2),
            ..Default::default()
        };
        let fix = FixOverrides {
            max_passes: Some(1),
            dry_run: true,
            ..Default::default()
        };

        let settings = ConfigMerger::new(config).merge_fix_args(Utf8Path::new("."), &cli, &fix);

        assert_eq!(settings.include, vec!["b/*.xhtml"]);
        assert_eq!(settings.jobs, 2);
        assert_eq!(settings.max_passes, 1);
        assert_eq!(settings.backup_suffix, ".orig");
        assert!(settings.dry_run);
    }

    #[test]
    fn test_fail_fast_from_either_source() {
        let config = parse_config("[run]\nfail_fast = true\n").unwrap();
        let settings = ConfigMerger::new(config).merge_fix_args(
            Utf8Path::new("."),
            &RunOverrides::default(),
            &FixOverrides::default(),
        );
        assert!(settings.fail_fast);

        let settings = ConfigMerger::new(XhtmlfixConfig::default()).merge_fix_args(
            Utf8Path::new("."),
            &RunOverrides::default(),
            &FixOverrides {
                fail_fast: true,
                ..Default::default()
            },
        );
        assert!(settings.fail_fast);
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(&root).expect("load default");
        assert!(cfg.policy.allow.is_empty());
        assert!(cfg.backups.dir.is_none());
    }
}
