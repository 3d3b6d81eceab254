mod config;
mod explain;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{ConfigMerger, FixOverrides, RunOverrides};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use xhtmlfix_core::adapters::{FsDocumentSource, FsWritePort};
use xhtmlfix_core::{CancelToken, FsDocumentStore, RunSettings};
use xhtmlfix_render::render_console_summary;
use xhtmlfix_types::report::ToolInfo;

#[derive(Debug, Parser)]
#[command(
    name = "xhtmlfix",
    version,
    about = "Structural validation and repair for XHTML document trees."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan documents and report structural issues. Never writes documents.
    Check(CheckArgs),
    /// Scan documents and repair what can be repaired safely.
    Fix(FixArgs),
    /// Explain what a check detects and how it is repaired.
    Explain(ExplainArgs),
    /// List all checks.
    ListChecks(ListChecksArgs),
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Root of the document tree.
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Glob patterns for documents, relative to the root (default: **/*.xhtml).
    #[arg(long)]
    include: Vec<String>,

    /// Glob patterns for documents to skip, relative to the root.
    #[arg(long)]
    exclude: Vec<String>,

    /// Output directory for report artifacts (default: <root>/artifacts/xhtmlfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Worker threads. 1 runs sequentially, 0 uses one per core.
    #[arg(long)]
    jobs: Option<usize>,

    /// Cap on issues listed per file in report.md.
    #[arg(long)]
    max_issues_per_file: Option<usize>,
}

impl RunArgs {
    fn overrides(&self) -> RunOverrides {
        RunOverrides {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            out_dir: self.out_dir.clone(),
            jobs: self.jobs,
            max_issues_per_file: self.max_issues_per_file,
        }
    }
}

#[derive(Debug, clap::Args)]
struct CheckArgs {
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Debug, clap::Args)]
struct FixArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Compute repairs and write patch.diff without touching documents.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Allowlist patterns for issue codes. If given, only matching codes are repaired.
    #[arg(long)]
    allow: Vec<String>,

    /// Denylist patterns for issue codes.
    #[arg(long)]
    deny: Vec<String>,

    /// Maximum repair passes per document.
    #[arg(long)]
    max_passes: Option<u32>,

    /// Stop starting new documents after the first restore or processing error.
    #[arg(long, default_value_t = false)]
    fail_fast: bool,

    /// Suffix for backup files.
    #[arg(long)]
    backup_suffix: Option<String>,

    /// Mirror backups under this directory instead of next to each document.
    #[arg(long)]
    backup_dir: Option<Utf8PathBuf>,
}

impl FixArgs {
    fn overrides(&self) -> FixOverrides {
        FixOverrides {
            dry_run: self.dry_run,
            allow: self.allow.clone(),
            deny: self.deny.clone(),
            max_passes: self.max_passes,
            fail_fast: self.fail_fast,
            backup_suffix: self.backup_suffix.clone(),
            backup_dir: self.backup_dir.clone(),
        }
    }
}

#[derive(Debug, clap::Args)]
struct ExplainArgs {
    /// Issue code (e.g., "unclosed_tag" or "unclosed-tag").
    code: String,
}

#[derive(Debug, clap::Args)]
struct ListChecksArgs {
    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn real_main() -> anyhow::Result<u8> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Fix(args) => cmd_fix(args),
        Command::Explain(args) => cmd_explain(args).map(|()| 0),
        Command::ListChecks(args) => cmd_list_checks(args).map(|()| 0),
    }
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<u8> {
    let config = config::load_or_default(&args.run.root)?;
    let settings = ConfigMerger::new(config).merge_check_args(&args.run.root, &args.run.overrides());
    execute(&settings)
}

fn cmd_fix(args: FixArgs) -> anyhow::Result<u8> {
    let config = config::load_or_default(&args.run.root)?;
    let settings = ConfigMerger::new(config).merge_fix_args(
        &args.run.root,
        &args.run.overrides(),
        &args.overrides(),
    );
    execute(&settings)
}

/// Run the pipeline, persist artifacts, and map the verdict to an exit code.
fn execute(settings: &RunSettings) -> anyhow::Result<u8> {
    debug!(?settings, "resolved settings");
    let source = FsDocumentSource::new(
        settings.root.clone(),
        settings.include.clone(),
        settings.exclude.clone(),
    );

    let outcome = match xhtmlfix_core::run(
        settings,
        &source,
        &FsDocumentStore,
        &CancelToken::new(),
        tool_info(),
    ) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            return Ok(e.exit_code());
        }
    };

    let out_dir = settings.resolved_out_dir();
    xhtmlfix_core::write_report_artifacts(
        &outcome,
        &out_dir,
        &FsWritePort,
        settings.max_issues_per_file,
    )
    .with_context(|| format!("write artifacts to {}", out_dir))?;

    print!("{}", render_console_summary(&outcome.report));
    print_artifacts(&out_dir, outcome.report.run.dry_run);
    Ok(outcome.report.exit_code())
}

fn print_artifacts(out_dir: &Utf8Path, dry_run: bool) {
    println!("report: {}", out_dir.join("report.json"));
    if dry_run {
        println!("patch:  {}", out_dir.join("patch.diff"));
    }
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "xhtmlfix".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    use explain::{list_check_codes, lookup_check, severity_meaning};

    let Some(check) = lookup_check(&args.code) else {
        let available = list_check_codes().join(", ");
        anyhow::bail!(
            "Unknown check: '{}'\n\nAvailable checks: {}",
            args.code,
            available
        );
    };

    println!("================================================================================");
    println!("CHECK: {}", check.title);
    println!("================================================================================");
    println!();
    println!("Code:      {}", check.code);
    match check.severity_note {
        Some(note) => println!("Severity:  {} ({})", check.severity, note),
        None => println!("Severity:  {}", check.severity),
    }
    println!(
        "Repair:    {}",
        if check.fixable { "automatic" } else { "manual" }
    );
    println!();

    println!("DESCRIPTION");
    println!("--------------------------------------------------------------------------------");
    println!("{}", check.description);
    println!();

    println!("SEVERITY: {}", check.severity.as_str().to_uppercase());
    println!("--------------------------------------------------------------------------------");
    println!("{}", severity_meaning(check.severity));
    println!();

    println!("AUTOMATIC REPAIR");
    println!("--------------------------------------------------------------------------------");
    println!("{}", check.repair);
    println!();

    println!("REMEDIATION GUIDANCE");
    println!("--------------------------------------------------------------------------------");
    println!("{}", check.remediation);
    println!();

    Ok(())
}

fn cmd_list_checks(args: ListChecksArgs) -> anyhow::Result<()> {
    use explain::CHECK_REGISTRY;

    match args.format {
        OutputFormat::Text => {
            println!("Available checks:\n");
            println!("  {:<24} {:<10} TITLE", "CODE", "SEVERITY");
            println!("  {:<24} {:<10} -----", "----", "--------");
            for check in CHECK_REGISTRY {
                println!(
                    "  {:<24} {:<10} {}",
                    check.code,
                    check.severity.as_str(),
                    check.title
                );
            }
            println!();
            println!("Use 'xhtmlfix explain <code>' for details.");
        }
        OutputFormat::Json => {
            let checks: Vec<_> = CHECK_REGISTRY
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "code": c.code,
                        "title": c.title,
                        "severity": c.severity,
                        "fixable": c.fixable,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&checks)?);
        }
    }
    Ok(())
}
