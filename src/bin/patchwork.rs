//! `patchwork` CLI: parse a unified-diff patch and apply it to local files.
//! See `spec.md` §6 for the external contract this binary implements.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use patchwork::config::PatchworkConfig;
use patchwork::rewrite::{ApplyOptions, FileResult};
use patchwork::{diffstat, parser};

/// Exit codes per `spec.md` §6.
mod exit {
    pub const SUCCESS: u8 = 0;
    pub const APPLY_FAILURE: u8 = 1;
    pub const UNREADABLE_INPUT: u8 = 2;
    pub const PERMISSION: u8 = 3;
    #[allow(dead_code)]
    pub const URL_FETCH_FAILURE: u8 = 4;
    pub const ARGUMENT_ERROR: u8 = 5;
}

#[derive(Parser, Debug)]
#[command(
    name = "patchwork",
    about = "Parse and apply unified-diff patches",
    version
)]
struct Cli {
    /// Patch source: a file path, or `-` to read from stdin. Downloading a
    /// URL is out of scope for the core (`spec.md` §1); pipe already-fetched
    /// bytes in via stdin instead.
    source: String,

    /// Remove N leading path components from each target filename.
    #[arg(short = 'p', long = "strip", value_name = "N")]
    strip: Option<usize>,

    /// Resolve target filenames relative to this directory instead of the
    /// working directory.
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Match and render but do not write any files.
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Apply the patch in reverse, undoing a prior forward apply.
    #[arg(long)]
    revert: bool,

    /// Print the added/removed histogram instead of applying.
    #[arg(long)]
    diffstat: bool,

    /// Maximum position-offset search window for the hunk matcher.
    #[arg(long, default_value_t = 0)]
    fuzz: usize,

    /// Permit a target filename that is absolute after stripping (a
    /// security error by default).
    #[arg(long = "root-unsafe")]
    root_unsafe: bool,
}

fn main() -> ExitCode {
    patchwork::logging::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap prints its own message for --help/--version; only those
            // exit 0, every other parse failure is `spec.md`'s argument error.
            let code = if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion
            {
                e.print().ok();
                exit::SUCCESS
            } else {
                eprintln!("{e}");
                exit::ARGUMENT_ERROR
            };
            return ExitCode::from(code);
        }
    };

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            ExitCode::from(exit::UNREADABLE_INPUT)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let bytes = match read_patch_bytes(&cli.source) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            let permission_denied = e
                .downcast_ref::<io::Error>()
                .is_some_and(|io_err| io_err.kind() == io::ErrorKind::PermissionDenied);
            return Ok(if permission_denied {
                exit::PERMISSION
            } else {
                exit::UNREADABLE_INPUT
            });
        }
    };

    let set = parser::parse(&bytes);
    if set.errors() > 0 {
        eprintln!(
            "{}: {} file patch(es) dropped due to parse errors",
            "warning".yellow().bold(),
            set.errors()
        );
    }
    if set.warnings() > 0 {
        tracing::info!(warnings = set.warnings(), "patch parsed with recoverable anomalies");
    }
    if set.is_empty() {
        eprintln!("{}: no applicable file patches found in input", "error".red().bold());
        return Ok(exit::APPLY_FAILURE);
    }

    if cli.diffstat {
        let stat = diffstat::compute(&set);
        print!("{}", stat.render());
        return Ok(exit::SUCCESS);
    }

    let directory = match cli.directory {
        Some(d) => d,
        None => std::env::current_dir().context("resolving the working directory")?,
    };
    let config = PatchworkConfig::load_or_default(&directory);

    let opts = ApplyOptions {
        strip: cli.strip.or(config.strip).unwrap_or(0),
        root: config.root.unwrap_or(directory),
        dry_run: cli.dry_run,
        fuzz: if cli.fuzz != 0 { cli.fuzz } else { config.fuzz.unwrap_or(0) },
        allow_absolute: cli.root_unsafe,
    };

    let summary = if cli.revert {
        patchwork::revert_patchset(&set, &opts)
    } else {
        patchwork::apply_patchset(&set, &opts)
    };

    report(&summary);

    Ok(if summary.success() {
        exit::SUCCESS
    } else {
        exit::APPLY_FAILURE
    })
}

fn read_patch_bytes(source: &str) -> anyhow::Result<Vec<u8>> {
    if source == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("reading patch from stdin")?;
        Ok(buf)
    } else {
        std::fs::read(source).with_context(|| format!("reading patch file '{source}'"))
    }
}

fn report(summary: &patchwork::ApplySummary) {
    for file in &summary.files {
        let name = String::from_utf8_lossy(&file.filename);
        match &file.result {
            FileResult::Applied(r) if r.already_applied => {
                println!("{} {} (already applied)", "=".cyan(), name);
            }
            FileResult::Applied(r) => {
                println!("{} {}", "patching".green(), r.path.display());
            }
            FileResult::Skipped => {
                println!(
                    "{} {} (create/delete/rename not executed by the core)",
                    "skipped".yellow(),
                    name
                );
            }
            FileResult::Failed(e) => {
                eprintln!("{} {}: {}", "failed".red().bold(), name, e);
            }
        }
    }
}
