use anyhow::{Context, bail};
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use groovy_imports::config::Config;
use groovy_imports::files::discover_files;
use groovy_imports::{TrimResult, UnusedImportTrimmer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Groovy files or directories to process (reads stdin when omitted)
    paths: Vec<PathBuf>,

    /// Report files that would change instead of rewriting them
    #[arg(long)]
    check: bool,

    /// Import path, or `prefix.*` pattern, to keep even when unused
    #[arg(long, value_name = "PATH")]
    preserve: Vec<String>,

    /// Increase verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let log_level = match cli.verbose {
        0 => "warn",  // Default: warnings and errors only
        1 => "info",  // -v: informational messages
        2 => "debug", // -vv: debug messages
        _ => "trace", // -vvv or more: trace messages
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    debug!(
        "Verbosity level: {} (log level: {})",
        cli.verbose, log_level
    );

    let mut config = Config::load(cli.config.as_deref())?;
    config.preserve.extend(cli.preserve);
    debug!("Configuration: {:?}", config);

    let trimmer = UnusedImportTrimmer::new(config.trim_config());

    if cli.paths.is_empty() {
        return run_stdin(&trimmer, cli.check);
    }

    let files = discover_files(&cli.paths, &config)?;
    info!("Processing {} file(s)", files.len());

    let mut changed = 0usize;
    let mut failed = 0usize;
    for path in &files {
        match process_file(&trimmer, path, cli.check) {
            Ok(true) => changed += 1,
            Ok(false) => {}
            Err(err) => {
                error!("{}: {err:#}", path.display());
                failed += 1;
            }
        }
    }

    if cli.check {
        info!("{changed} of {} file(s) would change", files.len());
    } else {
        info!("Rewrote {changed} of {} file(s)", files.len());
    }
    if failed > 0 {
        bail!("{failed} file(s) could not be processed");
    }
    Ok(if cli.check && changed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_stdin(trimmer: &UnusedImportTrimmer, check: bool) -> anyhow::Result<ExitCode> {
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read stdin")?;
    let result = trimmer
        .trim_bytes(&input)
        .context("Failed to process stdin")?;
    report(Path::new("<stdin>"), &result);

    if check {
        return Ok(if result.has_changes {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }
    io::stdout()
        .write_all(result.code.as_bytes())
        .context("Failed to write stdout")?;
    Ok(ExitCode::SUCCESS)
}

/// Trim one file. Returns whether it changed (or would change).
fn process_file(
    trimmer: &UnusedImportTrimmer,
    path: &Path,
    check: bool,
) -> anyhow::Result<bool> {
    let bytes = fs::read(path).context("Failed to read file")?;
    let result = trimmer.trim_bytes(&bytes).context("Skipping file")?;
    report(path, &result);

    if !result.has_changes {
        return Ok(false);
    }
    if check {
        println!("{}", path.display());
    } else {
        fs::write(path, &result.code).context("Failed to write file")?;
    }
    Ok(true)
}

fn report(path: &Path, result: &TrimResult) {
    for diagnostic in &result.diagnostics {
        warn!("{}: left unchanged: {diagnostic}", path.display());
    }
    for import in &result.removed_imports {
        info!("{}:{}: unused {import}", path.display(), import.span);
    }
}
