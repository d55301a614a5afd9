use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use hashcalc::config::Settings;
use hashcalc::hash::{BatchEvent, BatchOutcome, HashAlgorithm, InputEntry, LocalFileSystem, MatchState};
use hashcalc::logging;
use hashcalc::workspace::Workspace;

#[derive(Parser, Debug)]
#[command(name = "hashcalc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hash files and compare them against a list of known hashes")]
struct Cli {
    /// Files or directories to hash (directories are walked recursively)
    #[arg(value_name = "PATHS", required_unless_present = "list_algorithms")]
    paths: Vec<String>,

    /// Hash algorithm: MD5, SHA1, SHA256 or SHA512
    #[arg(short, long, value_name = "NAME")]
    algorithm: Option<String>,

    /// Known hashes file, one `HASH *path` per line
    #[arg(short, long, value_name = "FILE")]
    known: Option<PathBuf>,

    /// Match known hashes by full path instead of file name
    #[arg(long)]
    full_path: bool,

    /// Write the results as a checksum file
    #[arg(short, long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List supported algorithms and exit
    #[arg(long)]
    list_algorithms: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&config_path)
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;

    let level = match cli.verbose {
        0 => settings.logging.level.as_str(),
        1 => "info",
        _ => "debug",
    };
    logging::init(level);

    if cli.list_algorithms {
        for algorithm in HashAlgorithm::ALL {
            let marker = if algorithm == settings.hashing.algorithm { " (default)" } else { "" };
            println!("{:<7} {}-bit{}", algorithm.name(), algorithm.output_bits(), marker);
        }
        return Ok(());
    }

    let mut workspace = Workspace::from_settings(Arc::new(LocalFileSystem), &settings);
    if let Some(name) = &cli.algorithm {
        workspace.set_algorithm_name(name);
    }
    if cli.full_path {
        workspace.list_mut().set_match_full_path(true);
    }
    if let Some(known) = &cli.known {
        let text = std::fs::read_to_string(known)
            .with_context(|| format!("Failed to read known hashes from {}", known.display()))?;
        workspace.list_mut().set_known_hashes_text(&text);
    }

    workspace
        .list_mut()
        .add_paths(&cli.paths)
        .context("Failed to collect input files")?;

    if workspace.list().is_empty() {
        bail!("No files to hash");
    }

    let total = workspace.list().len() as u64;
    let pb = ProgressBar::new(total * 100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );
    if cli.json {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    workspace.begin_calculation()?;
    let mut current = 0u64;
    let summary = workspace.wait(|_, event| match event {
        BatchEvent::FileStarted { index, label, .. } => {
            current = *index as u64;
            pb.set_position(current * 100);
            pb.set_message(label.clone());
        }
        BatchEvent::FileProgress { progress, .. } => {
            pb.set_position(current * 100 + u64::from(progress.percentage));
        }
        _ => {}
    })?;
    pb.finish_and_clear();

    let Some(summary) = summary else {
        bail!("Batch did not report a result");
    };

    if let BatchOutcome::InvalidAlgorithm { name } = &summary.outcome {
        bail!(
            "Invalid hash algorithm: {} (expected one of {})",
            name,
            HashAlgorithm::ALL
                .iter()
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if cli.json {
        let report = serde_json::json!({
            "algorithm": workspace.algorithm_name(),
            "summary": summary,
            "entries": workspace.list().entries(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let show_state = !workspace.list().registry().is_empty();
        for entry in workspace.list().entries() {
            println!("{}", render_entry(entry, show_state));
        }
        eprintln!(
            "{} files hashed with {} in {:.2}s ({} failed)",
            summary.attempted,
            workspace.algorithm_name(),
            summary.elapsed.as_secs_f64(),
            summary.failed
        );
    }

    if let Some(export) = &cli.export {
        workspace
            .export(export)
            .with_context(|| format!("Failed to export to {}", export.display()))?;
    }

    Ok(())
}

fn render_entry(entry: &InputEntry, show_state: bool) -> String {
    let hash = if entry.calculated_hash.is_empty() {
        "-".dimmed().to_string()
    } else {
        entry.calculated_hash.clone()
    };
    let line = format!("{} *{}", hash, entry.file_path);

    if !entry.file_exists {
        return format!("{} {}", line, "(missing)".red());
    }
    if !show_state {
        return line;
    }

    match entry.match_state() {
        MatchState::Success => format!("{} {}", line.green(), "OK".green().bold()),
        MatchState::Error => format!("{} {}", line.red(), "MISMATCH".red().bold()),
        MatchState::Indeterminate => format!("{} {}", line.yellow(), "RENAMED?".yellow()),
        MatchState::Default => format!("{} {}", line, "UNKNOWN".dimmed()),
    }
}
