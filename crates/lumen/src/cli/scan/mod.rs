//! The `lumen scan` command: fingerprint, score, resolve, act.

mod setup;
pub mod types;

pub use types::{Action, OutputFormat};

use clap::Args;
use dialoguer::Confirm;
use indicatif::ProgressBar;
use lumen_core::{
    apply_decisions, folder_summary, generate_scored_pairs, handler_for, CancelToken, Config,
    Decision, DecisionWriter, DiscoveredFile, FingerprintBatch, HandlerAction, HandlerStats,
    ImageProcessor, Resolver, Role, ScanStats,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use setup::build_config;

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Folder whose images are never removed (repeatable)
    #[arg(short, long = "protected", value_name = "DIR")]
    pub protected: Vec<PathBuf>,

    /// Folder whose images may be removed (repeatable)
    #[arg(short, long = "candidates", value_name = "DIR")]
    pub candidates: Vec<PathBuf>,

    /// Minimum SSIM for a pair to count as a duplicate
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Largest allowed per-channel difference of average colour
    #[arg(long)]
    pub color_tolerance: Option<f64>,

    /// What to do with each duplicate
    #[arg(short, long, value_enum)]
    pub action: Option<Action>,

    /// Number of images fingerprinted concurrently
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Output format for the decision list
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Apply rename/delete without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the scan command.
pub async fn execute(args: ScanArgs, config: Config) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = build_config(config, &args)?;
    let cancel = CancelToken::new();
    watch_ctrl_c(cancel.clone());

    let processor = ImageProcessor::new(&config);
    let inputs = processor.discover(&config.protected_folders(), &config.candidate_folders());
    if inputs.candidates.is_empty() {
        tracing::warn!("No candidate images found");
        return Ok(());
    }
    tracing::info!(
        "Found {} protected and {} candidate image(s)",
        inputs.protected.len(),
        inputs.candidates.len()
    );

    let mut stats = ScanStats {
        discovered: inputs.protected.len() + inputs.candidates.len(),
        discovered_bytes: inputs.total_bytes(),
        ..ScanStats::default()
    };

    let protected =
        fingerprint_with_progress(&processor, &inputs.protected, Role::Protected, &cancel).await?;
    let candidates =
        fingerprint_with_progress(&processor, &inputs.candidates, Role::Candidate, &cancel)
            .await?;
    stats.fingerprinted = protected.fingerprints.len() + candidates.fingerprints.len();
    stats.failed = protected.failed + candidates.failed;

    let spinner = create_spinner("Scoring pairs...");
    let threshold = config.similarity.threshold;
    let pair_cancel = cancel.clone();
    let pairs = tokio::task::spawn_blocking(move || {
        generate_scored_pairs(
            &protected.fingerprints,
            &candidates.fingerprints,
            threshold,
            &pair_cancel,
        )
    })
    .await??;
    spinner.finish_and_clear();
    stats.pairs_above_threshold = pairs.len();
    tracing::info!("{} pair(s) at or above SSIM {}", pairs.len(), threshold);

    let color_tolerance = config.similarity.color_tolerance;
    let resolve_cancel = cancel.clone();
    let resolution = tokio::task::spawn_blocking(move || {
        Resolver::new(color_tolerance).resolve(&pairs, &resolve_cancel)
    })
    .await??;
    stats.decisions = resolution.decisions.len();

    write_decisions(&config, args.output.as_deref(), &resolution.decisions)?;
    eprint!("{}", folder_summary(&resolution.keeps_per_folder));

    let action = config.handler.action;
    if action.is_destructive() && !resolution.decisions.is_empty() {
        if args.yes || confirm_action(action, resolution.decisions.len())? {
            let handler_stats = run_handler(action, resolution.decisions, cancel).await?;
            stats.handled = handler_stats.handled;
            stats.handler_failures = handler_stats.failed;
        } else {
            tracing::info!("Aborted; no files were changed");
        }
    }

    stats.total_seconds = start.elapsed().as_secs_f64();
    tracing::debug!("Scan stats: {}", serde_json::to_string(&stats)?);
    print_summary(&stats, action, start.elapsed());
    Ok(())
}

/// Trip `cancel` on the first Ctrl-C.
fn watch_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping after the current step");
            cancel.cancel();
        }
    });
}

async fn fingerprint_with_progress(
    processor: &ImageProcessor,
    files: &[DiscoveredFile],
    role: Role,
    cancel: &CancelToken,
) -> anyhow::Result<FingerprintBatch> {
    if files.is_empty() {
        return Ok(FingerprintBatch::default());
    }

    let progress = create_progress_bar(files.len() as u64, role);
    let start_time = Instant::now();
    let batch = processor
        .fingerprint_all(files, role, cancel, |_, _| {
            progress.inc(1);
            let elapsed = start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                progress.set_message(format!("{:.1} img/sec", progress.position() as f64 / elapsed));
            }
        })
        .await;
    progress.finish_and_clear();
    Ok(batch?)
}

fn write_decisions(
    config: &Config,
    output: Option<&Path>,
    decisions: &[Decision],
) -> anyhow::Result<()> {
    let format = config.output.format;
    let pretty = config.output.pretty;

    match output {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = DecisionWriter::new(BufWriter::new(file), format, pretty);
            writer.write_all(decisions)?;
            writer.flush()?;
            tracing::info!("Decisions written to {:?}", path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = DecisionWriter::new(stdout.lock(), format, pretty);
            writer.write_all(decisions)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Ask before touching files. Interrupting the prompt counts as "no".
fn confirm_action(action: HandlerAction, count: usize) -> anyhow::Result<bool> {
    let prompt = match action {
        HandlerAction::Delete => format!("Delete {count} duplicate file(s)?"),
        _ => format!("Move {count} duplicate file(s) next to the kept copies?"),
    };
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact_opt()?;
    Ok(matches!(answer, Some(true)))
}

async fn run_handler(
    action: HandlerAction,
    decisions: Vec<Decision>,
    cancel: CancelToken,
) -> anyhow::Result<HandlerStats> {
    let handler = handler_for(action);
    let stats =
        tokio::task::spawn_blocking(move || apply_decisions(&decisions, handler.as_ref(), &cancel))
            .await?;
    if stats.failed > 0 {
        tracing::warn!("{} file(s) could not be handled", stats.failed);
    }
    Ok(stats)
}

fn create_progress_bar(total: u64, role: Role) -> ProgressBar {
    use indicatif::ProgressStyle;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {prefix:>9} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_prefix(role.to_string());
    pb.set_message("starting...");
    pb
}

fn create_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Print a formatted summary table after a scan.
fn print_summary(stats: &ScanStats, action: HandlerAction, elapsed: Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!(
        "    Images:       {:>8} ({:.1} MB)",
        stats.discovered,
        stats.discovered_bytes as f64 / (1024.0 * 1024.0)
    );
    eprintln!("    Fingerprinted:{:>8}", stats.fingerprinted);
    if stats.failed > 0 {
        eprintln!("    Unreadable:   {:>8}", stats.failed);
    }
    eprintln!("    Pairs:        {:>8}", stats.pairs_above_threshold);
    eprintln!("    Duplicates:   {:>8}", stats.decisions);
    if action.is_destructive() {
        eprintln!("    Handled ({}): {:>6}", action, stats.handled);
        if stats.handler_failures > 0 {
            eprintln!("    Failed:       {:>8}", stats.handler_failures);
        }
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}
