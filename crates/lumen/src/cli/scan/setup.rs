//! Scan setup: merge command-line flags into the loaded config.

use lumen_core::config::expand_path;
use lumen_core::Config;

use super::ScanArgs;

/// Apply flag overrides to `config` and check the result is runnable.
pub fn build_config(mut config: Config, args: &ScanArgs) -> anyhow::Result<Config> {
    if let Some(threshold) = args.threshold {
        config.similarity.threshold = threshold;
    }
    if let Some(tolerance) = args.color_tolerance {
        config.similarity.color_tolerance = tolerance;
    }
    if let Some(action) = args.action {
        config.handler.action = action.into();
    }
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if args.pretty {
        config.output.pretty = true;
    }

    config
        .folders
        .protected
        .extend(args.protected.iter().map(|p| expand_path(p)));
    config
        .folders
        .candidates
        .extend(args.candidates.iter().map(|p| expand_path(p)));

    config.validate()?;

    if config.folders.candidates.is_empty() {
        anyhow::bail!(
            "No candidate folders given.\n\n  \
             Hint: pass --candidates DIR, or set [folders] candidates in the config file."
        );
    }
    for folder in config.protected_folders().iter().chain(&config.candidate_folders()) {
        if !folder.exists() {
            anyhow::bail!("Folder does not exist: {}", folder.display());
        }
    }

    Ok(config)
}
