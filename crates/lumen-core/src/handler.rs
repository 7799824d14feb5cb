//! Actions taken on the losing file of each decision.

use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::config::HandlerAction;
use crate::error::PipelineError;
use crate::types::Decision;

/// Acts on one confirmed duplicate.
pub trait DuplicateHandler: Send + Sync {
    fn handle(&self, keep: &Path, delete: &Path) -> Result<(), PipelineError>;
}

/// Leaves both files untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl DuplicateHandler for NoopHandler {
    fn handle(&self, _keep: &Path, _delete: &Path) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Removes the duplicate from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteHandler;

impl DuplicateHandler for DeleteHandler {
    fn handle(&self, keep: &Path, delete: &Path) -> Result<(), PipelineError> {
        tracing::info!("Deleting {}", delete.display());
        std::fs::remove_file(delete).map_err(|e| handler_error(keep, delete, e))
    }
}

/// Moves the duplicate next to the kept file as `<stem> delete (<n>).<ext>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameHandler;

impl RenameHandler {
    /// First `<keep stem> delete (n)<keep ext>` in the kept file's folder that
    /// does not exist yet, starting at `n = 1`.
    pub fn target_for(keep: &Path) -> PathBuf {
        let parent = keep.parent().unwrap_or_else(|| Path::new(""));
        let stem = keep
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = keep
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut n = 1u32;
        loop {
            let candidate = parent.join(format!("{stem} delete ({n}){ext}"));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl DuplicateHandler for RenameHandler {
    fn handle(&self, keep: &Path, delete: &Path) -> Result<(), PipelineError> {
        let target = Self::target_for(keep);
        tracing::info!("Moving {} to {}", delete.display(), target.display());

        if std::fs::rename(delete, &target).is_err() {
            // Rename cannot cross filesystems; fall back to copy + remove.
            move_by_copy(delete, &target, |p| std::fs::remove_file(p))
                .map_err(|e| handler_error(keep, delete, e))?;
        }
        Ok(())
    }
}

/// Copy `from` to `to`, then remove `from`. A failure at either step
/// removes `to` again so no partial copy is left beside the kept file.
fn move_by_copy(
    from: &Path,
    to: &Path,
    remove: impl FnOnce(&Path) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let result = std::fs::copy(from, to).and_then(|_| remove(from));
    if result.is_err() {
        let _ = std::fs::remove_file(to);
    }
    result
}

fn handler_error(keep: &Path, delete: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::Handler {
        keep: keep.to_path_buf(),
        delete: delete.to_path_buf(),
        message: err.to_string(),
    }
}

/// Build the handler for a configured action.
pub fn handler_for(action: HandlerAction) -> Box<dyn DuplicateHandler> {
    match action {
        HandlerAction::Noop => Box::new(NoopHandler),
        HandlerAction::Rename => Box::new(RenameHandler),
        HandlerAction::Delete => Box::new(DeleteHandler),
    }
}

/// Outcome of applying a decision list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerStats {
    pub handled: usize,
    pub failed: usize,
    /// Decisions not attempted because the run was cancelled
    pub skipped: usize,
}

/// Invoke `handler` once per decision, in order.
///
/// A failure is logged and counted; it never stops later decisions.
/// Cancellation stops before the next decision.
pub fn apply_decisions(
    decisions: &[Decision],
    handler: &dyn DuplicateHandler,
    cancel: &CancelToken,
) -> HandlerStats {
    let mut stats = HandlerStats::default();
    for (i, decision) in decisions.iter().enumerate() {
        if cancel.is_cancelled() {
            stats.skipped = decisions.len() - i;
            tracing::warn!("Cancelled; {} decision(s) not applied", stats.skipped);
            break;
        }
        match handler.handle(&decision.keep, &decision.delete) {
            Ok(()) => stats.handled += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::error!("{}", e);
            }
        }
    }
    stats
}
