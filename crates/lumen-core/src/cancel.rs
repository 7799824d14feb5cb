//! Cooperative cancellation shared between the CLI and the pipeline stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::PipelineError;

/// A cloneable flag checked between units of work (images, pair rows,
/// pairs, handler calls). Never interrupts a fingerprint mid-computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` for `stage` if cancellation was requested.
    pub fn check(&self, stage: &str) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled {
                stage: stage.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check("scan").is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        let err = token.check("scan").unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { ref stage } if stage == "scan"));
    }
}
