use wasui_core::mutation::MutationError;
use wasui_core::snapshot::SnapshotError;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::forms::FormError;
use crate::submit::SubmitError;

/// Runtime error type for the site crate.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("form invalid: {0}")]
    Form(#[from] FormError),

    #[error("content lock poisoned")]
    LockPoisoned,
}

impl SiteError {
    /// Whether the user should be offered a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SiteError::Submit(e) => e.is_retryable(),
            SiteError::Cache(_) => true,
            _ => false,
        }
    }
}

/// Convenience type alias for runtime operations.
pub type SiteResult<T> = Result<T, SiteError>;
