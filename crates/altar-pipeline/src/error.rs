//! Pipeline errors

use crate::state::PipelineStage;
use altar_core::{ClassifiedError, ErrorCode};
use altar_store::StoreError;

/// Errors surfaced by the pipeline
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    /// A remote step failed after retries; `message` carries the stage prefix
    #[error("{message}")]
    Remote {
        stage: PipelineStage,
        message: String,
        #[source]
        source: ClassifiedError,
    },

    /// A local store operation outside of creation failed
    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: StoreError,
    },

    #[error("illegal pipeline transition: {from} -> {to}")]
    IllegalTransition {
        from: PipelineStage,
        to: PipelineStage,
    },
}

impl PipelineError {
    /// Remote-domain code, when the failure came from a remote step
    #[must_use]
    pub fn remote_code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Remote { source, .. } => Some(source.code()),
            _ => None,
        }
    }

    /// Whether re-running the whole pipeline may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote { source, .. } => source.is_retryable(),
            Self::Store { .. } | Self::IllegalTransition { .. } => false,
        }
    }
}
