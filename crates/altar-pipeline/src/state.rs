//! Pipeline stages and observable state

use crate::error::PipelineError;
use altar_core::AltarRecord;
use std::fmt;

/// Stage of a creation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineStage {
    #[default]
    Idle,
    Uploading,
    Generating,
    Assembling,
    Persisting,
    Done,
    Failed,
}

impl PipelineStage {
    /// Progress reported on entering the stage; `None` keeps the current value
    #[must_use]
    pub fn progress_percent(self) -> Option<u8> {
        match self {
            Self::Idle => Some(0),
            Self::Uploading => Some(25),
            Self::Generating => Some(50),
            Self::Assembling | Self::Persisting => Some(75),
            Self::Done => Some(100),
            Self::Failed => None,
        }
    }

    /// Done and Failed end a run
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Generating => "generating",
            Self::Assembling => "assembling",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stages reachable from `from`.
///
/// A new run may start from Idle or from either terminal stage.
#[must_use]
pub fn allowed_transitions(from: PipelineStage) -> Vec<PipelineStage> {
    use PipelineStage::*;
    match from {
        Idle | Done | Failed => vec![Uploading],
        Uploading => vec![Generating, Failed],
        Generating => vec![Assembling, Failed],
        Assembling => vec![Persisting, Failed],
        Persisting => vec![Done, Failed],
    }
}

/// Validates a stage transition.
pub fn validate_transition(from: PipelineStage, to: PipelineStage) -> Result<(), PipelineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PipelineError::IllegalTransition { from, to })
    }
}

/// State observed by callers of the pipeline.
///
/// Run fields (`is_running`, `progress_percent`, `stage`, `last_error`,
/// `warning`) are reset at the start of every run; `altars` and `current`
/// carry across runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineState {
    pub is_running: bool,
    pub progress_percent: u8,
    pub stage: PipelineStage,
    pub last_error: Option<String>,
    /// Non-fatal problem of a run that still succeeded
    pub warning: Option<String>,
    /// In-memory copy of the local collection
    pub altars: Vec<AltarRecord>,
    /// Most recently created or viewed record
    pub current: Option<AltarRecord>,
}

impl PipelineState {
    /// Newest first, without touching the stored order
    #[must_use]
    pub fn sorted_altars(&self) -> Vec<AltarRecord> {
        let mut altars = self.altars.clone();
        altars.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        altars
    }

    #[inline]
    #[must_use]
    pub fn has_altars(&self) -> bool {
        !self.altars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineStage::*;

    const ALL: [PipelineStage; 7] = [Idle, Uploading, Generating, Assembling, Persisting, Done, Failed];

    #[test]
    fn happy_path_is_legal() {
        let path = [Idle, Uploading, Generating, Assembling, Persisting, Done];
        for pair in path.windows(2) {
            assert!(validate_transition(pair[0], pair[1]).is_ok(), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn failed_reachable_from_every_working_stage() {
        for stage in [Uploading, Generating, Assembling, Persisting] {
            assert!(validate_transition(stage, Failed).is_ok());
        }
        assert!(validate_transition(Idle, Failed).is_err());
    }

    #[test]
    fn no_skipping_or_going_back() {
        assert!(matches!(
            validate_transition(Uploading, Persisting),
            Err(PipelineError::IllegalTransition { from: Uploading, to: Persisting })
        ));
        assert!(validate_transition(Generating, Uploading).is_err());
        assert!(validate_transition(Done, Persisting).is_err());
    }

    #[test]
    fn terminal_stages_only_restart() {
        for stage in ALL.into_iter().filter(|s| s.is_terminal()) {
            assert_eq!(allowed_transitions(stage), vec![Uploading]);
        }
    }

    #[test]
    fn progress_is_monotonic_along_the_happy_path() {
        let percents: Vec<u8> = [Idle, Uploading, Generating, Assembling, Persisting, Done]
            .into_iter()
            .filter_map(PipelineStage::progress_percent)
            .collect();
        assert_eq!(percents, [0, 25, 50, 75, 75, 100]);
        assert_eq!(Failed.progress_percent(), None);
    }
}
