//! Run guard: marks the pipeline busy for the guard's lifetime

use crate::state::{PipelineStage, PipelineState};
use tokio::sync::watch;

/// Clears `is_running` when dropped, on every exit path of a run.
///
/// A run dropped mid-stage (a cancelled future) ends in `Failed`.
#[derive(Debug)]
pub(crate) struct RunGuard<'a> {
    state: &'a watch::Sender<PipelineState>,
}

impl<'a> RunGuard<'a> {
    /// Start a run: busy, back at `Idle` with zero progress, previous error
    /// and warning cleared
    pub(crate) fn start(state: &'a watch::Sender<PipelineState>) -> Self {
        state.send_modify(|s| {
            s.is_running = true;
            s.stage = PipelineStage::Idle;
            s.progress_percent = 0;
            s.last_error = None;
            s.warning = None;
        });
        Self { state }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            if !s.stage.is_terminal() && s.stage != PipelineStage::Idle {
                s.stage = PipelineStage::Failed;
            }
            s.is_running = false;
        });
    }
}
