//! Altar creation orchestrator
//!
//! Sequences upload -> generate -> assemble -> persist and keeps the
//! observable [`PipelineState`] current. Remote steps go through the retry
//! controller; a local save failure after both remote steps succeeded is
//! downgraded to a warning so the generated altar is never lost.

use crate::error::PipelineError;
use crate::guard::RunGuard;
use crate::state::{validate_transition, PipelineStage, PipelineState};
use altar_core::messages;
use altar_core::{
    retry, AltarId, AltarRecord, ClassifiedError, CreateAltarRequest, GenerateAltarRequest,
    RemoteOperation, RetryConfig, RetryPolicy,
};
use altar_remote::AltarService;
use altar_store::{KeyValueStorage, LocalStore};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// The creation pipeline and its state.
///
/// Mutating operations take `&mut self`; one value runs one creation at a time.
#[derive(Debug)]
pub struct AltarPipeline<R, S> {
    service: R,
    store: LocalStore<S>,
    upload_policy: RetryPolicy,
    generation_policy: RetryPolicy,
    state: watch::Sender<PipelineState>,
}

impl<R: AltarService, S: KeyValueStorage> AltarPipeline<R, S> {
    /// Pipeline with the default retry policies
    #[must_use]
    pub fn new(service: R, store: LocalStore<S>) -> Self {
        let (state, _) = watch::channel(PipelineState::default());
        Self {
            service,
            store,
            upload_policy: RetryPolicy::for_operation(RemoteOperation::UploadPhoto),
            generation_policy: RetryPolicy::for_operation(RemoteOperation::GenerateAltar),
            state,
        }
    }

    /// Retry policies from configuration
    #[must_use]
    pub fn with_retry_config(self, retry: &RetryConfig) -> Self {
        self.with_policies(
            retry.policy_for(RemoteOperation::UploadPhoto),
            retry.policy_for(RemoteOperation::GenerateAltar),
        )
    }

    #[must_use]
    pub fn with_policies(mut self, upload: RetryPolicy, generation: RetryPolicy) -> Self {
        self.upload_policy = upload;
        self.generation_policy = generation;
        self
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Receiver observing every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &LocalStore<S> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn service(&self) -> &R {
        &self.service
    }

    /// Run upload, generation and persistence for `request`.
    ///
    /// Returns the new record. A local save failure still returns `Ok`, with
    /// the record added to the in-memory collection and a warning in state.
    pub async fn create_altar(
        &mut self,
        request: CreateAltarRequest,
    ) -> Result<AltarRecord, PipelineError> {
        let _guard = RunGuard::start(&self.state);
        info!(
            file = %request.photo.file_name,
            bytes = request.photo.len(),
            "creating altar"
        );

        self.advance(PipelineStage::Uploading)?;
        let uploaded = retry(RemoteOperation::UploadPhoto, &self.upload_policy, || {
            self.service.upload_photo(&request.photo)
        })
        .await
        .map_err(|e| self.fail(PipelineStage::Uploading, messages::UPLOAD_STAGE_PREFIX, e))?;
        debug!(s3_key = %uploaded.s3_key, "photo uploaded");

        self.advance(PipelineStage::Generating)?;
        let generate_request = GenerateAltarRequest {
            photo_s3_key: uploaded.s3_key.clone(),
            food_description: request.food_description.clone(),
        };
        let generated = retry(RemoteOperation::GenerateAltar, &self.generation_policy, || {
            self.service.generate_altar(&generate_request)
        })
        .await
        .map_err(|e| self.fail(PipelineStage::Generating, messages::GENERATION_STAGE_PREFIX, e))?;
        debug!(s3_key = %generated.altar_image_s3_key, "altar generated");

        self.advance(PipelineStage::Assembling)?;
        let record = AltarRecord::assemble(uploaded, generated, request.food_description);

        self.advance(PipelineStage::Persisting)?;
        let saved = self.store.save(record.clone());
        self.state.send_modify(|s| {
            s.altars.retain(|r| r.id() != record.id());
            s.altars.push(record.clone());
            s.current = Some(record.clone());
        });
        if let Err(e) = saved {
            warn!(id = %record.id(), code = %e.code(), error = %e, "altar created but not saved locally");
            let warning = format!("{}: {}", messages::SAVED_WITHOUT_PERSISTENCE, e.message());
            self.state.send_modify(|s| s.warning = Some(warning));
        }

        self.advance(PipelineStage::Done)?;
        info!(id = %record.id(), "altar created");
        Ok(record)
    }

    /// Replace the in-memory collection with the stored one.
    ///
    /// A store failure leaves an empty collection and records the error in
    /// state; it is not returned.
    pub fn load_from_storage(&mut self) {
        match self.store.get_all() {
            Ok(altars) => {
                debug!(count = altars.len(), "altars loaded");
                self.state.send_modify(|s| {
                    s.altars = altars;
                    s.last_error = None;
                });
            }
            Err(e) => {
                warn!(code = %e.code(), error = %e, "failed to load altars");
                let message = format!("{}: {}", messages::LOAD_FAILED_PREFIX, e.message());
                self.state.send_modify(|s| {
                    s.altars.clear();
                    s.last_error = Some(message);
                });
            }
        }
    }

    /// Delete `id` from the store and the in-memory collection
    pub fn delete_altar(&mut self, id: &AltarId) -> Result<(), PipelineError> {
        if let Err(e) = self.store.delete(id) {
            error!(%id, code = %e.code(), error = %e, "failed to delete altar");
            let message = format!("{}: {}", messages::DELETE_FAILED_PREFIX, e.message());
            self.state.send_modify(|s| s.last_error = Some(message.clone()));
            return Err(PipelineError::Store { message, source: e });
        }

        self.state.send_modify(|s| {
            s.altars.retain(|r| r.id() != id);
            if s.current.as_ref().is_some_and(|r| r.id() == id) {
                s.current = None;
            }
            s.last_error = None;
        });
        Ok(())
    }

    pub fn set_current(&mut self, record: Option<AltarRecord>) {
        self.state.send_modify(|s| s.current = record);
    }

    pub fn clear_error(&mut self) {
        self.state.send_modify(|s| s.last_error = None);
    }

    /// In-memory records, newest first
    #[must_use]
    pub fn sorted_altars(&self) -> Vec<AltarRecord> {
        self.state.borrow().sorted_altars()
    }

    #[must_use]
    pub fn has_altars(&self) -> bool {
        self.state.borrow().has_altars()
    }

    fn advance(&self, to: PipelineStage) -> Result<(), PipelineError> {
        let from = self.state.borrow().stage;
        validate_transition(from, to)?;
        self.state.send_modify(|s| {
            s.stage = to;
            if let Some(percent) = to.progress_percent() {
                s.progress_percent = percent;
            }
        });
        debug!(%from, %to, "pipeline stage");
        Ok(())
    }

    fn fail(&self, stage: PipelineStage, prefix: &str, source: ClassifiedError) -> PipelineError {
        let message = format!("{prefix}: {}", source.message());
        error!(%stage, code = %source.code(), status = ?source.status(), "{message}");
        if let Err(e) = self.advance(PipelineStage::Failed) {
            return e;
        }
        self.state.send_modify(|s| s.last_error = Some(message.clone()));
        PipelineError::Remote {
            stage,
            message,
            source,
        }
    }
}
