//! Altar Pipeline
//!
//! Orchestrates altar creation: upload the photo, generate the altar image,
//! assemble the record, persist it locally.
//!
//! - [`AltarPipeline`]: the orchestrator and its observable state
//! - [`PipelineStage`]: stages and the legal transitions between them
//! - [`PipelineError`]: failures surfaced to callers
//!
//! # Example
//!
//! ```rust,ignore
//! use altar_pipeline::AltarPipeline;
//!
//! let mut pipeline = AltarPipeline::new(client, LocalStore::from_config(&config.storage))
//!     .with_retry_config(&config.retry);
//! pipeline.load_from_storage();
//! let record = pipeline.create_altar(request).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
mod guard;
pub mod pipeline;
pub mod state;

pub use error::PipelineError;
pub use pipeline::AltarPipeline;
pub use state::{allowed_transitions, validate_transition, PipelineStage, PipelineState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
