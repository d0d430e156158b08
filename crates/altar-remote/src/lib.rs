//! Altar Remote
//!
//! Client for the two remote operations of the pipeline:
//! - photo upload (multipart)
//! - AI altar generation (JSON)
//!
//! Every call is gated on connectivity, raced against a fixed timeout, and has
//! its response validated. Failures come back as
//! [`ClassifiedError`](altar_core::ClassifiedError); no retry happens here.
//!
//! # Example
//!
//! ```rust,ignore
//! use altar_remote::{AltarService, RemoteClient, ReqwestTransport, AlwaysOnline};
//!
//! let transport = ReqwestTransport::new(&config.api.base_url)?;
//! let client = RemoteClient::new(transport, AlwaysOnline, &config.api);
//! let uploaded = client.upload_photo(&photo).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod client;
mod connectivity;
mod http;
mod response;
mod service;
mod transport;

pub use client::RemoteClient;
pub use connectivity::{AlwaysOnline, Connectivity, ConnectivityFlag};
pub use http::{HttpSetupError, ReqwestTransport};
pub use response::{parse_generate_response, parse_object, parse_upload_response};
pub use service::AltarService;
pub use transport::{RequestPayload, Transport, TransportResponse};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
