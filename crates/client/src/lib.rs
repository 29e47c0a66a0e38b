//! MarketLink client library.
//!
//! Resilient REST client and per-role session manager for the MarketLink
//! backend, whose route names and response envelopes vary between
//! deployments.
//!
//! # Modules
//!
//! - [`config`] - Backend/API root resolution and environment loading
//! - [`store`] - Key-value persistence (in-memory and JSON file)
//! - [`session`] - Per-role sessions on top of a key-value store
//! - [`api`] - Request core, candidate-endpoint resolution, resources
//! - [`media`] - Media URL normalization
//! - [`error`] - Client error type

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod media;
pub mod session;
pub mod store;

pub use api::{ApiClient, CallParams, CandidateEndpointList, RequestDescriptor, ResponseEnvelope};
pub use config::{BaseUrls, ClientConfig, ConfigError};
pub use error::{ApiError, Result};
pub use media::MediaNormalizer;
pub use session::SessionStore;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
