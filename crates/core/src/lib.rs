//! MarketLink Core - Shared types library.
//!
//! This crate provides common types used across all MarketLink components:
//! - `client` - Resilient REST client and per-role session manager
//! - `cli` - Command-line surface over the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Roles, sessions, and response shape extractors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
