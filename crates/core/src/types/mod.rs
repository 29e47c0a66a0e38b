//! Core types for the MarketLink client.
//!
//! This module provides type-safe wrappers for roles, sessions and the
//! response shapes the backend is known to return.

pub mod role;
pub mod session;
pub mod shape;

pub use role::{ClearScope, Role, RoleParseError};
pub use session::Session;
pub use shape::{Shape, extract, extract_list, extract_string, is_present};
