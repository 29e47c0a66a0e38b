//! CLI command implementations.

pub mod api;
pub mod media;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use marketlink_client::{
    ApiClient, ApiError, ClientConfig, ConfigError, FileStore, SessionStore, StoreError,
};
use serde_json::Value;
use thiserror::Error;

/// Environment key for the session file location.
pub const SESSION_FILE_KEY: &str = "MARKETLINK_SESSION_FILE";

/// Session file used when `MARKETLINK_SESSION_FILE` is unset.
pub const DEFAULT_SESSION_FILE: &str = ".marketlink/session.json";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid header '{0}' (expected 'Name: value')")]
    InvalidHeader(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Nothing to log out of (pass --role or --all)")]
    NoLogoutTarget,
}

/// Shared state for a command run.
pub struct Context {
    pub config: ClientConfig,
    pub client: ApiClient,
    pub session_file: PathBuf,
}

impl Context {
    /// Load configuration and open the session file.
    pub fn load() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;

        let session_file = std::env::var(SESSION_FILE_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        let store = FileStore::open(&session_file)?;
        let sessions = SessionStore::new(Arc::new(store));
        let client = ApiClient::new(&config, sessions)?;

        tracing::debug!(
            api_root = config.urls.api_root(),
            session_file = %session_file.display(),
            "CLI context ready"
        );

        Ok(Self {
            config,
            client,
            session_file,
        })
    }
}

/// Print a JSON value to stdout.
#[allow(clippy::print_stdout)]
pub fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print one line to stdout.
#[allow(clippy::print_stdout)]
pub fn print_line(line: &str) {
    println!("{line}");
}
