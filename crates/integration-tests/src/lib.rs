//! Integration tests for the MarketLink client.
//!
//! Every test runs the real client against a `wiremock` server, so no
//! backend needs to be running.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketlink-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `request_core` - URL resolution, header assembly, response parsing
//! - `auth_failure` - 401 classification and session clearing
//! - `fallback` - Candidate-endpoint resolution through the resource catalogue
//! - `sessions` - Per-role isolation and persistence across restarts

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use marketlink_client::{ApiClient, ClientConfig, KeyValueStore, MemoryStore, SessionStore};
use wiremock::MockServer;

/// A mock backend plus a client pointed at it.
pub struct TestBackend {
    pub server: MockServer,
    pub client: ApiClient,
    pub store: Arc<MemoryStore>,
}

impl TestBackend {
    /// Start a mock server and a client whose base URL is its root.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let client = client_with_store(&server.uri(), store.clone());

        Self {
            server,
            client,
            store,
        }
    }

    /// Session store the client authenticates from.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        self.client.sessions()
    }
}

/// Build a client for `base_url` backed by `store`.
///
/// # Panics
///
/// Panics if `base_url` is not a valid http(s) URL.
#[allow(clippy::expect_used)]
pub fn client_with_store(base_url: &str, store: Arc<dyn KeyValueStore>) -> ApiClient {
    let config = ClientConfig::new(base_url).expect("valid base URL");
    ApiClient::new(&config, SessionStore::new(store)).expect("Failed to create HTTP client")
}
