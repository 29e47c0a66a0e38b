//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Backend URL (first non-empty wins)
//! - `MARKETLINK_API_URL`
//! - `API_BASE_URL`
//! - `API_URL`
//! - `BACKEND_URL`
//!
//! ## Optional
//! - `MARKETLINK_HOSTNAME` - Host the client is served from. When it is a known
//!   production domain and no URL variable is set, the production backend is used.
//! - `MARKETLINK_CDN_URL` - Root for CDN media URLs (default: `https://res.cloudinary.com`)
//!
//! When nothing matches, the client falls back to `http://localhost:5000`.

use thiserror::Error;
use url::Url;

/// Environment keys consulted for the backend URL, in priority order.
pub const API_URL_KEYS: &[&str] = &["MARKETLINK_API_URL", "API_BASE_URL", "API_URL", "BACKEND_URL"];

/// Environment key holding the hostname the client runs under.
pub const HOSTNAME_KEY: &str = "MARKETLINK_HOSTNAME";

/// Environment key overriding the CDN root.
pub const CDN_URL_KEY: &str = "MARKETLINK_CDN_URL";

/// Hostnames that are served by the production deployment.
pub const PRODUCTION_DOMAINS: &[&str] = &["marketlink.app", "www.marketlink.app", "shop.marketlink.app"];

/// Backend used when running under a production hostname without explicit configuration.
pub const PRODUCTION_BACKEND_URL: &str = "https://api.marketlink.app";

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default CDN root for `<bucket>/(image|video)/upload/...` media paths.
pub const DEFAULT_CDN_URL: &str = "https://res.cloudinary.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL in {0}: {1}")]
    InvalidUrl(String, String),
}

/// Normalized backend and API roots.
///
/// The API root always ends in exactly one `/api` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    backend_root: String,
    api_root: String,
}

impl BaseUrls {
    /// Derive the roots from a configured base URL.
    ///
    /// Trailing slashes are stripped, and a single trailing `/api` segment is
    /// treated as part of the API root rather than the backend root.
    #[must_use]
    pub fn from_base(base: &str) -> Self {
        let trimmed = base.trim().trim_end_matches('/');
        let backend_root = trimmed
            .strip_suffix("/api")
            .unwrap_or(trimmed)
            .trim_end_matches('/')
            .to_string();
        let api_root = format!("{backend_root}/api");

        Self {
            backend_root,
            api_root,
        }
    }

    /// The backend origin (serves `/uploads/...` and explicit `/api/...` paths).
    #[must_use]
    pub fn backend_root(&self) -> &str {
        &self.backend_root
    }

    /// The backend root plus `/api`.
    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Resolve a request path to the URL it should be sent to.
    ///
    /// Absolute URLs pass through unchanged. `/uploads/...` and `/api/...`
    /// go to the backend root; anything else is prefixed with the API root.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        if is_absolute(path) {
            return path.to_string();
        }

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if path == "/api" || path.starts_with("/api/") || path.starts_with("/uploads/") {
            format!("{}{path}", self.backend_root)
        } else {
            format!("{}{path}", self.api_root)
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend and API roots
    pub urls: BaseUrls,
    /// Root for CDN-hosted media
    pub cdn_url: String,
}

impl ClientConfig {
    /// Build a configuration for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` is not an absolute
    /// `http`/`https` URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        validate_http_url("base_url", base_url)?;

        Ok(Self {
            urls: BaseUrls::from_base(base_url),
            cdn_url: DEFAULT_CDN_URL.to_string(),
        })
    }

    /// Replace the CDN root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `cdn_url` is not an absolute
    /// `http`/`https` URL.
    pub fn with_cdn_url(mut self, cdn_url: &str) -> Result<Self, ConfigError> {
        validate_http_url("cdn_url", cdn_url)?;
        self.cdn_url = cdn_url.trim().trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the resolved backend or CDN URL is not an
    /// absolute `http`/`https` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let hostname = get_optional_env(HOSTNAME_KEY);
        let base_url = resolve_base_url(get_optional_env, hostname.as_deref());
        tracing::debug!(base_url = %base_url, "Resolved backend base URL");

        let config = Self::new(&base_url)?;
        match get_optional_env(CDN_URL_KEY) {
            Some(cdn_url) => config.with_cdn_url(&cdn_url),
            None => Ok(config),
        }
    }
}

/// Pick the backend base URL.
///
/// Order: the first non-empty value among [`API_URL_KEYS`], then
/// [`PRODUCTION_BACKEND_URL`] when `hostname` is a production domain, then
/// [`DEFAULT_BASE_URL`].
pub fn resolve_base_url(lookup: impl Fn(&str) -> Option<String>, hostname: Option<&str>) -> String {
    if let Some(configured) = API_URL_KEYS
        .iter()
        .filter_map(|&key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
    {
        return configured;
    }

    // Deployments that forgot to set an API URL still reach the real backend.
    if hostname.is_some_and(is_production_host) {
        return PRODUCTION_BACKEND_URL.to_string();
    }

    DEFAULT_BASE_URL.to_string()
}

/// Whether `hostname` (optionally with a port) is a production domain.
fn is_production_host(hostname: &str) -> bool {
    let host = hostname.trim().to_ascii_lowercase();
    let host = host.split(':').next().unwrap_or_default();
    PRODUCTION_DOMAINS.contains(&host)
}

/// Whether a string is an absolute `http`/`https` URL.
pub(crate) fn is_absolute(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub(crate) fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(
            name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_first_non_empty_key_wins() {
        let lookup = lookup_from(&[
            ("MARKETLINK_API_URL", "   "),
            ("API_BASE_URL", ""),
            ("API_URL", "https://one.example.com"),
            ("BACKEND_URL", "https://two.example.com"),
        ]);
        assert_eq!(resolve_base_url(lookup, None), "https://one.example.com");
    }

    #[test]
    fn test_configured_value_beats_hostname() {
        let lookup = lookup_from(&[("BACKEND_URL", "https://staging.example.com")]);
        assert_eq!(
            resolve_base_url(lookup, Some("marketlink.app")),
            "https://staging.example.com"
        );
    }

    #[test]
    fn test_production_hostname_heuristic() {
        let lookup = lookup_from(&[]);
        assert_eq!(
            resolve_base_url(&lookup, Some("WWW.MarketLink.app:443")),
            PRODUCTION_BACKEND_URL
        );
        assert_eq!(resolve_base_url(&lookup, Some("preview.vercel.app")), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(&lookup, None), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_api_root_has_exactly_one_api_segment() {
        for base in [
            "https://backend.example.com",
            "https://backend.example.com/",
            "https://backend.example.com/api",
            "https://backend.example.com/api/",
            "https://backend.example.com//",
            "http://localhost:5000",
        ] {
            let urls = BaseUrls::from_base(base);
            assert!(urls.api_root().ends_with("/api"), "{base}");
            assert_eq!(urls.api_root().matches("/api").count(), 1, "{base}");
            assert!(!urls.api_root().contains("/api/api"), "{base}");
        }
    }

    #[test]
    fn test_resolve_api_path_against_trailing_slash_base() {
        let urls = BaseUrls::from_base("https://api.example.com/");
        assert_eq!(
            urls.resolve("/api/users/me"),
            "https://api.example.com/api/users/me"
        );
    }

    #[test]
    fn test_resolve_routes_by_prefix() {
        let urls = BaseUrls::from_base("https://api.example.com/api");
        assert_eq!(urls.resolve("/users/me"), "https://api.example.com/api/users/me");
        assert_eq!(urls.resolve("users/me"), "https://api.example.com/api/users/me");
        assert_eq!(urls.resolve("/api/users/me"), "https://api.example.com/api/users/me");
        assert_eq!(
            urls.resolve("/uploads/a.png"),
            "https://api.example.com/uploads/a.png"
        );
        assert_eq!(
            urls.resolve("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_client_config_rejects_relative_and_non_http() {
        assert!(matches!(
            ClientConfig::new("api.example.com"),
            Err(ConfigError::InvalidUrl(_, _))
        ));
        assert!(matches!(
            ClientConfig::new("ftp://files.example.com"),
            Err(ConfigError::InvalidUrl(_, _))
        ));
    }

    #[test]
    fn test_client_config_cdn_override() {
        let config = ClientConfig::new("https://api.example.com")
            .unwrap()
            .with_cdn_url("https://media.example.com/")
            .unwrap();
        assert_eq!(config.cdn_url, "https://media.example.com");
        assert_eq!(config.urls.backend_root(), "https://api.example.com");
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("https://x"));
        assert!(is_absolute("HTTP://x"));
        assert!(!is_absolute("//x"));
        assert!(!is_absolute("/x"));
        assert!(!is_absolute("ht"));
    }
}
