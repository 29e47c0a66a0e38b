//! Media URL normalization.
//!
//! Media references reach the UI as absolute URLs, server-relative paths,
//! bare CDN paths (`<bucket>/image/upload/...`) or URLs baked against a
//! developer's `localhost:5000`. [`MediaNormalizer::normalize`] turns every
//! one of them into an absolute URL and leaves absolute URLs alone, so it can
//! be applied any number of times.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ClientConfig, ConfigError, is_absolute, validate_http_url};

/// Hosts that older uploads were stored against.
pub const LEGACY_HOSTS: &[&str] = &["localhost:5000", "127.0.0.1:5000"];

/// `<name>/(image|video)/upload/<rest>`, optionally with a leading slash.
static CDN_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/?([^/]+)/(image|video)/upload/(.+)$").expect("Invalid regex")
});

/// Rewrites media references into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaNormalizer {
    base: String,
    cdn_root: String,
}

impl MediaNormalizer {
    /// Create a normalizer for a backend root and CDN root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if either root is not an absolute
    /// `http`/`https` URL. A relative root would make normalized output
    /// relative again.
    pub fn new(base: &str, cdn_root: &str) -> Result<Self, ConfigError> {
        validate_http_url("base_url", base)?;
        validate_http_url("cdn_url", cdn_root)?;
        Ok(Self::from_roots(base, cdn_root))
    }

    /// Normalizer for the configured backend and CDN.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        // Both roots were validated when the config was built.
        Self::from_roots(config.urls.backend_root(), &config.cdn_url)
    }

    fn from_roots(base: &str, cdn_root: &str) -> Self {
        Self {
            base: base.trim().trim_end_matches('/').to_string(),
            cdn_root: cdn_root.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Backend root relative paths are resolved against.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Normalize a media reference.
    ///
    /// Empty input stays empty.
    #[must_use]
    pub fn normalize(&self, url_or_path: &str) -> String {
        let input = url_or_path.trim();
        if input.is_empty() {
            return String::new();
        }

        if is_absolute(input) {
            return input.to_string();
        }

        if let Some(rest) = strip_legacy_host(input) {
            return self.join(rest);
        }

        if let Some(caps) = CDN_PATH_RE.captures(input)
            && let (Some(name), Some(kind), Some(rest)) = (caps.get(1), caps.get(2), caps.get(3))
            && name.as_str() != "uploads"
        {
            return format!(
                "{}/{}/{}/upload/{}",
                self.cdn_root,
                name.as_str(),
                kind.as_str(),
                rest.as_str()
            );
        }

        self.join(input)
    }

    fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }
}

/// Everything after an embedded legacy host, if one is present.
fn strip_legacy_host(input: &str) -> Option<&str> {
    LEGACY_HOSTS.iter().find_map(|host| {
        input
            .find(host)
            .and_then(|start| input.get(start + host.len()..))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn normalizer() -> MediaNormalizer {
        MediaNormalizer::new("https://cdn.example.com/", "https://res.cloudinary.com").unwrap()
    }

    #[test]
    fn test_relative_roots_are_rejected() {
        for (base, cdn) in [
            ("cdn.example.com", "https://res.cloudinary.com"),
            ("/uploads", "https://res.cloudinary.com"),
            ("https://cdn.example.com", "res.cloudinary.com"),
            ("ftp://cdn.example.com", "https://res.cloudinary.com"),
        ] {
            let err = MediaNormalizer::new(base, cdn).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidUrl(..)), "{base} {cdn}");
        }
    }

    #[test]
    fn test_from_config_output_is_absolute() {
        let config = ClientConfig::new("http://localhost:5000/api").unwrap();
        let n = MediaNormalizer::from_config(&config);
        assert_eq!(n.base(), "http://localhost:5000");
        let once = n.normalize("uploads/a.png");
        assert!(is_absolute(&once));
        assert_eq!(n.normalize(&once), once);
    }

    #[test]
    fn test_absolute_urls_unchanged() {
        let n = normalizer();
        for url in [
            "https://images.example.org/a.png",
            "http://localhost:5000/uploads/a.png",
            "HTTPS://EXAMPLE.COM/A.PNG",
        ] {
            assert_eq!(n.normalize(url), url);
        }
    }

    #[test]
    fn test_legacy_host_is_replaced() {
        let n = normalizer();
        assert_eq!(
            n.normalize("localhost:5000/uploads/x.png"),
            "https://cdn.example.com/uploads/x.png"
        );
        assert_eq!(
            n.normalize("//127.0.0.1:5000/uploads/y.jpg"),
            "https://cdn.example.com/uploads/y.jpg"
        );
    }

    #[test]
    fn test_cdn_paths_are_rebuilt() {
        let n = normalizer();
        assert_eq!(
            n.normalize("demo/image/upload/v1/shoe.jpg"),
            "https://res.cloudinary.com/demo/image/upload/v1/shoe.jpg"
        );
        assert_eq!(
            n.normalize("/demo/video/upload/clip.mp4"),
            "https://res.cloudinary.com/demo/video/upload/clip.mp4"
        );
    }

    #[test]
    fn test_uploads_segment_is_not_a_cdn_bucket() {
        let n = normalizer();
        assert_eq!(
            n.normalize("uploads/image/upload/x.png"),
            "https://cdn.example.com/uploads/image/upload/x.png"
        );
    }

    #[test]
    fn test_relative_paths_get_base() {
        let n = normalizer();
        assert_eq!(n.normalize("/uploads/a.png"), "https://cdn.example.com/uploads/a.png");
        assert_eq!(n.normalize("uploads/a.png"), "https://cdn.example.com/uploads/a.png");
        assert_eq!(n.normalize("  a.png "), "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalizer().normalize(""), "");
        assert_eq!(normalizer().normalize("   "), "");
    }

    #[test]
    fn test_idempotent() {
        let n = normalizer();
        for input in [
            "localhost:5000/uploads/x.png",
            "demo/image/upload/a.jpg",
            "uploads/image/upload/x.png",
            "/uploads/a.png",
            "a.png",
            "https://x.io/a.png",
        ] {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once, "{input}");
        }
    }
}
