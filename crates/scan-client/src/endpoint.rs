//! Stream endpoint address resolution and URL normalization.
//!
//! - [`StreamAddress`]: validated WebSocket URL with source tracking
//! - [`AddressSource`]: where the address came from
//! - [`AddressError`]: user-facing validation errors
//!
//! # Address Resolution Precedence
//!
//! Addresses are resolved in this order (highest priority first):
//! 1. User input (typed in the UI or passed with `--url`)
//! 2. Persisted from a previous session
//! 3. `LINE_SCAN_STREAM_URL` environment variable
//! 4. Default: `ws://127.0.0.1:8000/ws/stream`
//!
//! # URL Normalization
//!
//! [`normalize_url`] accepts the forms people actually type:
//! - Bare host:port (`10.0.0.5:8000` → `ws://10.0.0.5:8000/ws/stream`)
//! - HTTP schemes (`https://scanner.local` → `wss://scanner.local:8000/ws/stream`)
//! - Missing path (the stream path is appended)
//!
//! ```
//! use scan_client::endpoint::{AddressSource, StreamAddress};
//!
//! let addr = StreamAddress::parse("10.0.0.5:8000", AddressSource::UserInput)?;
//! assert_eq!(addr.as_str(), "ws://10.0.0.5:8000/ws/stream");
//! # Ok::<(), scan_client::endpoint::AddressError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Storage key for the persisted stream address.
pub const STORAGE_KEY_STREAM_ADDR: &str = "stream_address";

/// Environment variable consulted when nothing else is configured.
pub const STREAM_URL_ENV: &str = "LINE_SCAN_STREAM_URL";

/// Default port of the stream endpoint.
pub const DEFAULT_STREAM_PORT: u16 = 8000;

/// Path appended when the input has none.
pub const DEFAULT_STREAM_PATH: &str = "/ws/stream";

/// Address used when no configuration is provided.
pub const DEFAULT_STREAM_URL: &str = "ws://127.0.0.1:8000/ws/stream";

/// Source of the stream address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressSource {
    /// Built-in default
    Default,
    /// `LINE_SCAN_STREAM_URL`
    Environment,
    /// Restored from a previous session
    Persisted,
    /// Typed by the user
    UserInput,
}

impl AddressSource {
    /// Short label for the UI.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Environment => "env",
            Self::Persisted => "saved",
            Self::UserInput => "user",
        }
    }
}

impl fmt::Display for AddressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Environment => write!(f, "Environment ({STREAM_URL_ENV})"),
            Self::Persisted => write!(f, "Saved from previous session"),
            Self::UserInput => write!(f, "User input"),
        }
    }
}

/// Validated stream address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAddress {
    url: String,
    source: AddressSource,
    original: String,
}

impl StreamAddress {
    /// Parse and normalize a stream URL.
    pub fn parse(input: &str, source: AddressSource) -> Result<Self, AddressError> {
        let normalized = normalize_url(input)?;
        Ok(Self {
            url: normalized.to_string(),
            source,
            original: input.trim().to_string(),
        })
    }

    /// The built-in default address.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            source: AddressSource::Default,
            original: DEFAULT_STREAM_URL.to_string(),
        }
    }

    /// Normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Where this address came from.
    #[must_use]
    pub fn source(&self) -> AddressSource {
        self.source
    }

    /// Input as typed, before normalization.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for StreamAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl Default for StreamAddress {
    fn default() -> Self {
        Self::fallback()
    }
}

/// URL validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Input was empty or whitespace-only
    #[error("Address cannot be empty")]
    EmptyInput,
    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// No host in the URL
    #[error("URL must include a host")]
    MissingHost,
    /// Port or scheme could not be applied
    #[error("Invalid port: {0}")]
    InvalidPort(String),
    /// Scheme other than ws/wss/http/https
    #[error("Unsupported scheme '{0}' (use ws or wss)")]
    UnsupportedScheme(String),
}

/// Normalize a stream URL string.
///
/// - Trims whitespace
/// - Adds `ws://` if no scheme is present
/// - Maps `http` to `ws` and `https` to `wss`
/// - Adds port 8000 if none is given
/// - Adds `/ws/stream` if the path is empty
pub fn normalize_url(input: &str) -> Result<Url, AddressError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AddressError::EmptyInput);
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("ws://{input}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| AddressError::InvalidUrl(e.to_string()))?;

    let scheme = match url.scheme().to_lowercase().as_str() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(AddressError::UnsupportedScheme(other.to_string())),
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|()| AddressError::InvalidUrl(format!("cannot use scheme {scheme}")))?;
    }

    if url.host().is_none() {
        return Err(AddressError::MissingHost);
    }

    if url.port().is_none() {
        url.set_port(Some(DEFAULT_STREAM_PORT))
            .map_err(|()| AddressError::InvalidPort("Cannot set port on this URL".to_string()))?;
    }

    if url.path().is_empty() || url.path() == "/" {
        url.set_path(DEFAULT_STREAM_PATH);
    }

    Ok(url)
}

/// Resolve the stream address from multiple sources with precedence.
///
/// Invalid candidates are skipped. Never fails: falls back to the default.
pub fn resolve_address(user_input: Option<&str>, persisted_addr: Option<&str>) -> StreamAddress {
    if let Some(input) = user_input.filter(|s| !s.trim().is_empty()) {
        match StreamAddress::parse(input, AddressSource::UserInput) {
            Ok(addr) => return addr,
            Err(e) => tracing::warn!(input, error = %e, "Ignoring invalid stream address"),
        }
    }

    if let Some(persisted) = persisted_addr {
        if let Ok(addr) = StreamAddress::parse(persisted, AddressSource::Persisted) {
            return addr;
        }
    }

    if let Ok(env_url) = std::env::var(STREAM_URL_ENV) {
        if let Ok(addr) = StreamAddress::parse(&env_url, AddressSource::Environment) {
            return addr;
        }
    }

    StreamAddress::fallback()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_normalize_bare_host_port() {
        let url = normalize_url("127.0.0.1:8000").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws/stream");
    }

    #[test]
    fn test_normalize_keeps_explicit_path() {
        let url = normalize_url("ws://scanner.local:9001/line").unwrap();
        assert_eq!(url.as_str(), "ws://scanner.local:9001/line");
    }

    #[test]
    fn test_normalize_maps_http_schemes() {
        let url = normalize_url("http://localhost:8000").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/stream");

        let url = normalize_url("https://secure.example.com:8443").unwrap();
        assert_eq!(url.as_str(), "wss://secure.example.com:8443/ws/stream");
    }

    #[test]
    fn test_normalize_adds_default_port() {
        let url = normalize_url("ws://localhost").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/stream");
    }

    #[test]
    fn test_normalize_ipv6() {
        let url = normalize_url("[::1]:8080").unwrap();
        assert_eq!(url.as_str(), "ws://[::1]:8080/ws/stream");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        let url = normalize_url("  localhost:5000  ").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:5000/ws/stream");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_url("").unwrap_err(), AddressError::EmptyInput);
        assert_eq!(normalize_url("   ").unwrap_err(), AddressError::EmptyInput);
    }

    #[test]
    fn test_normalize_unsupported_scheme() {
        let err = normalize_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, AddressError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_stream_address_parse() {
        let addr = StreamAddress::parse(" 10.0.0.5:8000 ", AddressSource::UserInput).unwrap();
        assert_eq!(addr.as_str(), "ws://10.0.0.5:8000/ws/stream");
        assert_eq!(addr.source(), AddressSource::UserInput);
        assert_eq!(addr.original(), "10.0.0.5:8000");
    }

    #[test]
    fn test_stream_address_default_matches_normalized_form() {
        let addr = StreamAddress::default();
        let parsed = StreamAddress::parse(DEFAULT_STREAM_URL, AddressSource::Default).unwrap();
        assert_eq!(addr.as_str(), parsed.as_str());
        assert_eq!(addr.source(), AddressSource::Default);
    }

    #[test]
    fn test_address_source_labels() {
        assert_eq!(AddressSource::Default.label(), "default");
        assert_eq!(AddressSource::Environment.label(), "env");
        assert_eq!(AddressSource::Persisted.label(), "saved");
        assert_eq!(AddressSource::UserInput.label(), "user");
    }

    #[test]
    #[serial]
    fn test_resolve_address_default() {
        std::env::remove_var(STREAM_URL_ENV);
        let addr = resolve_address(None, None);
        assert_eq!(addr.source(), AddressSource::Default);
        assert_eq!(addr.as_str(), DEFAULT_STREAM_URL);
    }

    #[test]
    #[serial]
    fn test_resolve_address_env() {
        std::env::set_var(STREAM_URL_ENV, "ws://test.local:9999");
        let addr = resolve_address(None, None);
        std::env::remove_var(STREAM_URL_ENV);
        assert_eq!(addr.as_str(), "ws://test.local:9999/ws/stream");
        assert_eq!(addr.source(), AddressSource::Environment);
    }

    #[test]
    #[serial]
    fn test_resolve_address_user_input_priority() {
        std::env::set_var(STREAM_URL_ENV, "ws://env.local:8888");
        let addr = resolve_address(Some("user.local:7777"), Some("saved.local:6666"));
        std::env::remove_var(STREAM_URL_ENV);
        assert_eq!(addr.as_str(), "ws://user.local:7777/ws/stream");
        assert_eq!(addr.source(), AddressSource::UserInput);
    }

    #[test]
    #[serial]
    fn test_resolve_address_persisted_priority() {
        std::env::set_var(STREAM_URL_ENV, "ws://env.local:8888");
        let addr = resolve_address(Some("  "), Some("ws://persisted.local:6666/ws/stream"));
        std::env::remove_var(STREAM_URL_ENV);
        assert_eq!(addr.as_str(), "ws://persisted.local:6666/ws/stream");
        assert_eq!(addr.source(), AddressSource::Persisted);
    }

    #[test]
    #[serial]
    fn test_resolve_address_skips_invalid_user_input() {
        std::env::remove_var(STREAM_URL_ENV);
        let addr = resolve_address(Some("ftp://nope"), None);
        assert_eq!(addr.source(), AddressSource::Default);
    }

    #[test]
    fn test_address_error_display() {
        assert_eq!(AddressError::EmptyInput.to_string(), "Address cannot be empty");
        assert!(AddressError::UnsupportedScheme("ftp".to_string())
            .to_string()
            .contains("ftp"));
    }
}
